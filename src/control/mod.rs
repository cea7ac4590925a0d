//! Control algorithms.
//!
//! - **decision**: combines mode, daylight and temperature into relay states.

pub mod decision;
