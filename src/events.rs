//! Cross-thread command hand-off.
//!
//! Commands are produced by input tasks (the cycle-button poller on the
//! device, test threads on the host) and consumed by the main control loop,
//! which is the only writer of mode and temperature state. Producers never
//! touch that state; they push an [`AppCommand`] and the loop drains the
//! queue once per tick.
//!
//! ```text
//! ┌─────────────┐     ┌──────────────┐     ┌──────────────┐
//! │ Button task │────▶│ CommandQueue │────▶│  Main Loop   │
//! │ ...         │────▶│ (bounded)    │     │  (consumer)  │
//! └─────────────┘     └──────────────┘     └──────────────┘
//! ```

use std::sync::Arc;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use log::warn;

use crate::app::commands::AppCommand;

/// Maximum number of pending commands.
pub const COMMAND_QUEUE_DEPTH: usize = 8;

type CommandChannel = Channel<CriticalSectionRawMutex, AppCommand, COMMAND_QUEUE_DEPTH>;

/// Consumer end, owned by the control loop.
pub struct CommandQueue {
    channel: Arc<CommandChannel>,
}

/// Producer end. Cheap to clone, `Send`, usable from any thread.
#[derive(Clone)]
pub struct CommandSender {
    channel: Arc<CommandChannel>,
}

impl CommandQueue {
    pub fn new() -> Self {
        Self {
            channel: Arc::new(CommandChannel::new()),
        }
    }

    pub fn sender(&self) -> CommandSender {
        CommandSender {
            channel: self.channel.clone(),
        }
    }

    /// Next pending command, if any.
    pub fn try_recv(&self) -> Option<AppCommand> {
        self.channel.try_receive().ok()
    }

    /// Hand every pending command to `handler` in FIFO order.
    pub fn drain(&self, mut handler: impl FnMut(AppCommand)) {
        while let Some(cmd) = self.try_recv() {
            handler(cmd);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.channel.is_empty()
    }

    pub fn len(&self) -> usize {
        self.channel.len()
    }
}

impl Default for CommandQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandSender {
    /// Queue a command. Returns `false` if the queue is full (command dropped).
    pub fn send(&self, cmd: AppCommand) -> bool {
        if self.channel.try_send(cmd).is_err() {
            warn!("CommandQueue: full, dropping {:?}", cmd);
            return false;
        }
        true
    }
}
