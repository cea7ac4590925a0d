//! Temperature fetch worker.
//!
//! The control loop must never block on the network. Fetches run on a
//! dedicated thread under an `edge-executor` with an `async-io-mini` reactor
//! timer racing each request; requests and results cross threads through
//! two bounded `embassy-sync` channels.
//!
//! ```text
//!  ┌──────────────┐  seq   ┌──────────────────────────────┐
//!  │ Control Loop │──────▶│  temp-fetch thread            │
//!  │   (sync)     │◀──────│  source.fetch() ⟷ Timer(t/o) │
//!  └──────────────┘outcome└──────────────────────────────┘
//! ```
//!
//! A fetch that blocks inside the transport (not yielding to the executor)
//! cannot be cut short by the timer. The control side therefore keeps its
//! own deadline (see [`crate::safety::TemperatureGate::collect`]) and drops
//! late outcomes by sequence number.

use core::time::Duration;
use std::sync::Arc;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use log::{info, warn};

use crate::app::ports::{FetchOutcome, TemperatureFeed, TemperatureSource};
use crate::error::FetchError;

/// Requests and results queued in each direction.
const QUEUE_DEPTH: usize = 2;
/// Worker thread stack. The ESP-IDF HTTP client needs headroom.
const WORKER_STACK_SIZE: usize = 32 * 1024;

type RequestChannel = Channel<CriticalSectionRawMutex, u32, QUEUE_DEPTH>;
type OutcomeChannel = Channel<CriticalSectionRawMutex, FetchOutcome, QUEUE_DEPTH>;

/// Handle to the fetch thread. Implements [`TemperatureFeed`].
pub struct FetchWorker {
    requests: Arc<RequestChannel>,
    outcomes: Arc<OutcomeChannel>,
    handle: std::thread::JoinHandle<()>,
}

impl FetchWorker {
    /// Start the worker. `make_source` runs on the worker thread, so the
    /// source itself does not need to be `Send`.
    pub fn spawn<S, F>(make_source: F, timeout: Duration) -> std::io::Result<Self>
    where
        S: TemperatureSource + 'static,
        F: FnOnce() -> S + Send + 'static,
    {
        let requests = Arc::new(RequestChannel::new());
        let outcomes = Arc::new(OutcomeChannel::new());

        let rx = requests.clone();
        let tx = outcomes.clone();
        let handle = std::thread::Builder::new()
            .name("temp-fetch".into())
            .stack_size(WORKER_STACK_SIZE)
            .spawn(move || run_worker(make_source(), rx, tx, timeout))?;

        info!("FetchWorker: started (timeout {} ms)", timeout.as_millis());
        Ok(Self {
            requests,
            outcomes,
            handle,
        })
    }
}

impl TemperatureFeed for FetchWorker {
    fn request(&mut self, seq: u32) -> Result<(), FetchError> {
        if self.handle.is_finished() {
            return Err(FetchError::WorkerUnavailable);
        }
        self.requests
            .try_send(seq)
            .map_err(|_| FetchError::WorkerUnavailable)
    }

    fn poll_outcome(&mut self) -> Option<FetchOutcome> {
        self.outcomes.try_receive().ok()
    }
}

fn run_worker<S: TemperatureSource>(
    source: S,
    requests: Arc<RequestChannel>,
    outcomes: Arc<OutcomeChannel>,
    timeout: Duration,
) {
    let executor: edge_executor::LocalExecutor<'_, 4> = edge_executor::LocalExecutor::new();
    executor
        .spawn(serve(source, requests, outcomes, timeout))
        .detach();
    futures_lite::future::block_on(executor.run(core::future::pending::<()>()));
}

async fn serve<S: TemperatureSource>(
    mut source: S,
    requests: Arc<RequestChannel>,
    outcomes: Arc<OutcomeChannel>,
    timeout: Duration,
) {
    loop {
        let seq = requests.receive().await;
        let result = futures_lite::future::or(source.fetch_celsius(), async {
            async_io_mini::Timer::after(timeout).await;
            Err(FetchError::Timeout)
        })
        .await;

        if outcomes.try_send(FetchOutcome { seq, result }).is_err() {
            warn!("FetchWorker: outcome channel full, dropping #{}", seq);
        }
    }
}

/// Synchronous feed: runs the fetch to completion inside `request`.
///
/// For hosts and bring-up where a blocking fetch is acceptable.
pub struct InlineFeed<S> {
    source: S,
    pending: Option<FetchOutcome>,
}

impl<S: TemperatureSource> InlineFeed<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            pending: None,
        }
    }
}

impl<S: TemperatureSource> TemperatureFeed for InlineFeed<S> {
    fn request(&mut self, seq: u32) -> Result<(), FetchError> {
        let result = futures_lite::future::block_on(self.source.fetch_celsius());
        self.pending = Some(FetchOutcome { seq, result });
        Ok(())
    }

    fn poll_outcome(&mut self) -> Option<FetchOutcome> {
        self.pending.take()
    }
}
