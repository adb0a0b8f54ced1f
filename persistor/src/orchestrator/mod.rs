//! Orchestrator module for the persistor.
//!
//! Runs the serve loop: ensures startup indices, then receives messages from
//! the bus and hands each one to the dispatcher on its own task.

use std::sync::Arc;
use std::time::Instant;

use persistor_shared::CreateIndexRequest;
use tokio::sync::broadcast;
use tokio::task::JoinSet;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{debug, error, info, instrument};

use crate::bus::MessageSource;
use crate::dispatcher::Dispatcher;
use crate::PersistorError;

/// Configuration for the orchestrator.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// How often progress is logged.
    pub progress_interval: Duration,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            progress_interval: Duration::from_secs(10),
        }
    }
}

/// Stops a running orchestrator from another task.
#[derive(Debug, Clone)]
pub struct ShutdownHandle {
    sender: broadcast::Sender<()>,
}

impl ShutdownHandle {
    /// Stop receiving messages. In-flight messages still get their replies.
    pub fn shutdown(&self) {
        let _ = self.sender.send(());
    }
}

/// Orchestrator that serves one bus address.
///
/// The orchestrator:
/// - Ensures startup indices before serving
/// - Spawns one task per inbound message
/// - Handles shutdown signals, answering queued and in-flight messages
/// - Logs progress periodically
pub struct Orchestrator {
    source: Box<dyn MessageSource>,
    dispatcher: Arc<Dispatcher>,
    indices: Vec<CreateIndexRequest>,
    config: OrchestratorConfig,
    shutdown_tx: broadcast::Sender<()>,
    shutdown_rx: broadcast::Receiver<()>,
}

impl Orchestrator {
    /// Create a new orchestrator reading from `source`.
    pub fn new(source: impl MessageSource + 'static, dispatcher: Arc<Dispatcher>) -> Self {
        Self::with_config(source, dispatcher, OrchestratorConfig::default())
    }

    /// Create a new orchestrator with custom configuration.
    pub fn with_config(
        source: impl MessageSource + 'static,
        dispatcher: Arc<Dispatcher>,
        config: OrchestratorConfig,
    ) -> Self {
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);

        Self {
            source: Box::new(source),
            dispatcher,
            indices: Vec::new(),
            config,
            shutdown_tx,
            shutdown_rx,
        }
    }

    /// Set the indices ensured before serving starts.
    pub fn with_indices(mut self, indices: Vec<CreateIndexRequest>) -> Self {
        self.indices = indices;
        self
    }

    /// A handle that can stop this orchestrator while `run` is in progress.
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            sender: self.shutdown_tx.clone(),
        }
    }

    /// Trigger a graceful shutdown.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());
    }

    /// Run the orchestrator.
    ///
    /// Returns once the bus closes, ctrl-c is received or a shutdown is
    /// requested, after every accepted message has been answered.
    #[instrument(skip(self))]
    pub async fn run(&mut self) -> Result<(), PersistorError> {
        info!(indices = self.indices.len(), "Starting persistor orchestrator");

        // Failures are logged by the dispatcher and do not stop startup.
        self.dispatcher.create_indices(&self.indices).await;

        let dispatcher = Arc::clone(&self.dispatcher);
        let mut tasks: JoinSet<()> = JoinSet::new();

        let mut progress_timer = interval(self.config.progress_interval);
        progress_timer.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // Skip the first tick immediately
        progress_timer.tick().await;

        let mut prev_received: u64 = 0;
        let mut prev_time = Instant::now();

        info!("Ready to serve messages");

        loop {
            tokio::select! {
                message = self.source.next() => {
                    match message {
                        Some(message) => {
                            let dispatcher = Arc::clone(&dispatcher);
                            tasks.spawn(async move { dispatcher.handle(message).await });
                        }
                        None => {
                            info!("Message source closed");
                            break;
                        }
                    }
                }
                Some(result) = tasks.join_next(), if !tasks.is_empty() => {
                    if let Err(e) = result {
                        error!(error = %e, "Message task failed");
                    }
                }
                _ = self.shutdown_rx.recv() => {
                    info!("Received shutdown request");
                    break;
                }
                _ = tokio::signal::ctrl_c() => {
                    info!("Received shutdown signal");
                    break;
                }
                _ = progress_timer.tick() => {
                    let stats = dispatcher.stats();
                    let received = stats.received();

                    let now = Instant::now();
                    let elapsed_secs = now.duration_since(prev_time).as_secs_f64();
                    let messages_per_sec = if elapsed_secs > 0.0 {
                        (received.saturating_sub(prev_received) as f64) / elapsed_secs
                    } else {
                        0.0
                    };

                    info!(
                        messages_received = received,
                        messages_succeeded = stats.succeeded(),
                        messages_failed = stats.failed(),
                        in_flight = tasks.len(),
                        messages_per_sec = format!("{:.2}", messages_per_sec),
                        "Processing progress"
                    );

                    prev_received = received;
                    prev_time = now;
                }
            }
        }

        // Accepted messages still queued on the bus are owed a reply.
        let pending = self.source.close().await;
        if !pending.is_empty() {
            info!(pending = pending.len(), "Dispatching messages queued before shutdown");
        }
        for message in pending {
            let dispatcher = Arc::clone(&dispatcher);
            tasks.spawn(async move { dispatcher.handle(message).await });
        }

        debug!(in_flight = tasks.len(), "Draining in-flight messages");
        while let Some(result) = tasks.join_next().await {
            if let Err(e) = result {
                error!(error = %e, "Message task failed");
            }
        }

        let stats = dispatcher.stats();
        info!(
            total_received = stats.received(),
            total_succeeded = stats.succeeded(),
            total_failed = stats.failed(),
            "Orchestrator shutdown complete"
        );
        Ok(())
    }
}
