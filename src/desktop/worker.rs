//! Background worker that runs generation flows
//!
//! The worker runs in a separate thread with its own tokio runtime.
//! It receives commands from the UI and sends back generation events.

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use anyhow::Result;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};
use tracing::{debug, error};

use crate::generator::{GenerationEvent, RecipeGenerator};
use crate::studio::StudioCommand;

/// Handle to the background worker
pub struct WorkerHandle {
    /// Send commands to the worker
    tx: UnboundedSender<StudioCommand>,
    /// Receive events from the worker
    rx: UnboundedReceiver<GenerationEvent>,
    /// Thread handle
    _thread: JoinHandle<()>,
}

impl WorkerHandle {
    /// Start the background worker
    pub fn start(generator: RecipeGenerator) -> Result<Self> {
        let (ui_tx, ui_rx) = unbounded_channel::<StudioCommand>();
        let (worker_tx, worker_rx) = unbounded_channel::<GenerationEvent>();

        let thread = thread::Builder::new()
            .name("atelier-worker".to_string())
            .spawn(move || {
                let rt = match tokio::runtime::Builder::new_current_thread()
                    .enable_all()
                    .build()
                {
                    Ok(rt) => rt,
                    Err(e) => {
                        error!("Failed to create worker runtime: {}", e);
                        return;
                    }
                };

                rt.block_on(worker_loop(Arc::new(generator), ui_rx, worker_tx));
            })?;

        Ok(Self {
            tx: ui_tx,
            rx: worker_rx,
            _thread: thread,
        })
    }

    /// Send a command to the worker
    pub fn send(&self, command: StudioCommand) -> Result<()> {
        self.tx
            .send(command)
            .map_err(|_| anyhow::anyhow!("Worker has stopped"))
    }

    /// Try to receive an event from the worker (non-blocking)
    pub fn try_recv(&mut self) -> Option<GenerationEvent> {
        self.rx.try_recv().ok()
    }
}

/// One flow at a time: a new command aborts the flow in progress, and with
/// it any step sketches still running.
async fn worker_loop(
    generator: Arc<RecipeGenerator>,
    mut rx: UnboundedReceiver<StudioCommand>,
    tx: UnboundedSender<GenerationEvent>,
) {
    let mut in_flight: Option<tokio::task::JoinHandle<()>> = None;

    while let Some(command) = rx.recv().await {
        if let Some(task) = in_flight.take() {
            task.abort();
        }

        match command {
            StudioCommand::Generate { ticket, request } => {
                let generator = Arc::clone(&generator);
                let tx = tx.clone();
                in_flight = Some(tokio::spawn(async move {
                    if let Err(e) = generator.run(ticket, request, &tx).await {
                        debug!("Flow {} ended with error: {}", ticket, e);
                    }
                }));
            }
            StudioCommand::Cancel => debug!("Generation cancelled"),
        }
    }
}
