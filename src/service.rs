//! Async classification service.
//!
//! One worker task owns the [`PostureMonitor`]. Frames arrive through a
//! `watch` channel so a slow classifier only ever sees the newest frame and
//! the producer never blocks. Control commands travel through a bounded
//! `mpsc` channel and are always drained before the next frame, so calibration
//! and threshold updates land between frames. Results are fanned out to any
//! number of subscribers through a `broadcast` channel.

use crate::{
    landmarks::FrameInput,
    monitor::{CalibrationResult, ClassificationResult, PostureMonitor},
    session::SessionStatistics,
    thresholds::{RawThresholdUpdate, SensitivityUpdate},
    Error, Result,
};
use tokio::{
    sync::{broadcast, mpsc, oneshot, watch},
    task::JoinHandle,
};

const COMMAND_CAPACITY: usize = 16;
const RESULT_CAPACITY: usize = 64;

enum Command {
    Calibrate {
        frame: Box<FrameInput>,
        reply: oneshot::Sender<Result<CalibrationResult>>,
    },
    UpdateSensitivity {
        update: SensitivityUpdate,
        reply: oneshot::Sender<Result<()>>,
    },
    UpdateRawThresholds {
        update: RawThresholdUpdate,
        reply: oneshot::Sender<Result<()>>,
    },
    Statistics {
        reply: oneshot::Sender<SessionStatistics>,
    },
    ResetStatistics {
        reply: oneshot::Sender<()>,
    },
    Shutdown {
        reply: oneshot::Sender<SessionStatistics>,
    },
}

pub struct PostureService;

impl PostureService {
    /// Spawn the worker on the current tokio runtime
    #[must_use]
    pub fn spawn(monitor: PostureMonitor) -> PostureHandle {
        let (frame_tx, frame_rx) = watch::channel(None);
        let (command_tx, command_rx) = mpsc::channel(COMMAND_CAPACITY);
        let (result_tx, _) = broadcast::channel(RESULT_CAPACITY);

        log::info!("Posture service started (solver: {})", monitor.solver_name());
        let worker = tokio::spawn(run(monitor, frame_rx, command_rx, result_tx.clone()));

        PostureHandle {
            frames: frame_tx,
            commands: command_tx,
            results: result_tx,
            worker,
        }
    }
}

async fn run(
    mut monitor: PostureMonitor,
    mut frames: watch::Receiver<Option<FrameInput>>,
    mut commands: mpsc::Receiver<Command>,
    results: broadcast::Sender<ClassificationResult>,
) {
    loop {
        tokio::select! {
            biased;

            command = commands.recv() => {
                let Some(command) = command else { break };
                if !handle_command(&mut monitor, command) {
                    break;
                }
            }

            changed = frames.changed() => {
                if changed.is_err() {
                    break;
                }
                let frame = frames.borrow_and_update().clone();
                let Some(frame) = frame else { continue };
                match monitor.classify(&frame) {
                    // No subscribers is fine
                    Ok(result) => {
                        let _ = results.send(result);
                    }
                    Err(e) => log::warn!("Frame at {:?} rejected: {}", frame.timestamp, e),
                }
            }
        }
    }
    log::info!("Posture service stopped");
}

/// Apply one command; returns false once the worker should stop
fn handle_command(monitor: &mut PostureMonitor, command: Command) -> bool {
    // A dropped reply receiver means the caller gave up; nothing to do
    match command {
        Command::Calibrate { frame, reply } => {
            let _ = reply.send(monitor.calibrate(&frame));
        }
        Command::UpdateSensitivity { update, reply } => {
            let _ = reply.send(monitor.update_sensitivity(&update));
        }
        Command::UpdateRawThresholds { update, reply } => {
            let _ = reply.send(monitor.update_raw_thresholds(&update));
        }
        Command::Statistics { reply } => {
            let _ = reply.send(monitor.statistics());
        }
        Command::ResetStatistics { reply } => {
            monitor.reset_statistics();
            let _ = reply.send(());
        }
        Command::Shutdown { reply } => {
            let _ = reply.send(monitor.statistics());
            return false;
        }
    }
    true
}

/// Client side of a running [`PostureService`]
pub struct PostureHandle {
    frames: watch::Sender<Option<FrameInput>>,
    commands: mpsc::Sender<Command>,
    results: broadcast::Sender<ClassificationResult>,
    worker: JoinHandle<()>,
}

impl PostureHandle {
    /// Offer a frame for classification. Replaces any frame the worker has not
    /// picked up yet.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidInput` for malformed frames and
    /// `Error::ServiceStopped` if the worker has exited
    pub fn submit_frame(&self, frame: FrameInput) -> Result<()> {
        frame.validate()?;
        self.frames.send(Some(frame)).map_err(|_| Error::ServiceStopped)
    }

    /// Results of every classified frame from now on
    pub fn subscribe(&self) -> broadcast::Receiver<ClassificationResult> {
        self.results.subscribe()
    }

    /// # Errors
    ///
    /// Returns `Error::InvalidInput` for malformed frames and
    /// `Error::ServiceStopped` if the worker has exited
    pub async fn calibrate(&self, frame: FrameInput) -> Result<CalibrationResult> {
        self.request(|reply| Command::Calibrate {
            frame: Box::new(frame),
            reply,
        })
        .await?
    }

    /// # Errors
    ///
    /// Returns `Error::ConfigError` for out-of-range scales and
    /// `Error::ServiceStopped` if the worker has exited
    pub async fn update_sensitivity(&self, update: SensitivityUpdate) -> Result<()> {
        self.request(|reply| Command::UpdateSensitivity { update, reply }).await?
    }

    /// # Errors
    ///
    /// Returns `Error::ConfigError` for mis-ordered pairs and
    /// `Error::ServiceStopped` if the worker has exited
    pub async fn update_raw_thresholds(&self, update: RawThresholdUpdate) -> Result<()> {
        self.request(|reply| Command::UpdateRawThresholds { update, reply }).await?
    }

    /// # Errors
    ///
    /// Returns `Error::ServiceStopped` if the worker has exited
    pub async fn statistics(&self) -> Result<SessionStatistics> {
        self.request(|reply| Command::Statistics { reply }).await
    }

    /// # Errors
    ///
    /// Returns `Error::ServiceStopped` if the worker has exited
    pub async fn reset_statistics(&self) -> Result<()> {
        self.request(|reply| Command::ResetStatistics { reply }).await
    }

    /// Stop the worker and return the final statistics
    ///
    /// # Errors
    ///
    /// Returns `Error::ServiceStopped` if the worker had already exited
    pub async fn shutdown(self) -> Result<SessionStatistics> {
        let statistics = self.request(|reply| Command::Shutdown { reply }).await?;
        if let Err(e) = self.worker.await {
            log::warn!("Posture service worker failed: {}", e);
        }
        Ok(statistics)
    }

    async fn request<T>(&self, command: impl FnOnce(oneshot::Sender<T>) -> Command) -> Result<T> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(command(reply))
            .await
            .map_err(|_| Error::ServiceStopped)?;
        response.await.map_err(|_| Error::ServiceStopped)
    }
}
