//! Per-file lifecycle orchestration.
//!
//! A single worker drains the task queue, so at most one engine job is ever
//! in flight; the shared in-flight set additionally rejects a second task
//! for a source path that is still pending or active. Task failures are
//! logged and never take the process down.

use crate::engine::{Engine, Job};
use crate::error::TaskError;
use crate::geometry::{Resolution, plan};
use crate::task::{MediaTask, NamingPolicy};
use async_channel::{Receiver, Sender};
use futures::StreamExt;
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::{Arc, Mutex as StdMutex};
use tokio::sync::Mutex as TokioMutex;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Everything the controller needs besides the engine itself.
#[derive(Debug, Clone)]
pub struct ControllerSettings {
    pub watermark: PathBuf,
    pub output_dir: PathBuf,
    pub naming: NamingPolicy,
    pub delete_source: bool,
}

pub struct Controller<E> {
    engine: Arc<E>,
    settings: Arc<ControllerSettings>,
    in_flight: Arc<TokioMutex<BTreeSet<PathBuf>>>,
    task_tx: Sender<MediaTask>,
    worker: Arc<StdMutex<Option<JoinHandle<()>>>>,
}

impl<E> Clone for Controller<E> {
    fn clone(&self) -> Self {
        Self {
            engine: self.engine.clone(),
            settings: self.settings.clone(),
            in_flight: self.in_flight.clone(),
            task_tx: self.task_tx.clone(),
            worker: self.worker.clone(),
        }
    }
}

impl<E: Engine> Controller<E> {
    /// Builds the controller and starts its worker.
    pub fn new(engine: E, settings: ControllerSettings) -> Self {
        let (task_tx, task_rx) = async_channel::unbounded();
        let this = Self {
            engine: Arc::new(engine),
            settings: Arc::new(settings),
            in_flight: Arc::new(TokioMutex::new(BTreeSet::new())),
            task_tx,
            worker: Arc::new(StdMutex::new(None)),
        };

        let handle = tokio::spawn({
            let this = this.clone();
            async move { this.run_worker(task_rx).await }
        });
        *this.worker.lock().expect("worker handle lock") = Some(handle);

        this
    }

    /// Queues one discovered path. Paths already pending or active are
    /// skipped, as are paths without a usable file name.
    pub async fn submit(&self, source: PathBuf) {
        let Some(task) =
            MediaTask::new(source.clone(), &self.settings.output_dir, self.settings.naming)
        else {
            warn!(?source, "Discovered entry has no usable file name, skipping");
            return;
        };

        {
            let mut in_flight = self.in_flight.lock().await;
            if !in_flight.insert(task.source_path.clone()) {
                warn!(?source, "Task already in flight, skipping");
                return;
            }
        }

        debug!(?source, "Task added to processing queue");
        if self.task_tx.send(task).await.is_err() {
            warn!(?source, "Task worker is gone, dropping task");
            self.in_flight.lock().await.remove(&source);
        }
    }

    /// Closes the queue, lets the worker drain what is left and waits for it.
    pub async fn shutdown(&self) {
        self.task_tx.close();
        let handle = self.worker.lock().expect("worker handle lock").take();
        if let Some(handle) = handle {
            if let Err(error) = handle.await {
                error!(%error, "Task worker panicked");
            }
        }
    }

    async fn run_worker(self, task_rx: Receiver<MediaTask>) {
        info!("Task worker started");
        let mut task_rx = std::pin::pin!(task_rx);
        while let Some(task) = task_rx.next().await {
            let source = task.source_path.clone();
            match self.process(&task).await {
                Ok(()) => {
                    info!(source = ?source, output = ?task.output_path, "Task completed");
                }
                Err(error) => error!(%error, "Task failed"),
            }
            self.in_flight.lock().await.remove(&source);
        }
        debug!("Task worker finished");
    }

    /// Drives one task through validate → probe → plan → submit → cleanup.
    /// Every error branch leaves the source file untouched.
    async fn process(&self, task: &MediaTask) -> Result<(), TaskError> {
        let source = task.source_path.as_path();
        debug!(?source, "Validating task");

        let watermark = self.settings.watermark.as_path();
        if !watermark.exists() {
            return Err(TaskError::MissingWatermarkAsset { path: watermark.to_path_buf() });
        }

        let streams = self.engine.probe(source).await.map_err(|error| TaskError::Probe {
            path: source.to_path_buf(),
            diagnostic: format!("{error:#}"),
        })?;
        let resolution = Resolution::from_streams(&streams)
            .ok_or_else(|| TaskError::DimensionsUnavailable { path: source.to_path_buf() })?;

        let plan = plan(resolution);
        debug!(
            ?source,
            width = resolution.width,
            height = resolution.height,
            scale_width = plan.scale_width,
            "Planned watermark geometry"
        );

        tokio::fs::create_dir_all(&self.settings.output_dir).await.map_err(|error| {
            TaskError::OutputDir {
                path: self.settings.output_dir.clone(),
                diagnostic: error.to_string(),
            }
        })?;

        let job = Job::new(
            task.source_path.clone(),
            watermark.to_path_buf(),
            &plan,
            self.settings.naming.output_format(),
            task.output_path.clone(),
        );
        self.engine.submit(&job).await.map_err(|error| TaskError::Transcode {
            path: source.to_path_buf(),
            diagnostic: format!("{error:#}"),
        })?;

        if self.settings.delete_source {
            // Gated strictly behind the engine's confirmed success.
            match tokio::fs::remove_file(source).await {
                Ok(()) => info!(?source, "Deleted source after successful transcode"),
                Err(error) => warn!(?source, %error, "Processed source could not be deleted"),
            }
        }

        Ok(())
    }
}
