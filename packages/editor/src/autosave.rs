//! # Autosave Channel
//!
//! Saves run on a tokio task, decoupled from the engine: the editor side
//! only pushes snapshots into an unbounded channel and never waits. The
//! worker collapses a backlog to the newest snapshot per project, writes on
//! a blocking thread and publishes a [`SaveReport`] for each attempt. A
//! failed save is reported and not retried.

use crate::node::Project;
use crate::persistence::ProjectStorage;
use crate::EditorError;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

#[derive(Debug, Clone, PartialEq)]
pub enum SaveReport {
    Saved { project_id: String, version: u64 },
    Failed { project_id: String, version: u64, error: String },
}

#[derive(Debug)]
struct SaveRequest {
    project: Project,
    version: u64,
}

/// Sending side held by the editor host
#[derive(Debug, Clone)]
pub struct AutosaveHandle {
    tx: mpsc::UnboundedSender<SaveRequest>,
}

impl AutosaveHandle {
    /// Queue a snapshot for saving without blocking
    pub fn request(&self, project: Project, version: u64) -> Result<(), EditorError> {
        self.tx
            .send(SaveRequest { project, version })
            .map_err(|_| EditorError::Save("autosave worker has stopped".to_string()))
    }
}

pub struct Autosaver;

impl Autosaver {
    /// Start the worker; it stops once every handle is dropped
    pub fn spawn(
        storage: Arc<dyn ProjectStorage>,
    ) -> (AutosaveHandle, mpsc::UnboundedReceiver<SaveReport>, JoinHandle<()>) {
        let (tx, mut rx) = mpsc::unbounded_channel::<SaveRequest>();
        let (report_tx, report_rx) = mpsc::unbounded_channel();

        let worker = tokio::spawn(async move {
            while let Some(first) = rx.recv().await {
                let mut batch = vec![first];
                while let Ok(next) = rx.try_recv() {
                    batch.push(next);
                }

                for request in newest_per_project(batch) {
                    let report = save(storage.clone(), request).await;
                    if let SaveReport::Failed { project_id, error, .. } = &report {
                        tracing::error!("autosave of {} failed: {}", project_id, error);
                    }
                    // nobody listening is fine
                    let _ = report_tx.send(report);
                }
            }
            tracing::debug!("autosave worker stopped");
        });

        (AutosaveHandle { tx }, report_rx, worker)
    }
}

fn newest_per_project(batch: Vec<SaveRequest>) -> Vec<SaveRequest> {
    let mut newest: Vec<SaveRequest> = Vec::new();
    for request in batch {
        match newest.iter_mut().find(|r| r.project.id == request.project.id) {
            Some(slot) => *slot = request,
            None => newest.push(request),
        }
    }
    newest
}

async fn save(storage: Arc<dyn ProjectStorage>, request: SaveRequest) -> SaveReport {
    let project_id = request.project.id.clone();
    let version = request.version;

    let result = tokio::task::spawn_blocking(move || storage.save(&request.project)).await;
    match result {
        Ok(Ok(())) => SaveReport::Saved { project_id, version },
        Ok(Err(e)) => SaveReport::Failed {
            project_id,
            version,
            error: e.to_string(),
        },
        Err(e) => SaveReport::Failed {
            project_id,
            version,
            error: e.to_string(),
        },
    }
}
