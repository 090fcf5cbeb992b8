use serde_json::{json, Value};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::time::{sleep, Duration};
use tracing::{debug, warn};

use crate::store::{Store, DATA, DEVICES};

const MAX_ATTEMPTS: u32 = 3;

/// Bookkeeping work dispatched behind a response: device touches, audit
/// appends, cascade sub-deletes. The enqueuing handler never observes the
/// outcome; the worker retries a few times and then drops the job.
pub enum Job {
    /// Merge `patch` into one document. A missing document is not an error —
    /// the target may have been deleted since the job was enqueued.
    Patch {
        collection: &'static str,
        id: String,
        patch: Value,
    },
    /// Insert a new document.
    Append {
        collection: &'static str,
        doc: Value,
    },
    /// Delete every document whose `field` equals `value`.
    DeleteMatching {
        collection: &'static str,
        field: &'static str,
        value: String,
    },
    /// Delete a device's sensor readings, then the device itself. Log
    /// entries are left alone.
    DeleteDeviceSubtree { id_device: String },
}

#[derive(Clone)]
pub struct Bookkeeper {
    tx: mpsc::Sender<Job>,
}

impl Bookkeeper {
    pub fn new(store: Arc<Store>, queue_size: usize) -> Self {
        let (tx, rx) = mpsc::channel(queue_size);
        tokio::spawn(worker_loop(store, rx));
        Self { tx }
    }

    pub async fn enqueue(&self, job: Job) {
        if self.tx.send(job).await.is_err() {
            warn!("bookkeeper queue closed, job dropped");
        }
    }
}

async fn worker_loop(store: Arc<Store>, mut rx: mpsc::Receiver<Job>) {
    while let Some(job) = rx.recv().await {
        run_job(&store, job).await;
    }
}

async fn run_job(store: &Store, job: Job) {
    for attempt in 1..=MAX_ATTEMPTS {
        match apply(store, &job).await {
            Ok(()) => return,
            Err(err) if attempt < MAX_ATTEMPTS => {
                debug!("bookkeeping job failed (attempt {attempt}): {err}");
                sleep(Duration::from_millis(50 * u64::from(attempt))).await;
            }
            Err(err) => {
                warn!("bookkeeping job dropped after {MAX_ATTEMPTS} attempts: {err}");
            }
        }
    }
}

async fn apply(store: &Store, job: &Job) -> anyhow::Result<()> {
    match job {
        Job::Patch {
            collection,
            id,
            patch,
        } => {
            store.update_by_id(collection, id, patch).await?;
        }
        Job::Append { collection, doc } => {
            store.insert(collection, doc).await?;
        }
        Job::DeleteMatching {
            collection,
            field,
            value,
        } => {
            let matches = store
                .query_equals(collection, &[(field, json!(value))])
                .await?;
            for (id, _) in matches {
                store.delete_by_id(collection, &id).await?;
            }
        }
        Job::DeleteDeviceSubtree { id_device } => {
            let readings = store
                .query_equals(DATA, &[("id_device", json!(id_device))])
                .await?;
            for (id, _) in readings {
                store.delete_by_id(DATA, &id).await?;
            }
            store.delete_by_id(DEVICES, id_device).await?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::LOGS;
    use serde_json::json;

    fn open_temp() -> (tempfile::TempDir, Arc<Store>) {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(Store::new(dir.path().to_str().unwrap()).unwrap());
        (dir, store)
    }

    async fn wait_for<F>(mut cond: F)
    where
        F: FnMut() -> std::pin::Pin<Box<dyn std::future::Future<Output = bool>>>,
    {
        for _ in 0..100 {
            if cond().await {
                return;
            }
            sleep(Duration::from_millis(20)).await;
        }
        panic!("condition not reached in time");
    }

    #[tokio::test]
    async fn patch_job_lands() {
        let (_dir, store) = open_temp();
        let bk = Bookkeeper::new(store.clone(), 8);
        let id = store
            .insert(DEVICES, &json!({"name": "d", "last_update": "old"}))
            .await
            .unwrap();

        bk.enqueue(Job::Patch {
            collection: DEVICES,
            id: id.clone(),
            patch: json!({"last_update": "new"}),
        })
        .await;

        wait_for(|| {
            let store = store.clone();
            let id = id.clone();
            Box::pin(async move {
                store.get_by_id(DEVICES, &id).await.unwrap().unwrap()["last_update"]
                    == json!("new")
            })
        })
        .await;
    }

    #[tokio::test]
    async fn patch_on_missing_document_is_swallowed() {
        let (_dir, store) = open_temp();
        let bk = Bookkeeper::new(store.clone(), 8);

        bk.enqueue(Job::Patch {
            collection: DEVICES,
            id: "ghost".into(),
            patch: json!({"last_update": "new"}),
        })
        .await;
        // follow with a job we can observe to know the first one drained
        bk.enqueue(Job::Append {
            collection: LOGS,
            doc: json!({"id_data": "x", "value": 1, "timestamp": "t"}),
        })
        .await;

        wait_for(|| {
            let store = store.clone();
            Box::pin(async move {
                !store
                    .query_equals(LOGS, &[("id_data", json!("x"))])
                    .await
                    .unwrap()
                    .is_empty()
            })
        })
        .await;
    }

    #[tokio::test]
    async fn subtree_job_removes_readings_then_device() {
        let (_dir, store) = open_temp();
        let bk = Bookkeeper::new(store.clone(), 8);

        let id_device = store
            .insert(DEVICES, &json!({"name": "d", "id_user": "u1"}))
            .await
            .unwrap();
        store
            .insert(DATA, &json!({"name": "temp", "id_device": id_device}))
            .await
            .unwrap();
        store
            .insert(DATA, &json!({"name": "hum", "id_device": id_device}))
            .await
            .unwrap();

        bk.enqueue(Job::DeleteDeviceSubtree {
            id_device: id_device.clone(),
        })
        .await;

        wait_for(|| {
            let store = store.clone();
            let id_device = id_device.clone();
            Box::pin(async move {
                store.get_by_id(DEVICES, &id_device).await.unwrap().is_none()
                    && store
                        .query_equals(DATA, &[("id_device", json!(id_device))])
                        .await
                        .unwrap()
                        .is_empty()
            })
        })
        .await;
    }
}
