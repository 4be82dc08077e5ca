#![allow(dead_code)]

use std::sync::Arc;
use tokio::sync::Mutex;
use video_store::{DataChange, MutationHook};

/// Hook that records every change it is given
#[derive(Clone, Default)]
pub struct RecordingHook {
    changes: Arc<Mutex<Vec<DataChange>>>,
}

impl RecordingHook {
    pub async fn changes(&self) -> Vec<DataChange> {
        self.changes.lock().await.clone()
    }

    pub async fn count(&self) -> usize {
        self.changes.lock().await.len()
    }

    pub async fn clear(&self) {
        self.changes.lock().await.clear();
    }
}

#[async_trait::async_trait]
impl MutationHook for RecordingHook {
    async fn on_data_changed(&self, change: DataChange) {
        self.changes.lock().await.push(change);
    }
}
