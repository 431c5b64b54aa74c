use crate::config::AppConfig;
use crate::errors::AppError;
use crate::models::AppData;
use crate::members::refresh_statuses;
use crate::storage::persist_data;
use chrono::Local;
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub data: Arc<Mutex<AppData>>,
}

impl AppState {
    pub fn new(config: AppConfig, data: AppData) -> Self {
        Self {
            config: Arc::new(config),
            data: Arc::new(Mutex::new(data)),
        }
    }

    /// Locks the store with lapsed memberships already marked expired.
    pub async fn lock(&self) -> MutexGuard<'_, AppData> {
        let mut data = self.data.lock().await;
        refresh_statuses(&mut data, Local::now().date_naive());
        data
    }

    /// Writes the store to disk. Call while still holding the data lock so
    /// writes land in mutation order.
    pub async fn persist(&self, data: &AppData) -> Result<(), AppError> {
        persist_data(&self.config.data_path, data).await
    }
}
