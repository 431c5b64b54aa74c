use crate::errors::AppError;
use crate::models::AppData;
use crate::seed::seed_data;
use std::path::Path;
use tokio::fs;
use tracing::{error, info};

/// Loads the store, falling back to seed data when the file is missing or
/// unreadable.
pub async fn load_data(path: &Path) -> AppData {
    match fs::read(path).await {
        Ok(bytes) => match serde_json::from_slice(&bytes) {
            Ok(data) => data,
            Err(err) => {
                error!("failed to parse data file: {err}");
                seed_data()
            }
        },
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            info!(path = %path.display(), "no data file, seeding defaults");
            seed_data()
        }
        Err(err) => {
            error!("failed to read data file: {err}");
            seed_data()
        }
    }
}

pub async fn persist_data(path: &Path, data: &AppData) -> Result<(), AppError> {
    let payload = serde_json::to_vec_pretty(data).map_err(AppError::internal)?;
    fs::write(path, payload).await.map_err(AppError::internal)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_file_seeds_and_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");

        let data = load_data(&path).await;
        assert_eq!(data.membership_types.len(), 4);
        assert!(data.users.iter().any(|user| user.username == "admin"));

        persist_data(&path, &data).await.unwrap();
        let reloaded = load_data(&path).await;
        assert_eq!(reloaded.members.len(), data.members.len());
        assert_eq!(reloaded.sequences.member, data.sequences.member);
    }

    #[tokio::test]
    async fn corrupt_file_falls_back_to_seed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        fs::write(&path, b"{not json").await.unwrap();

        let data = load_data(&path).await;
        assert!(!data.schedules.is_empty());
    }
}
