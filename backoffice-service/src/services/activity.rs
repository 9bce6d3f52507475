use async_trait::async_trait;
use service_core::error::AppError;
use std::sync::Mutex;

/// Append-only per-user activity trail.
#[async_trait]
pub trait ActivityLog: Send + Sync {
    async fn record(&self, email: &str, action: &str) -> Result<(), AppError>;
}

/// In-memory trail, used by tests.
#[derive(Debug, Default)]
pub struct MemoryActivityLog {
    pub entries: Mutex<Vec<(String, String)>>,
    fail: bool,
}

impl MemoryActivityLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// A log whose every write fails.
    pub fn failing() -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    /// Actions recorded for `email`, oldest first.
    pub fn actions_for(&self, email: &str) -> Vec<String> {
        self.entries
            .lock()
            .map(|entries| {
                entries
                    .iter()
                    .filter(|(e, _)| e == email)
                    .map(|(_, action)| action.clone())
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[async_trait]
impl ActivityLog for MemoryActivityLog {
    async fn record(&self, email: &str, action: &str) -> Result<(), AppError> {
        if self.fail {
            return Err(AppError::DatabaseError(anyhow::anyhow!(
                "Activity log unavailable"
            )));
        }
        self.entries
            .lock()
            .map_err(|e| anyhow::anyhow!("Activity log mutex poisoned: {}", e))?
            .push((email.to_string(), action.to_string()));
        Ok(())
    }
}
