use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReminderError {
    #[error("invalid reminder time '{input}': {reason}")]
    InvalidTime { input: String, reason: &'static str },

    #[error("reminder delay must be greater than zero")]
    InvalidDelay,

    #[error("notification permission denied")]
    PermissionDenied,

    #[error("notification gateway failure")]
    Gateway(#[source] anyhow::Error),

    #[error("reminder storage failure")]
    Storage(#[source] anyhow::Error),
}

impl ReminderError {
    pub(crate) fn invalid_time(input: &str, reason: &'static str) -> Self {
        Self::InvalidTime {
            input: input.to_string(),
            reason,
        }
    }
}
