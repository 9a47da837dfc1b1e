use thiserror::Error;

/// Errors the session library can surface to the application.
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("trial log I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("trial log row malformed: {0}")]
    Log(#[from] csv::Error),

    #[error("config file malformed: {0}")]
    Config(#[from] serde_json::Error),

    #[error("participant intake failed: {0}")]
    Intake(String),
}

pub type Result<T, E = SessionError> = std::result::Result<T, E>;
