use thiserror::Error;

pub mod email;
pub mod webhook;

#[derive(Debug, Error)]
pub enum SenderError {
    #[error("Sender not configured: {0}")]
    NotConfigured(&'static str),
    #[error("Failed to send notification: {0}")]
    SendFailed(String),
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}
