//! Rule error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RulesError {
    #[error("Rule engine error: {0}")]
    Engine(String),

    #[error("Session error: {0}")]
    Session(#[from] sandtab_session::SessionError),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}
