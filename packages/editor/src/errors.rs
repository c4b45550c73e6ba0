//! Error types for the editor

use pagesmith_model::ModelError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EditorError {
    #[error("Mutation error: {0}")]
    Mutation(#[from] crate::mutations::MutationError),

    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    #[error("Invalid editor configuration: {0}")]
    Config(#[from] serde_json::Error),
}
