//! Axiom API error types.

use thiserror::Error;

/// Errors raised while talking to the Axiom API.
#[derive(Debug, Error)]
pub enum AxiomError {
    /// Transport failure or a non-success API response.
    #[error("axiom api request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a shape the client cannot use.
    #[error("unexpected axiom api response: {0}")]
    UnexpectedResponse(&'static str),
}

/// Result alias for Axiom operations.
pub type Result<T> = std::result::Result<T, AxiomError>;
