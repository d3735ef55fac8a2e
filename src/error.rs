use thiserror::Error;

/// Error taxonomy for the core. `NumericalDegenerate` and `ResourceExhaustion`
/// (see the spec's error handling design) are deliberately absent here: both
/// are handled locally inside a `simulate` call and never surface as an `Err`.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Non-finite or negative mass/radius, zero-length velocity normalization
    /// where a direction is required, or any other rejected constructor input.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The pipeline is missing one of its four stages.
    #[error("invalid simulation configuration: {0}")]
    InvalidConfiguration(String),

    /// Persisted state failed to parse or failed semantic validation.
    #[error("corrupt persisted state: {0}")]
    CorruptPersistedState(String),
}
