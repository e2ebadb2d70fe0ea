use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AushadhiError {
    /// The structure string could not be turned into a molecular graph.
    #[error("Invalid structure '{smiles}': {reason}")]
    InvalidStructure { smiles: String, reason: String },

    #[error("Render backend unavailable: {0}")]
    RenderBackendUnavailable(String),

    #[error("Rendering timed out after {0:?}")]
    RenderTimeout(Duration),

    #[error("Image encoding error: {0}")]
    Image(String),
}

impl AushadhiError {
    pub fn invalid_structure(smiles: &str, reason: impl Into<String>) -> Self {
        AushadhiError::InvalidStructure {
            smiles: smiles.to_string(),
            reason: reason.into(),
        }
    }

    /// Failures that only cost a molecule its image, never the whole request.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            AushadhiError::InvalidStructure { .. }
                | AushadhiError::RenderBackendUnavailable(_)
                | AushadhiError::RenderTimeout(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, AushadhiError>;
