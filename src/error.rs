use thiserror::Error;

/// Everything that can go wrong inside the batch-prediction workspace.
///
/// Only `Format` blocks an operation outright. Prediction failures
/// (`Network`, `Business`, `MalformedResponse`) are recovered by the
/// fallback generator. Running with nothing loaded is not an error at all;
/// it comes back as a skipped run.
#[derive(Error, Debug)]
pub enum WorkspaceError {
    /// Upload rejected because it is not a CSV file
    #[error("not a CSV file: {0}")]
    Format(String),

    /// Transport failure or non-success HTTP status from the prediction service
    #[error("prediction request failed: {0}")]
    Network(String),

    /// Service answered but reported `success: false`
    #[error("prediction failed: {0}")]
    Business(String),

    /// Service body could not be decoded or does not line up with the batch
    #[error("malformed prediction response: {0}")]
    MalformedResponse(String),

    /// Workspace opened without a signed-in user
    #[error("no user is signed in")]
    NotSignedIn,

    /// Session store could not be read or written
    #[error("session error: {0}")]
    Session(String),

    /// Configuration file or environment override is invalid
    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl WorkspaceError {
    /// True for the failures that the orchestrator replaces with synthetic data.
    pub fn is_prediction_failure(&self) -> bool {
        matches!(
            self,
            WorkspaceError::Network(_)
                | WorkspaceError::Business(_)
                | WorkspaceError::MalformedResponse(_)
        )
    }
}

impl From<reqwest::Error> for WorkspaceError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            WorkspaceError::MalformedResponse(err.to_string())
        } else {
            WorkspaceError::Network(err.to_string())
        }
    }
}

pub type Result<T> = std::result::Result<T, WorkspaceError>;
