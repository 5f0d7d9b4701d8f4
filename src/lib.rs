pub mod assistant;
pub mod config;
pub mod error;
pub mod export;
pub mod history;
pub mod ingest;
pub mod predict;
pub mod search;
pub mod session;
pub mod status;
pub mod workspace;

pub use error::{Result, WorkspaceError};
pub use workspace::{PredictionSource, RunOutcome, SkipReason, Workspace};
