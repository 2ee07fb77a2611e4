use thiserror::Error;
use wfc_core::WfcError;
use wfc_rules::LoadError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration Error: {0}")]
    Config(String),

    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Rule File Error: {0}")]
    Rules(#[from] LoadError),

    #[error("WFC Core Error: {0}")]
    WfcCore(#[from] WfcError),

    /// Ctrl+C stopped the run; whatever was generated has been saved.
    #[error("Generation cancelled after {collapsed_cells}/{total_cells} cells")]
    Cancelled {
        collapsed_cells: usize,
        total_cells: usize,
    },

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl AppError {
    /// Process exit code for this error.
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Cancelled { .. } => 130,
            _ => 1,
        }
    }
}
