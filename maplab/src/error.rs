//! Recoverable analysis errors.
//!
//! Every variant is reported as a single message in the result panel. The
//! operation that produced it is aborted without leaving anything on the map,
//! and the controller stays in its current mode so the user can retry.

/// Errors produced by analysis and route operations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AnalysisError {
    /// The geometry engine is not loaded.
    #[error("Error: geometry engine not loaded. Cannot {operation}.")]
    MissingCapability { operation: &'static str },

    /// A required click has not happened yet.
    #[error("{0}")]
    MissingInput(&'static str),

    /// None of the analyzed collections has any features loaded.
    #[error("No data available for analysis: {}.", .collections.join(", "))]
    EmptyDataset { collections: Vec<String> },

    /// The geometry engine rejected an input.
    #[error("Geometry engine error: {0}")]
    Geometry(String),

    /// The current route could not be serialized.
    #[error("Path export failed: {0}")]
    Export(String),
}

impl AnalysisError {
    /// Stable code for logs.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::MissingCapability { .. } => "E_MISSING_CAPABILITY",
            Self::MissingInput(_) => "E_MISSING_INPUT",
            Self::EmptyDataset { .. } => "E_EMPTY_DATASET",
            Self::Geometry(_) => "E_GEOMETRY",
            Self::Export(_) => "E_EXPORT",
        }
    }

    /// The message as a result-panel fragment.
    #[must_use]
    pub fn to_html(&self) -> String {
        format!("<p class=\"error-message\">{self}</p>")
    }
}
