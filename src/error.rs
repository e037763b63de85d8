//! Structured error types for FlexTable.
//!
//! Only collaborator and import failures surface as errors. Cell-level parse
//! failures are modelled as `None` and never reach this enum.

/// All errors that can occur while loading, rendering or exporting a table.
#[derive(Debug, thiserror::Error)]
pub enum FlexTableError {
    /// The host data source is unavailable or a fetch failed.
    #[error("Data source: {0}")]
    DataSource(String),

    /// Reading or writing a preference blob failed.
    #[error("Preferences: {0}")]
    Preferences(String),

    /// JSON (de)serialization error.
    #[error("JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// A configuration file failed validation on import.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// The dataset shape is inconsistent (ragged rows, unknown columns).
    #[error("Invalid dataset: {0}")]
    Dataset(String),

    /// Rendering error.
    #[error("Render error: {0}")]
    Render(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Catch-all for string errors.
    #[error("{0}")]
    Other(String),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, FlexTableError>;

impl From<String> for FlexTableError {
    fn from(s: String) -> Self {
        Self::Other(s)
    }
}

impl From<&str> for FlexTableError {
    fn from(s: &str) -> Self {
        Self::Other(s.to_string())
    }
}

#[cfg(target_arch = "wasm32")]
impl From<FlexTableError> for wasm_bindgen::JsValue {
    fn from(e: FlexTableError) -> Self {
        wasm_bindgen::JsValue::from_str(&e.to_string())
    }
}
