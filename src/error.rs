use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid report data: {0}")]
    Json(#[from] serde_json::Error),

    /// Fonts are loaded once per document; there is no fallback face.
    #[error("font error ({origin}): {message}")]
    Font { origin: String, message: String },

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("chart error: {0}")]
    Chart(String),

    #[error("layout error: {0}")]
    Layout(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl Error {
    pub(crate) fn font(path: Option<&Path>, message: impl Into<String>) -> Self {
        Error::Font {
            origin: path.map_or_else(|| "built-in".to_string(), |p| p.display().to_string()),
            message: message.into(),
        }
    }
}
