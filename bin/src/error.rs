pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Utils(#[from] yieldscope_utils::Error),

    #[error("Failed to serialize output to JSON. (Error: {0})")]
    JsonFormattingFailed(#[from] serde_json::Error),

    #[error("None of the {0} requested positions could be analyzed.")]
    NothingAnalyzed(usize),
}
