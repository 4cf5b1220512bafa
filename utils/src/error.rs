use std::path::PathBuf;

use alloy::{primitives::Address, transports::TransportError};

pub type Result<T> = std::result::Result<T, UtilsError>;

#[derive(Debug, thiserror::Error)]
pub enum UtilsError {
    #[error(transparent)]
    Common(#[from] yieldscope_common::Error),

    #[error("Address '{0}' is not a valid Ethereum address.")]
    InvalidAddress(String),

    #[error("Failed to parse URL: {0}. (Error: {1:?})")]
    UrlParsingFailed(String, url::ParseError),

    #[error("RPC URL is not set. Pass --rpc or run `yieldscope config set-rpc <url>`.")]
    RpcUrlNotSet,

    #[error("Failed to get base directories.")]
    BaseDirsFailed,

    #[error("Failed to create directory: {0:?}. (Error: {1:?})")]
    CreateDirAllFailed(PathBuf, std::io::Error),

    #[error("Failed to read the file: {0}. (Error: {1:?})")]
    FileReadFailed(PathBuf, std::io::Error),

    #[error("Failed to write to the file: {0}. (Error: {1:?})")]
    FileWriteFailed(PathBuf, std::io::Error),

    #[error("Parsing the toml file failed: {0}. (Error: {1:?})")]
    TomlParsingFailed(PathBuf, toml::de::Error),

    #[error("Formatting to toml format failed: {0}. (Error: {1:?})")]
    TomlFormattingFailed(String, toml::ser::Error),

    #[error("Parsing the yaml file failed: {0}. (Error: {1:?})")]
    YamlParsingFailed(PathBuf, serde_yaml::Error),

    #[error("Formatting to yaml format failed: {0}. (Error: {1:?})")]
    YamlFormattingFailed(String, serde_yaml::Error),

    #[error("Call to {method} on {contract} failed. (Error: {error})")]
    ContractCall {
        contract: Address,
        method: &'static str,
        error: Box<alloy::contract::Error>,
    },

    #[error("RPC request {method} failed. (Error: {error})")]
    Rpc {
        method: &'static str,
        error: Box<TransportError>,
    },

    #[error("Chainlink feed {feed} returned a negative price: {price}")]
    ChainlinkNegativePrice { feed: Address, price: String },

    #[error("Failed to read position {asset}. (Error: {source})")]
    PositionUnreadable {
        asset: Address,
        source: Box<UtilsError>,
    },

    #[error("Insufficient gas history data: need {needed} samples, got {got}.")]
    InsufficientGasSamples { needed: usize, got: usize },

    #[error("Analysis task for {asset} did not complete. (Error: {error})")]
    AnalysisTaskFailed {
        asset: Address,
        error: tokio::task::JoinError,
    },
}

impl UtilsError {
    /// Wraps an error hit while reading a position's core metadata so the caller can tell
    /// which asset failed.
    pub fn position_unreadable(asset: Address, source: UtilsError) -> Self {
        Self::PositionUnreadable {
            asset,
            source: Box::new(source),
        }
    }
}
