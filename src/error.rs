//! Crate-level error type.

use crate::io::bag::BagError;
use crate::io::protocol::ClientError;
use crate::retarget::RetargetError;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config parse error: {0}")]
    TomlDe(#[from] toml::de::Error),

    #[error("Config write error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Client error: {0}")]
    Client(#[from] ClientError),

    #[error("Capture file error: {0}")]
    Bag(#[from] BagError),

    #[error("Retarget error: {0}")]
    Retarget(#[from] RetargetError),
}
