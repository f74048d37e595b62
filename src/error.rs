use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("phi must be in 0..=5 (0 disables attention), got {0}")]
    InvalidPhi(i64),

    #[error("invalid model config: {0}")]
    InvalidConfig(String),

    #[error("unknown attention variant `{0}`")]
    UnknownAttention(String),

    #[error("config io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
