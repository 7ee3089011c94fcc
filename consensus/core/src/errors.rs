use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HeaderError {
    #[error("Invalid header: empty input")]
    Empty,

    #[error("Invalid header length: {0}")]
    InvalidLength(usize),

    #[error("Invalid header hex: {0}")]
    InvalidHex(String),
}

#[derive(Error, Debug)]
pub enum ParamsError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Checkpoint file is malformed: {0}")]
    Checkpoints(#[from] serde_json::Error),

    #[error("Unknown network: {0}")]
    UnknownNetwork(String),
}
