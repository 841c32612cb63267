use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Recording encoding error: {0}")]
    Encoding(#[from] bincode::Error),

    #[error("OBJ text is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("Invalid profile: {0}")]
    InvalidProfile(String),

    #[error("Invalid topology: {0}")]
    InvalidTopology(String),

    #[error("Inconsistent mesh: {0}")]
    InconsistentMesh(String),

    #[error("No output mesh available: no frame has been tracked in this session")]
    NoOutputMesh,
}

pub type Result<T> = std::result::Result<T, Error>;
