#[derive(Debug, thiserror::Error)]
pub enum PanelError {
    #[error("project not found: {0}")]
    ProjectNotFound(String),

    #[error("environment not found: {0}")]
    EnvironmentNotFound(String),

    #[error("value not found: {0}")]
    ValueNotFound(String),

    #[error("no configuration loaded: {0}")]
    NotLoaded(String),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("config already exists: {0}")]
    AlreadyExists(String),

    #[error("clipboard error: {0}")]
    Clipboard(String),

    #[error("open url error: {0}")]
    Open(String),

    #[error("watch error: {0}")]
    Watch(#[from] notify::Error),

    #[error("yaml error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("io error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, PanelError>;
