use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("No home directory")]
    NoHomeDir,

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Task not found: {0}")]
    TaskNotFound(String),

    #[error("Stage not found: {0}")]
    StageNotFound(String),

    #[error("The root stage cannot be deleted")]
    RootStageProtected,

    #[error("License is missing or invalid")]
    LicenseInvalid,

    #[error("Graph view is {state}, cannot {op}")]
    InvalidViewState { state: &'static str, op: &'static str },

    #[error("Layout engine dropped before completing")]
    LayoutCancelled,

    #[error("Task join error: {0}")]
    TaskJoin(String),

    #[error("Operation timed out after {0:?}")]
    Timeout(std::time::Duration),
}

pub type Result<T> = std::result::Result<T, Error>;
