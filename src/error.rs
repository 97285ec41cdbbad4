use thiserror::Error;

#[derive(Error, Debug)]
pub enum TreeError {
    #[error("change notification dropped: {0}")]
    NotifyFailed(String),
}

pub type Result<T> = std::result::Result<T, TreeError>;
