use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("invalid command payload: {0}")]
    InvalidArgument(String),
}
