use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BridgeError {
    #[error("bridge is already attached to a host window")]
    AlreadyAttached,
    #[error("bridge has been torn down")]
    Disposed,
    #[error("bridge is gone; caret update was dropped")]
    Disconnected,
    #[error("blocking caret update sent from the message thread")]
    OnUiThread,
    #[error("os call failed: {0}")]
    Os(String),
}

impl BridgeError {
    pub fn os(msg: impl Into<String>) -> Self {
        BridgeError::Os(msg.into())
    }
}
