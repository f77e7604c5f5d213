use thiserror::Error;

/// Failure reported by a host capability.
#[derive(Error, Debug)]
pub enum BridgeError {
    /// The host did not provide the capability, or it cannot start.
    #[error("Bridge capability not available: {0}")]
    NotAvailable(String),

    /// Transport or platform failure while performing a call.
    #[error("Bridge operation failed: {0}")]
    OperationFailed(String),

    /// The audio subsystem could not load or drive a resource.
    #[error("Audio resource error: {0}")]
    Audio(String),

    /// Secure storage refused a read or write.
    #[error("Secure storage error: {0}")]
    SecureStorage(String),
}

pub type Result<T> = std::result::Result<T, BridgeError>;
