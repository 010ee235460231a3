use thiserror::Error;

/// Failure inside a host-provided capability such as a [`LoggerSink`](crate::logging::LoggerSink).
#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Bridge operation failed: {0}")]
    OperationFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failure reported by a codec engine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// The engine handle or its library could not be initialized.
    #[error("Engine initialization failed: {0}")]
    Init(String),

    /// A configuration parameter was refused while the engine was being set up.
    #[error("Engine rejected parameter: {0}")]
    Rejected(String),

    /// Raw negative status code returned by the engine.
    #[error("Engine returned status {0}")]
    Status(i32),

    /// The decode engine failed and described why.
    #[error("Engine decode failure: {0}")]
    Decode(String),
}

pub type Result<T> = std::result::Result<T, BridgeError>;
