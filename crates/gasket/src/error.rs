//! Fault taxonomy shared by the instrumenter, the intrinsics and the sandbox.

use gasket_runtime::Trap;

/// Every way an instrumentation or invocation can fail.
///
/// `Clone` so a cached build failure can be handed to every caller that
/// asks for the same module.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("invalid name: {0}")]
    InvalidName(String),

    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("runtime error: {0}")]
    Runtime(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("overlapping memory: {0}")]
    OverlappingMemory(String),

    #[error("crypto error: {0}")]
    Crypto(String),

    #[error("arithmetic error: {0}")]
    Arithmetic(String),

    /// Raised by `ftl_exit` to stop the running module. Not a fault: the
    /// call boundary turns it back into a normal completion.
    #[error("module exited with code {0}")]
    Exit(i32),
}

impl Error {
    pub fn runtime(msg: impl Into<String>) -> Self {
        Error::Runtime(msg.into())
    }

    pub fn serialization(msg: impl Into<String>) -> Self {
        Error::Serialization(msg.into())
    }

    pub fn crypto(msg: impl Into<String>) -> Self {
        Error::Crypto(msg.into())
    }

    /// Status code reported by [`crate::Sandbox::execute`].
    pub fn code(&self) -> i32 {
        match self {
            Error::InvalidName(_) => 20001,
            Error::InvalidAddress(_) => 20002,
            Error::Runtime(_) => 20003,
            Error::Serialization(_) => 20004,
            Error::OverlappingMemory(_) => 20005,
            Error::Crypto(_) => 20006,
            Error::Arithmetic(_) => 20007,
            Error::Exit(_) => 0,
        }
    }
}

impl From<wasmparser::BinaryReaderError> for Error {
    fn from(err: wasmparser::BinaryReaderError) -> Self {
        Error::Serialization(err.to_string())
    }
}

impl From<Trap> for Error {
    fn from(trap: Trap) -> Self {
        match trap {
            Trap::DivisionByZero => Error::Arithmetic(trap.to_string()),
            Trap::OutOfBounds | Trap::IntegerOverflow => Error::Runtime(trap.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
