//! Error types for the NITF record core

use thiserror::Error;

pub type Result<T> = std::result::Result<T, NitfError>;

#[derive(Error, Debug)]
pub enum NitfError {
    #[error("Allocation failed: {0}")]
    Memory(String),

    #[error("Invalid field content: {0}")]
    Parse(String),

    #[error("Value of {got} bytes exceeds field width {width}")]
    FieldLength { got: usize, width: usize },

    #[error("Invalid object: {0}")]
    InvalidObject(String),

    #[error("Unknown field: {0}")]
    UnknownField(String),

    #[error("No handler registered for '{0}'")]
    NoHandler(String),

    #[error("Handler rejected {0}")]
    HandlerRejected(String),

    #[error("Invalid overflow segment: {0}")]
    InvalidOverflow(String),

    #[error("Could not open {0}")]
    OpeningFile(String),

    #[error("Could not load plugin library: {0}")]
    LoadingLibrary(String),

    #[error("No compression handler for '{0}'")]
    Compression(String),

    #[error("No decompression handler for '{0}'")]
    Decompression(String),
}

impl NitfError {
    /// Stable error-kind code, independent of the formatted message.
    pub fn code(&self) -> &'static str {
        match self {
            NitfError::Memory(_) => "MEMORY",
            NitfError::Parse(_) => "PARSE",
            NitfError::FieldLength { .. } => "FIELD_LENGTH",
            NitfError::InvalidObject(_) => "INVALID_OBJECT",
            NitfError::UnknownField(_) => "UNKNOWN_FIELD",
            NitfError::NoHandler(_) => "NO_HANDLER",
            NitfError::HandlerRejected(_) => "HANDLER_REJECTED",
            NitfError::InvalidOverflow(_) => "INVALID_OVERFLOW",
            NitfError::OpeningFile(_) => "OPENING_FILE",
            NitfError::LoadingLibrary(_) => "LOADING_LIBRARY",
            NitfError::Compression(_) => "COMPRESSION",
            NitfError::Decompression(_) => "DECOMPRESSION",
        }
    }
}
