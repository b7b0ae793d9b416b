//! Error types for the Prisma shim
//!
//! Two failure classes exist by design: environment failures (shader
//! compilation, program linking, invalid descriptor writes) are detected and
//! reported through these types with full diagnostic context; caller-contract
//! violations that would cost per-draw overhead to detect (drawing with
//! incomplete bindings) are documented as undefined instead of checked.

use std::fmt;

/// Result type for Prisma shim operations
pub type Result<T> = std::result::Result<T, Error>;

/// Prisma shim errors
#[derive(Debug, Clone)]
pub enum Error {
    /// Backend-specific error (driver call failed)
    BackendError(String),

    /// Invalid resource (bad descriptor write, undeclared binding, dangling buffer)
    InvalidResource(String),

    /// Operation issued in a state that forbids it (double map, nested render pass)
    InvalidOperation(String),

    /// Shader stage failed to compile (message carries stage, handle and compiler log)
    ShaderCompilationFailed(String),

    /// Program failed to link (message carries program handle and linker log)
    ProgramLinkFailed(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::BackendError(msg) => write!(f, "Backend error: {}", msg),
            Error::InvalidResource(msg) => write!(f, "Invalid resource: {}", msg),
            Error::InvalidOperation(msg) => write!(f, "Invalid operation: {}", msg),
            Error::ShaderCompilationFailed(msg) => write!(f, "Shader compilation failed: {}", msg),
            Error::ProgramLinkFailed(msg) => write!(f, "Program link failed: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
