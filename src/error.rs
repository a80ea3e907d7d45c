//! Graphics error types.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while configuring the pipeline or submitting a frame.
///
/// Native result codes are carried verbatim in [`GraphicsError::Api`] so the
/// caller sees exactly what the GPU API returned.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphicsError {
    /// Shader bytecode could not be read from storage.
    #[error("failed to read shader bytecode {path:?}: {kind}")]
    ShaderBytecodeRead {
        path: PathBuf,
        kind: std::io::ErrorKind,
    },
    /// Shader source failed to compile.
    #[error("failed to compile shader {path:?}: {message}")]
    ShaderCompilation { path: PathBuf, message: String },
    /// A GPU API call returned a failure code.
    #[error("{call} failed with code {code:#010x}")]
    Api { call: &'static str, code: i32 },
    /// Rendering was requested before a successful initialization.
    #[error("renderer is not initialized")]
    NotInitialized,
    /// A resource required by the draw path has not been supplied.
    #[error("missing resource: {0}")]
    MissingResource(&'static str),
    /// An invalid parameter was provided.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
}

impl GraphicsError {
    /// The native result code, if this error came from the GPU API.
    pub fn code(&self) -> Option<i32> {
        match self {
            Self::Api { code, .. } => Some(*code),
            _ => None,
        }
    }
}

pub type GraphicsResult<T> = Result<T, GraphicsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = GraphicsError::Api {
            call: "CreateSwapChain",
            code: 0x887A0001_u32 as i32,
        };
        assert_eq!(err.to_string(), "CreateSwapChain failed with code 0x887a0001");
        assert_eq!(err.code(), Some(0x887A0001_u32 as i32));

        let err = GraphicsError::MissingResource("index buffer");
        assert_eq!(err.to_string(), "missing resource: index buffer");
        assert_eq!(err.code(), None);
    }

    #[test]
    fn test_read_error_keeps_path() {
        let err = GraphicsError::ShaderBytecodeRead {
            path: PathBuf::from("shaders/missing.cso"),
            kind: std::io::ErrorKind::NotFound,
        };
        assert!(err.to_string().contains("shaders/missing.cso"));
    }
}
