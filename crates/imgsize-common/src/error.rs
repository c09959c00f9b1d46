use std::path::PathBuf;

/// Unified error type for all imgsize operations
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Unsupported or invalid image format: {0}")]
    UnsupportedFormat(String),

    #[error("Truncated input: needed {wanted} more bytes")]
    TruncatedInput { wanted: usize },

    #[error("Invalid file path: {0}")]
    InvalidPath(PathBuf),

    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Source is empty, compression ratio is undefined")]
    EmptySource,

    #[error("Decoded size of {width}x{height} at {bytes_per_pixel} bytes/pixel overflows 64 bits")]
    SizeOverflow {
        width: u32,
        height: u32,
        bytes_per_pixel: u32,
    },

    #[error("Worker pool failed to start: {0}")]
    WorkerPool(String),
}

impl Error {
    /// Map an I/O failure from a short read to `TruncatedInput`, keep others as `Io`.
    pub fn from_read(err: std::io::Error, wanted: usize) -> Self {
        if err.kind() == std::io::ErrorKind::UnexpectedEof {
            Self::TruncatedInput { wanted }
        } else {
            Self::Io(err)
        }
    }

    /// True for failures that mean "this is not a usable image" rather than
    /// an environment problem.
    pub fn is_format_error(&self) -> bool {
        matches!(self, Self::UnsupportedFormat(_) | Self::TruncatedInput { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_eof_maps_to_truncated() {
        let err = Error::from_read(io::Error::from(io::ErrorKind::UnexpectedEof), 13);
        assert!(matches!(err, Error::TruncatedInput { wanted: 13 }));
        assert!(err.is_format_error());

        let err = Error::from_read(io::Error::from(io::ErrorKind::PermissionDenied), 4);
        assert!(matches!(err, Error::Io(_)));
        assert!(!err.is_format_error());
    }
}
