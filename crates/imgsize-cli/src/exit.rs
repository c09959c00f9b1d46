use imgsize_common::Error;
use imgsize_core::BatchStatus;

/// Process exit status, stable across releases
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exit {
    Success = 0,
    Usage = 1,
    FileNotFound = 2,
    InvalidFormat = 3,
    ProcessingError = 4,
    PartialSuccess = 5,
}

impl Exit {
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Classify a failure by the library error it carries, if any
    pub fn for_error(err: &anyhow::Error) -> Self {
        match err.downcast_ref::<Error>() {
            Some(Error::FileNotFound(_) | Error::InvalidPath(_)) => Self::FileNotFound,
            Some(e) if e.is_format_error() => Self::InvalidFormat,
            _ => Self::ProcessingError,
        }
    }

    pub fn for_batch(status: BatchStatus) -> Self {
        match status {
            BatchStatus::Complete => Self::Success,
            BatchStatus::Partial => Self::PartialSuccess,
            BatchStatus::Failed => Self::ProcessingError,
        }
    }
}

impl From<Exit> for std::process::ExitCode {
    fn from(exit: Exit) -> Self {
        Self::from(exit.code())
    }
}
