pub mod error;
pub mod format;
pub mod path;

pub use error::{Error, Result};
pub use format::MediaFormat;
pub use path::{has_supported_extension, validate_input, SUPPORTED_EXTENSIONS};
