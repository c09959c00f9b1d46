pub mod analyzer;
pub mod batch;
pub mod pixel_model;

pub use analyzer::Analyzer;
pub use batch::{BatchProcessor, BatchReport, BatchStatus, BatchSummary, ProcessError};
pub use pixel_model::{bytes_per_pixel, decoded_size};
