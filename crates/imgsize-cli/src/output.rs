use console::style;
use imgsize_core::BatchReport;
use imgsize_formats::ImageMetadata;
use serde::Serialize;
use std::fmt::Write;

/// Output formatter with colored messages
pub struct OutputFormatter {
    colored: bool,
}

impl OutputFormatter {
    pub fn new(colored: bool) -> Self {
        Self { colored }
    }

    /// Print success message
    pub fn success(&self, message: &str) {
        if self.colored {
            println!("{} {}", style("✓").green().bold(), message);
        } else {
            println!("[SUCCESS] {}", message);
        }
    }

    /// Print error message
    pub fn error(&self, message: &str) {
        if self.colored {
            eprintln!("{} {}", style("✗").red().bold(), message);
        } else {
            eprintln!("[ERROR] {}", message);
        }
    }

    /// Print info message
    pub fn info(&self, message: &str) {
        if self.colored {
            eprintln!("{} {}", style("ℹ").cyan(), message);
        } else {
            eprintln!("[INFO] {}", message);
        }
    }

    /// Format a byte count with its MB equivalent
    pub fn format_size(&self, bytes: u64) -> String {
        let size_str = format!("{} bytes ({:.2} MB)", bytes, bytes as f64 / (1024.0 * 1024.0));

        if self.colored {
            style(size_str).yellow().to_string()
        } else {
            size_str
        }
    }

    /// Format compression ratio
    pub fn format_ratio(&self, ratio: f64) -> String {
        let ratio_str = format!("{:.1}x", ratio);

        if self.colored {
            if ratio > 10.0 {
                style(ratio_str).green().bold().to_string()
            } else if ratio > 5.0 {
                style(ratio_str).green().to_string()
            } else {
                style(ratio_str).yellow().to_string()
            }
        } else {
            ratio_str
        }
    }

    fn heading(&self, text: &str) -> String {
        if self.colored {
            style(text).bold().to_string()
        } else {
            text.to_string()
        }
    }

    /// Full report for a single image
    pub fn render_metadata(&self, meta: &ImageMetadata) -> String {
        let icc = match meta.icc_profile_size {
            Some(size) => format!("Present ({} bytes)", size),
            None => "Not detected".to_string(),
        };

        let mut out = String::new();
        let rows = [
            ("Format", meta.format.to_string()),
            ("Dimensions", format!("{}x{}", meta.width, meta.height)),
            ("Color Model", meta.color_model.to_string()),
            ("ICC Profile", icc),
            ("Color Space", meta.color_space.to_string()),
            ("Bit Depth", meta.bit_depth.to_string()),
            ("Alpha Channel", meta.has_alpha.to_string()),
            ("Chroma Subsampling", meta.chroma_subsampling.to_string()),
            ("HDR Support", meta.hdr_type.to_string()),
            ("Compression Type", meta.compression_type.to_string()),
            ("Original file size", self.format_size(meta.original_size)),
            ("Estimated decoded size", self.format_size(meta.decoded_size)),
            ("Compression ratio", self.format_ratio(meta.compression_ratio)),
        ];
        for (label, value) in rows {
            let _ = writeln!(out, "{}: {}", self.heading(label), value);
        }
        out
    }

    /// Summary, errors and a short line per image
    pub fn render_batch(&self, report: &BatchReport) -> String {
        let summary = &report.summary;
        let mut out = String::new();

        let _ = writeln!(out, "{}", self.heading("=== Batch Processing Summary ==="));
        let _ = writeln!(out, "Total files: {}", summary.total_files);
        let _ = writeln!(out, "Successful: {}", summary.successful_files);
        let _ = writeln!(out, "Failed: {}", summary.failed_files);
        let _ = writeln!(out, "Total original size: {:.2} MB", summary.total_original_size_mb);
        let _ = writeln!(out, "Total decoded size: {:.2} MB", summary.total_decoded_size_mb);
        let _ = writeln!(
            out,
            "Average compression ratio: {}",
            self.format_ratio(summary.average_compression_ratio)
        );

        if !report.errors.is_empty() {
            let _ = writeln!(out, "\n{}", self.heading("=== Errors ==="));
            for e in &report.errors {
                let _ = writeln!(out, "  {}: {}", e.filename, e.error);
            }
        }

        if !report.images.is_empty() {
            let _ = writeln!(out, "\n{}", self.heading("=== Processed Images ==="));
            for img in &report.images {
                let _ = writeln!(out, "\nFile: {}", img.filename.as_deref().unwrap_or("-"));
                let _ = writeln!(
                    out,
                    "  Format: {} | Dimensions: {}x{}",
                    img.format, img.width, img.height
                );
                let _ = writeln!(
                    out,
                    "  Color Model: {} | Color Space: {} | Bit Depth: {}",
                    img.color_model, img.color_space, img.bit_depth
                );
                let _ = writeln!(
                    out,
                    "  Original: {:.2} MB | Decoded: {:.2} MB | Ratio: {}",
                    img.original_size_mb(),
                    img.decoded_size_mb(),
                    self.format_ratio(img.compression_ratio)
                );
            }
        }
        out
    }

    pub fn print_metadata(&self, meta: &ImageMetadata) {
        print!("{}", self.render_metadata(meta));
    }

    pub fn print_batch(&self, report: &BatchReport) {
        print!("{}", self.render_batch(report));
    }

    /// Pretty JSON on stdout
    pub fn print_json<T: Serialize>(value: &T) -> serde_json::Result<()> {
        println!("{}", serde_json::to_string_pretty(value)?);
        Ok(())
    }
}

impl Default for OutputFormatter {
    fn default() -> Self {
        Self::new(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use imgsize_common::MediaFormat;
    use imgsize_core::{BatchSummary, ProcessError};
    use imgsize_formats::{
        ChromaSubsampling, ColorModel, ColorSpace, CompressionType, HdrKind,
    };

    fn sample() -> ImageMetadata {
        ImageMetadata {
            format: MediaFormat::Jpeg,
            width: 4000,
            height: 3000,
            color_model: ColorModel::YCbCr,
            color_space: ColorSpace::DisplayP3,
            bit_depth: 8,
            has_alpha: false,
            has_icc_profile: true,
            icc_profile_size: Some(548),
            hdr_type: HdrKind::None,
            chroma_subsampling: ChromaSubsampling::Yuv420,
            compression_type: CompressionType::Lossy,
            original_size: 2_400_000,
            decoded_size: 36_000_000,
            compression_ratio: 15.0,
            filename: Some("photo.jpg".into()),
        }
    }

    #[test]
    fn test_render_metadata_plain() {
        let text = OutputFormatter::new(false).render_metadata(&sample());

        assert!(text.contains("Format: jpeg\n"));
        assert!(text.contains("Dimensions: 4000x3000\n"));
        assert!(text.contains("ICC Profile: Present (548 bytes)\n"));
        assert!(text.contains("Color Space: Display P3\n"));
        assert!(text.contains("Chroma Subsampling: 4:2:0\n"));
        assert!(text.contains("Estimated decoded size: 36000000 bytes (34.33 MB)\n"));
        assert!(text.ends_with("Compression ratio: 15.0x\n"));
    }

    #[test]
    fn test_render_batch_with_errors() {
        let report = BatchReport {
            images: vec![sample()],
            summary: BatchSummary {
                total_files: 2,
                successful_files: 1,
                failed_files: 1,
                total_original_size: 2_400_000,
                total_decoded_size: 36_000_000,
                average_compression_ratio: 15.0,
                total_original_size_mb: 2.29,
                total_decoded_size_mb: 34.33,
            },
            errors: vec![ProcessError {
                filename: "broken.png".into(),
                error: "Unsupported or invalid image format: bad".into(),
            }],
        };

        let text = OutputFormatter::new(false).render_batch(&report);
        assert!(text.contains("Failed: 1\n"));
        assert!(text.contains("=== Errors ===\n  broken.png: Unsupported"));
        assert!(text.contains("File: photo.jpg\n"));
        assert!(text.contains("Ratio: 15.0x\n"));
    }
}
