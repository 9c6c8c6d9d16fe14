//! Source preparation: shrink raw PDFs with Ghostscript before editing.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;

use thiserror::Error;
use tracing::info;

use super::config::AppConfig;
use crate::constants::COMPRESSED_PREFIX;
use crate::utils::{hyphenate_whitespace, sha256_hex};

#[derive(Error, Debug)]
pub enum CompressError {
    #[error("missing subject (code) or pdf (filename)")]
    MissingArguments,

    #[error("input PDF not found at {0}")]
    InputNotFound(PathBuf),

    #[error("failed to run ghostscript: {0}")]
    Spawn(#[source] io::Error),

    #[error("ghostscript exited with {status}: {stderr}")]
    Ghostscript { status: String, stderr: String },

    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompressedPdf {
    pub path: PathBuf,
    pub checksum: String,
}

/// Output file name for a compressed copy of `pdf`.
pub fn compressed_name(pdf: &str) -> String {
    format!("{}{}", COMPRESSED_PREFIX, hyphenate_whitespace(pdf))
}

/// Ghostscript arguments: PDF 1.4, 150 dpi color and gray, 300 dpi mono.
fn ghostscript_args(input: &Path, output: &Path) -> Vec<String> {
    vec![
        "-sDEVICE=pdfwrite".to_string(),
        "-dCompatibilityLevel=1.4".to_string(),
        "-dNOPAUSE".to_string(),
        "-dBATCH".to_string(),
        "-dSAFER".to_string(),
        "-dDownsampleColorImages=true".to_string(),
        "-dColorImageResolution=150".to_string(),
        "-dDownsampleGrayImages=true".to_string(),
        "-dGrayImageResolution=150".to_string(),
        "-dDownsampleMonoImages=true".to_string(),
        "-dMonoImageResolution=300".to_string(),
        format!("-sOutputFile={}", output.display()),
        input.display().to_string(),
    ]
}

/// Compress `input_root/<subject>/<pdf>` into the subject's output folder.
pub fn compress_pdf(
    config: &AppConfig,
    subject: &str,
    pdf: &str,
) -> Result<CompressedPdf, CompressError> {
    if subject.trim().is_empty() || pdf.trim().is_empty() {
        return Err(CompressError::MissingArguments);
    }

    let input = config.subject_input_dir(subject).join(pdf);
    if !input.is_file() {
        return Err(CompressError::InputNotFound(input));
    }

    let output_dir = config.subject_output_dir(subject);
    fs::create_dir_all(&output_dir).map_err(|source| CompressError::Io {
        path: output_dir.clone(),
        source,
    })?;
    let output = output_dir.join(compressed_name(pdf));

    let result = Command::new("gs")
        .args(ghostscript_args(&input, &output))
        .output()
        .map_err(CompressError::Spawn)?;
    if !result.status.success() {
        return Err(CompressError::Ghostscript {
            status: result.status.to_string(),
            stderr: String::from_utf8_lossy(&result.stderr).trim().to_string(),
        });
    }

    let bytes = fs::read(&output).map_err(|source| CompressError::Io {
        path: output.clone(),
        source,
    })?;
    let checksum = sha256_hex(&bytes);
    info!(input = %input.display(), output = %output.display(), %checksum, "compressed PDF");
    Ok(CompressedPdf {
        path: output,
        checksum,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compressed_name() {
        assert_eq!(compressed_name("Unit 1  Notes.pdf"), "compressed-Unit-1-Notes.pdf");
        assert_eq!(compressed_name("book.pdf"), "compressed-book.pdf");
    }

    #[test]
    fn test_ghostscript_args_end_with_io_paths() {
        let args = ghostscript_args(Path::new("in.pdf"), Path::new("out.pdf"));
        assert_eq!(args[0], "-sDEVICE=pdfwrite");
        assert_eq!(args[args.len() - 2], "-sOutputFile=out.pdf");
        assert_eq!(args[args.len() - 1], "in.pdf");
    }

    #[test]
    fn test_missing_input() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig {
            input_root: dir.path().join("input"),
            output_root: dir.path().join("output"),
            ..AppConfig::default()
        };
        assert!(matches!(
            compress_pdf(&config, "CS101", "book.pdf"),
            Err(CompressError::InputNotFound(_))
        ));
        assert!(matches!(
            compress_pdf(&config, "", "book.pdf"),
            Err(CompressError::MissingArguments)
        ));
    }
}
