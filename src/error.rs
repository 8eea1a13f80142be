//! Error types for external commands and directory scans

use std::path::PathBuf;
use thiserror::Error;

/// Failure of a single external command
#[derive(Debug, Error)]
pub enum RunError {
    #[error("command '{program}' not found, is it installed and in your PATH?")]
    NotFound { program: String },

    #[error("'{command}' exited with {}", describe_code(.code))]
    Failed {
        command: String,
        code: Option<i32>,
        stdout: String,
        stderr: String,
    },

    #[error("failed to run '{command}': {source}")]
    Io {
        command: String,
        #[source]
        source: std::io::Error,
    },
}

fn describe_code(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {}", code),
        None => "no exit code (terminated by signal)".to_string(),
    }
}

/// Failure while reading the sites directories
#[derive(Debug, Error)]
pub enum InventoryError {
    #[error("sites directory not found: {}", .0.display())]
    MissingDirectory(PathBuf),

    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
