//! I/O utilities for persistence operations.

use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::Path;

use crate::error::TableError;

/// Classifies I/O errors into specific TableError variants.
pub fn classify_io_error(error: std::io::Error, context: &str) -> TableError {
    match error.kind() {
        ErrorKind::StorageFull | ErrorKind::OutOfMemory => {
            TableError::DiskFull(format!("{}: {}", context, error))
        }
        ErrorKind::WouldBlock | ErrorKind::TimedOut | ErrorKind::Interrupted => {
            TableError::TransientIoError(format!("{}: {}", context, error))
        }
        _ => TableError::IoError(format!("{}: {}", context, error)),
    }
}

/// Retries an operation that may fail with transient I/O errors.
pub fn retry_io_operation<F, T>(
    operation: F,
    max_retries: u32,
    retry_delay_ms: u64,
    context: &str,
) -> Result<T, TableError>
where
    F: Fn() -> Result<T, TableError>,
{
    let mut attempt = 0;
    loop {
        match operation() {
            Ok(result) => return Ok(result),
            Err(TableError::TransientIoError(msg)) if attempt < max_retries => {
                attempt += 1;
                tracing::warn!(
                    "Transient I/O error in {} (attempt {}/{}): {}",
                    context,
                    attempt,
                    max_retries,
                    msg
                );
                if retry_delay_ms > 0 {
                    std::thread::sleep(std::time::Duration::from_millis(retry_delay_ms));
                }
            }
            Err(err) => return Err(err),
        }
    }
}

/// Writes `bytes` to `path` through a temporary file, fsync, and atomic rename.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), TableError> {
    let mut temp_path = path.as_os_str().to_owned();
    temp_path.push(".tmp");

    let mut file = File::create(&temp_path)
        .map_err(|e| classify_io_error(e, "Failed to create temp file"))?;
    file.write_all(bytes)
        .map_err(|e| classify_io_error(e, "Failed to write temp file"))?;
    file.sync_all()
        .map_err(|e| classify_io_error(e, "Failed to sync temp file"))?;

    fs::rename(&temp_path, path).map_err(|e| classify_io_error(e, "Failed to rename temp file"))
}

/// Computes the CRC32 of `bytes`.
pub fn checksum(bytes: &[u8]) -> u32 {
    let mut hasher = crc32fast::Hasher::new();
    hasher.update(bytes);
    hasher.finalize()
}
