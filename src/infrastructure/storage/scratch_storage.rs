//! Scratch directory for proof files while a submission is in flight.
//!
//! Every file written here is owned by a [`TempUpload`] guard. Dropping the guard deletes the
//! file, so whichever way the request ends (relay success, relay failure, a validation error
//! after the file was stored, or the client hanging up) nothing is left behind.

use crate::{
    domain::submission::{entity::UploadedFile, value_objects::ProofMediaType},
    infrastructure::security::upload_policy::{UploadError, UploadPolicy},
};
use std::io;
use std::path::{Path, PathBuf};
use tokio::{
    fs::{File, OpenOptions},
    io::AsyncWriteExt,
};
use uuid::Uuid;

const MAX_STORED_NAME_BYTES: usize = 180;
const CREATE_ATTEMPTS: usize = 3;

pub struct ScratchStorage {
    dir: PathBuf,
}

impl ScratchStorage {
    /// Create the scratch directory if it does not exist yet.
    pub async fn init(dir: impl Into<PathBuf>) -> io::Result<Self> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir).await?;
        tracing::debug!(dir = %dir.display(), "Scratch directory ready");
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Open a new scratch file named `<unix-millis>-<original name>`.
    ///
    /// If that name is taken a short random suffix is added after the timestamp.
    pub async fn begin(
        &self,
        original_name: &str,
        media_type: ProofMediaType,
    ) -> io::Result<PendingUpload> {
        let safe_name = sanitize_file_name(original_name);
        let timestamp = chrono::Utc::now().timestamp_millis();

        let mut last_err = None;
        for attempt in 0..CREATE_ATTEMPTS {
            let stored_name = if attempt == 0 {
                format!("{}-{}", timestamp, safe_name)
            } else {
                let suffix = Uuid::now_v7().simple().to_string();
                format!("{}-{}-{}", timestamp, &suffix[suffix.len() - 8..], safe_name)
            };
            let path = self.dir.join(stored_name);

            match OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await
            {
                Ok(file) => {
                    tracing::debug!(path = %path.display(), "Scratch file created");
                    return Ok(PendingUpload {
                        file,
                        written: 0,
                        guard: TempUpload {
                            record: UploadedFile {
                                original_name: original_name.to_string(),
                                media_type,
                                size_bytes: 0,
                                path,
                            },
                        },
                    });
                }
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => last_err = Some(e),
                Err(e) => return Err(e),
            }
        }

        Err(last_err.unwrap_or_else(|| io::Error::other("could not allocate scratch file name")))
    }
}

/// A scratch file still receiving bytes.
///
/// Field order matters: the handle closes before the guard removes the path.
pub struct PendingUpload {
    file: File,
    written: u64,
    guard: TempUpload,
}

impl PendingUpload {
    pub fn path(&self) -> &Path {
        &self.guard.record.path
    }

    /// Append a chunk, refusing it if the file would outgrow the policy limit.
    pub async fn write_chunk(
        &mut self,
        chunk: &[u8],
        policy: &UploadPolicy,
    ) -> Result<(), UploadError> {
        let total = self.written + chunk.len() as u64;
        policy.check_size(total)?;
        self.file.write_all(chunk).await?;
        self.written = total;
        Ok(())
    }

    /// Flush and close the file, handing ownership to a [`TempUpload`].
    pub async fn finish(mut self) -> Result<TempUpload, UploadError> {
        self.file.flush().await?;
        let PendingUpload {
            file,
            written,
            mut guard,
        } = self;
        drop(file);
        guard.record.size_bytes = written;
        Ok(guard)
    }
}

/// A stored proof file. Deleted from disk when dropped.
#[derive(Debug)]
pub struct TempUpload {
    record: UploadedFile,
}

impl TempUpload {
    pub fn record(&self) -> &UploadedFile {
        &self.record
    }

    pub fn path(&self) -> &Path {
        &self.record.path
    }
}

impl Drop for TempUpload {
    // Blocking on purpose: the file must be gone before the response is sent.
    fn drop(&mut self) {
        match std::fs::remove_file(&self.record.path) {
            Ok(()) => tracing::debug!(path = %self.record.path.display(), "Scratch file removed"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(
                path = %self.record.path.display(),
                error = %e,
                "Failed to remove scratch file"
            ),
        }
    }
}

/// Reduce a client-supplied filename to a single safe path component.
fn sanitize_file_name(original: &str) -> String {
    let base = original
        .rsplit(|c: char| c == '/' || c == '\\')
        .next()
        .unwrap_or_default();
    let cleaned: String = base
        .chars()
        .map(|c| if c.is_control() { '_' } else { c })
        .collect();
    let cleaned = cleaned.trim();
    if cleaned.is_empty() || cleaned == "." || cleaned == ".." {
        return "upload".to_string();
    }

    let mut end = cleaned.len().min(MAX_STORED_NAME_BYTES);
    while !cleaned.is_char_boundary(end) {
        end -= 1;
    }
    cleaned[..end].to_string()
}
