use std::path::Path;
use url::Url;

use crate::conversation::UploadedFile;
use crate::error::{ClientError, Result};

const DEFAULT_MIME: &str = "application/octet-stream";

/// Best-effort MIME type from the file extension.
pub fn guess_mime(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    match ext.as_deref() {
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("svg") => "image/svg+xml",
        Some("pdf") => "application/pdf",
        Some("json") => "application/json",
        Some("zip") => "application/zip",
        Some("txt" | "log") => "text/plain",
        Some("md") => "text/markdown",
        Some("csv") => "text/csv",
        Some("html" | "htm") => "text/html",
        Some("css") => "text/css",
        Some("js") => "text/javascript",
        Some("mp3") => "audio/mpeg",
        Some("wav") => "audio/wav",
        Some("mp4") => "video/mp4",
        Some("doc") => "application/msword",
        Some("docx") => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        _ => DEFAULT_MIME,
    }
}

/// Builds a preview descriptor for an existing local file. Nothing is uploaded.
pub fn describe(path: &Path) -> Result<UploadedFile> {
    let absolute = std::fs::canonicalize(path)?;
    if !absolute.is_file() {
        return Err(ClientError::Validation(format!(
            "{} is not a file",
            path.display()
        )));
    }

    let url = Url::from_file_path(&absolute).map_err(|_| {
        ClientError::Validation(format!("cannot address {}", absolute.display()))
    })?;
    let name = absolute
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| absolute.display().to_string());

    Ok(UploadedFile {
        name,
        url: url.to_string(),
        mime_type: guess_mime(&absolute).to_string(),
    })
}

/// Files queued for the next message. Sending takes them all.
#[derive(Debug, Default)]
pub struct PendingFiles {
    files: Vec<UploadedFile>,
}

impl PendingFiles {
    pub fn attach(&mut self, path: &Path) -> Result<&UploadedFile> {
        let file = describe(path)?;
        tracing::debug!("Queued attachment {} ({})", file.name, file.mime_type);
        self.files.push(file);
        Ok(&self.files[self.files.len() - 1])
    }

    /// Removes by 1-based position.
    pub fn detach(&mut self, position: usize) -> Option<UploadedFile> {
        if position == 0 || position > self.files.len() {
            return None;
        }
        Some(self.files.remove(position - 1))
    }

    pub fn take(&mut self) -> Vec<UploadedFile> {
        std::mem::take(&mut self.files)
    }

    pub fn list(&self) -> &[UploadedFile] {
        &self.files
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    #[test]
    fn mime_from_extension() {
        assert_eq!(guess_mime(&PathBuf::from("a/photo.JPG")), "image/jpeg");
        assert_eq!(guess_mime(&PathBuf::from("notes.txt")), "text/plain");
        assert_eq!(guess_mime(&PathBuf::from("report.pdf")), "application/pdf");
        assert_eq!(guess_mime(&PathBuf::from("binary")), DEFAULT_MIME);
        assert_eq!(guess_mime(&PathBuf::from("archive.xyz")), DEFAULT_MIME);
    }

    #[test]
    fn describes_local_files_with_file_urls() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("diagram.png");
        std::fs::write(&path, b"not really a png").unwrap();

        let file = describe(&path).unwrap();
        assert_eq!(file.name, "diagram.png");
        assert_eq!(file.mime_type, "image/png");
        assert!(file.url.starts_with("file://"));
        assert!(file.url.ends_with("/diagram.png"));
    }

    #[test]
    fn missing_files_and_directories_are_rejected() {
        let dir = TempDir::new().unwrap();
        assert!(describe(&dir.path().join("nope.txt")).is_err());
        assert!(matches!(describe(dir.path()), Err(ClientError::Validation(_))));
    }

    #[test]
    fn pending_queue_attach_detach_take() {
        let dir = TempDir::new().unwrap();
        let a = dir.path().join("a.txt");
        let b = dir.path().join("b.csv");
        std::fs::write(&a, "a").unwrap();
        std::fs::write(&b, "b").unwrap();

        let mut pending = PendingFiles::default();
        pending.attach(&a).unwrap();
        pending.attach(&b).unwrap();
        assert_eq!(pending.list().len(), 2);

        assert!(pending.detach(0).is_none());
        assert!(pending.detach(3).is_none());
        assert_eq!(pending.detach(1).unwrap().name, "a.txt");

        let taken = pending.take();
        assert_eq!(taken.len(), 1);
        assert_eq!(taken[0].mime_type, "text/csv");
        assert!(pending.is_empty());
    }
}
