//! Source resolution: classify a user-supplied document reference.
//!
//! A conversion input arrives as one string and leaves as exactly one of the
//! three wire shapes the service accepts:
//!
//! * `{"kind": "http", "url": …}` — the server fetches the document itself.
//! * `{"kind": "file", "base64_string": …, "filename": …}` — the document
//!   exists on *this* machine; its bytes travel inline with the submission.
//! * `{"kind": "file", "path": …}` — a path that only means something inside
//!   the server's own filesystem (e.g. a mounted input volume). The client
//!   cannot verify it, so it is passed through verbatim.
//!
//! A path that does not exist locally is not an error for the lenient
//! resolver: it is assumed to be a server-side path, with an advisory log
//! line in case the user simply mistyped a local filename.

use crate::error::ClientError;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, warn};

/// Where the document bytes originate, in the service's wire encoding.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum SourceSpec {
    /// A URL the server downloads itself.
    Http { url: String },
    /// A file, either uploaded inline or addressed on the server's filesystem.
    File(FileSource),
}

/// The two `kind: "file"` payload shapes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum FileSource {
    /// Local file contents, base64-encoded for inline upload.
    Upload {
        base64_string: String,
        filename: String,
    },
    /// A path resolved inside the server's execution environment.
    Path { path: String },
}

impl SourceSpec {
    /// An HTTP(S) source the server fetches itself.
    pub fn http(url: impl Into<String>) -> Self {
        SourceSpec::Http { url: url.into() }
    }

    /// A path meaningful only on the server side, passed through verbatim.
    pub fn remote_path(path: impl Into<String>) -> Self {
        SourceSpec::File(FileSource::Path { path: path.into() })
    }

    /// An inline upload from already-encoded contents.
    pub fn upload(base64_string: impl Into<String>, filename: impl Into<String>) -> Self {
        SourceSpec::File(FileSource::Upload {
            base64_string: base64_string.into(),
            filename: filename.into(),
        })
    }

    /// Short label for logs: the URL, filename, or remote path.
    pub fn describe(&self) -> &str {
        match self {
            SourceSpec::Http { url } => url,
            SourceSpec::File(FileSource::Upload { filename, .. }) => filename,
            SourceSpec::File(FileSource::Path { path }) => path,
        }
    }
}

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Classify `input` into a [`SourceSpec`], never failing on a missing path.
///
/// URLs become [`SourceSpec::Http`]. An existing local regular file is read in
/// full and becomes an inline upload; the file handle is released as soon as
/// the read returns. Anything else is passed through as a server-side path
/// with an advisory warning.
///
/// # Errors
/// Only for a local file that exists but cannot be read ([`ClientError::FileRead`]).
pub fn resolve_source(input: &str) -> Result<SourceSpec, ClientError> {
    if is_url(input) {
        return Ok(SourceSpec::http(input));
    }

    let path = Path::new(input);
    if path.is_file() {
        return read_upload(path);
    }

    warn!(
        "'{input}' does not exist locally; submitting it as a path inside the \
         server's environment"
    );
    Ok(SourceSpec::remote_path(input))
}

/// Read a local file into an inline-upload [`SourceSpec`].
///
/// Unlike [`resolve_source`] this requires the file to exist: a missing path
/// is [`ClientError::LocalFileNotFound`].
pub fn read_upload(path: &Path) -> Result<SourceSpec, ClientError> {
    if !path.is_file() {
        return Err(ClientError::LocalFileNotFound {
            path: path.to_path_buf(),
        });
    }

    // std::fs::read opens, reads, and closes before returning on every path.
    let bytes = std::fs::read(path).map_err(|source| ClientError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;

    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned());

    debug!(
        "read {} bytes from '{}' for inline upload",
        bytes.len(),
        path.display()
    );

    Ok(SourceSpec::upload(STANDARD.encode(&bytes), filename))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;

    #[test]
    fn test_is_url() {
        assert!(is_url("https://example.com/doc.pdf"));
        assert!(is_url("http://example.com/doc.pdf"));
        assert!(!is_url("/tmp/doc.pdf"));
        assert!(!is_url("doc.pdf"));
        assert!(!is_url(""));
    }

    #[test]
    fn url_input_resolves_to_http_source() {
        let spec = resolve_source("https://arxiv.org/pdf/2501.17887").unwrap();
        assert_eq!(
            serde_json::to_value(&spec).unwrap(),
            json!({"kind": "http", "url": "https://arxiv.org/pdf/2501.17887"})
        );
    }

    #[test]
    fn existing_file_resolves_to_inline_upload() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        tmp.write_all(b"%PDF-1.4 fake").unwrap();

        let spec = resolve_source(tmp.path().to_str().unwrap()).unwrap();
        match &spec {
            SourceSpec::File(FileSource::Upload {
                base64_string,
                filename,
            }) => {
                assert_eq!(
                    STANDARD.decode(base64_string).unwrap(),
                    b"%PDF-1.4 fake"
                );
                assert_eq!(
                    filename,
                    &tmp.path().file_name().unwrap().to_string_lossy()
                );
            }
            other => panic!("expected inline upload, got {other:?}"),
        }

        let v = serde_json::to_value(&spec).unwrap();
        assert_eq!(v["kind"], json!("file"));
        assert!(v.get("base64_string").is_some());
        assert!(v.get("path").is_none());
    }

    #[test]
    fn missing_path_passes_through_verbatim() {
        let spec = resolve_source("/app/input/your_file.pdf").unwrap();
        assert_eq!(
            serde_json::to_value(&spec).unwrap(),
            json!({"kind": "file", "path": "/app/input/your_file.pdf"})
        );
    }

    #[test]
    fn read_upload_is_strict_about_missing_files() {
        let err = read_upload(Path::new("/definitely/not/here.pdf")).unwrap_err();
        assert_eq!(err.kind(), "local-file-not-found");
    }

    #[test]
    fn directory_is_not_treated_as_local_file() {
        let dir = tempfile::tempdir().unwrap();
        let spec = resolve_source(dir.path().to_str().unwrap()).unwrap();
        assert!(matches!(spec, SourceSpec::File(FileSource::Path { .. })));
    }
}
