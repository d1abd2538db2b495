//! MIME type detection based on file extensions.

use std::path::Path;

/// Result of a type lookup for a served file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MimeInfo {
    /// Value for `Content-Type`, e.g. `text/plain`
    pub content_type: Option<String>,
    /// Value for `Content-Encoding`, e.g. `gzip` for `notes.txt.gz`
    pub encoding: Option<String>,
}

const ENCODINGS: &[(&str, &str)] = &[
    ("gz", "gzip"),
    ("bz2", "bzip2"),
    ("xz", "xz"),
    ("br", "br"),
    ("Z", "compress"),
];

/// Guesses type and transfer encoding from a file name.
///
/// A compression suffix is peeled off first and reported as the encoding;
/// the type then comes from what remains (`a.tar.gz` is
/// `application/x-tar` + `gzip`). Returns `None` when neither is known.
pub fn lookup(path: &Path) -> Option<MimeInfo> {
    let mut encoding = None;
    let mut typed = path.to_path_buf();

    let ext = path.extension().and_then(|e| e.to_str());
    if let Some((_, enc)) = ENCODINGS.iter().find(|(suffix, _)| Some(*suffix) == ext) {
        encoding = Some((*enc).to_string());
        typed.set_extension("");
    }

    let content_type = mime_guess::from_path(&typed)
        .first()
        .map(|mime| mime.to_string());

    if content_type.is_none() && encoding.is_none() {
        return None;
    }

    Some(MimeInfo {
        content_type,
        encoding,
    })
}
