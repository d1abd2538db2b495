//! Restartable response bodies.
//!
//! A [`Body`] describes what to send; [`Body::chunks`] opens a fresh
//! [`BodyChunks`] cursor over it. Counting and transmitting are two
//! independent walks over the same source, so a body can be measured for
//! `Content-Length` without buffering it.

use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use bytes::Bytes;
use html_escape::encode_text;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_encode};

/// Default read size for file bodies.
pub const DEFAULT_CHUNK_SIZE: usize = 1024;

/// Bytes left unescaped in listing links: unreserved characters plus `/`.
const LINK_ESCAPE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~')
    .remove(b'/');

const LISTING_FOOTER: &[u8] = b"</ul>\n</body>\n</html>\n";

#[derive(Debug, Clone)]
pub enum Body {
    /// Fully materialized bytes (error pages).
    Bytes(Bytes),
    /// HTML index of a directory snapshot.
    Listing(Arc<DirectoryListing>),
    /// A regular file streamed from offset 0.
    File(FileBody),
}

#[derive(Debug, Clone)]
pub struct FileBody {
    path: PathBuf,
    len: u64,
    chunk_size: usize,
}

/// One direct child of a listed directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingEntry {
    /// Display name (lossy UTF-8)
    pub name: String,
    /// Percent-encoded link target, with a trailing `/` for directories
    pub href: String,
}

/// Point-in-time snapshot of a directory's direct children.
///
/// Entries are sorted by file name so that every replay of the listing,
/// and every request against an unchanged directory, yields the same bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryListing {
    title: String,
    entries: Vec<ListingEntry>,
}

/// Cursor over one pass of a body.
pub enum BodyChunks {
    Once(Option<Bytes>),
    Listing {
        listing: Arc<DirectoryListing>,
        // 0 = header, 1..=len = entries, len+1 = footer
        next: usize,
    },
    File {
        file: File,
        remaining: u64,
        chunk_size: usize,
    },
}

impl Body {
    /// Exact number of bytes a full pass over this body produces.
    pub fn content_length(&self) -> u64 {
        match self {
            Body::Bytes(bytes) => bytes.len() as u64,
            Body::Listing(listing) => listing.content_length(),
            Body::File(file) => file.len,
        }
    }

    /// Opens a new pass over the body, starting from the first byte.
    pub fn chunks(&self) -> io::Result<BodyChunks> {
        Ok(match self {
            Body::Bytes(bytes) => BodyChunks::Once(Some(bytes.clone())),
            Body::Listing(listing) => BodyChunks::Listing {
                listing: Arc::clone(listing),
                next: 0,
            },
            Body::File(body) => BodyChunks::File {
                file: File::open(&body.path)?,
                remaining: body.len,
                chunk_size: body.chunk_size.max(1),
            },
        })
    }
}

impl From<Bytes> for Body {
    fn from(bytes: Bytes) -> Self {
        Body::Bytes(bytes)
    }
}

impl From<DirectoryListing> for Body {
    fn from(listing: DirectoryListing) -> Self {
        Body::Listing(Arc::new(listing))
    }
}

impl From<FileBody> for Body {
    fn from(file: FileBody) -> Self {
        Body::File(file)
    }
}

impl FileBody {
    /// `len` is the size recorded when the response headers were built.
    pub fn new(path: impl Into<PathBuf>, len: u64, chunk_size: usize) -> Self {
        Self {
            path: path.into(),
            len,
            chunk_size,
        }
    }
}

impl DirectoryListing {
    /// Reads the direct children of `dir`. No recursion.
    pub fn read(dir: &Path) -> io::Result<Self> {
        let title = dir
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "/".to_string());

        let mut entries = Vec::new();
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            let name = entry.file_name();
            // file_type() does not follow symlinks; a link to a directory
            // should still be listed as one.
            let is_dir = fs::metadata(entry.path())
                .map(|m| m.is_dir())
                .unwrap_or(false);

            let mut href = percent_encode(name.as_encoded_bytes(), LINK_ESCAPE).to_string();
            if is_dir {
                href.push('/');
            }

            entries.push(ListingEntry {
                name: name.to_string_lossy().into_owned(),
                href,
            });
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));

        Ok(Self { title, entries })
    }

    fn content_length(&self) -> u64 {
        let entries: usize = self.entries.iter().map(|e| entry_chunk(e).len()).sum();
        (header_chunk(&self.title).len() + entries + LISTING_FOOTER.len()) as u64
    }

    fn chunk(&self, index: usize) -> Option<Bytes> {
        match index {
            0 => Some(header_chunk(&self.title)),
            i if i <= self.entries.len() => Some(entry_chunk(&self.entries[i - 1])),
            i if i == self.entries.len() + 1 => Some(Bytes::from_static(LISTING_FOOTER)),
            _ => None,
        }
    }
}

fn header_chunk(title: &str) -> Bytes {
    Bytes::from(format!(
        "<html>\n<body>\n<h1>Directory Listing for {}</h1>\n<ul>\n",
        encode_text(title)
    ))
}

fn entry_chunk(entry: &ListingEntry) -> Bytes {
    Bytes::from(format!(
        "<li><a href=\"{}\">{}</a></li>\n",
        entry.href,
        encode_text(&entry.name)
    ))
}

impl BodyChunks {
    /// Produces the next chunk, or `None` once the body is exhausted.
    ///
    /// A file that shrank since its length was recorded yields
    /// `UnexpectedEof`; one that grew is cut at the recorded length.
    pub fn next_chunk(&mut self) -> io::Result<Option<Bytes>> {
        match self {
            BodyChunks::Once(bytes) => Ok(bytes.take()),
            BodyChunks::Listing { listing, next } => {
                let chunk = listing.chunk(*next);
                if chunk.is_some() {
                    *next += 1;
                }
                Ok(chunk)
            }
            BodyChunks::File {
                file,
                remaining,
                chunk_size,
            } => {
                if *remaining == 0 {
                    return Ok(None);
                }
                let want = (*chunk_size as u64).min(*remaining) as usize;
                let mut buf = vec![0u8; want];
                let n = loop {
                    match file.read(&mut buf) {
                        Ok(n) => break n,
                        Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                        Err(e) => return Err(e),
                    }
                };
                if n == 0 {
                    return Err(io::Error::new(
                        io::ErrorKind::UnexpectedEof,
                        format!("file ended {remaining} bytes short of its Content-Length"),
                    ));
                }
                buf.truncate(n);
                *remaining -= n as u64;
                Ok(Some(Bytes::from(buf)))
            }
        }
    }
}

impl Iterator for BodyChunks {
    type Item = io::Result<Bytes>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_chunk().transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listing(entries: &[(&str, bool)]) -> DirectoryListing {
        DirectoryListing {
            title: "docs".to_string(),
            entries: entries
                .iter()
                .map(|(name, is_dir)| {
                    let mut href = percent_encode(name.as_bytes(), LINK_ESCAPE).to_string();
                    if *is_dir {
                        href.push('/');
                    }
                    ListingEntry {
                        name: name.to_string(),
                        href,
                    }
                })
                .collect(),
        }
    }

    #[test]
    fn listing_length_matches_chunks() {
        let body = Body::from(listing(&[("a b.txt", false), ("sub", true), ("<b>.txt", false)]));
        let total: usize = body.chunks().unwrap().map(|c| c.unwrap().len()).sum();
        assert_eq!(total as u64, body.content_length());
    }

    #[test]
    fn listing_yields_one_chunk_per_entry_plus_frame() {
        let body = Body::from(listing(&[("x", false), ("y", false)]));
        assert_eq!(body.chunks().unwrap().count(), 4);
    }

    #[test]
    fn link_escape_keeps_unreserved() {
        let encoded = percent_encode(b"a-b_c.d~e f", LINK_ESCAPE).to_string();
        assert_eq!(encoded, "a-b_c.d~e%20f");
    }

    #[test]
    fn once_body_yields_single_chunk() {
        let mut chunks = Body::from(Bytes::from_static(b"hi")).chunks().unwrap();
        assert_eq!(chunks.next_chunk().unwrap(), Some(Bytes::from_static(b"hi")));
        assert_eq!(chunks.next_chunk().unwrap(), None);
    }
}
