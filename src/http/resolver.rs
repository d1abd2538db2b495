//! Maps request targets onto the filesystem under a fixed root.

use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use crate::config::TraversalPolicy;
use crate::http::error::HttpError;

/// An existing path inside the root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTarget {
    pub path: PathBuf,
    pub is_directory: bool,
}

#[derive(Debug, Clone)]
pub struct PathResolver {
    root: PathBuf,
    policy: TraversalPolicy,
}

impl PathResolver {
    /// Canonicalizes `root`; fails if it does not exist.
    pub fn new(root: impl AsRef<Path>, policy: TraversalPolicy) -> io::Result<Self> {
        Ok(Self {
            root: fs::canonicalize(root)?,
            policy,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolves a decoded target (leading `/` already stripped).
    ///
    /// `.`/`..` and symlinks are resolved before the containment check, so
    /// a link pointing out of the root counts as an escape even when the
    /// rest of the path does not exist. Escapes follow the configured
    /// [`TraversalPolicy`]. The filesystem is consulted on every call;
    /// nothing is cached.
    pub fn resolve(&self, requested: &str) -> Result<ResolvedTarget, HttpError> {
        let path = self.walk(requested)?;
        if !self.contains(&path) {
            return self.escaped(requested);
        }

        let metadata = fs::metadata(&path).map_err(|e| {
            if is_missing(&e) {
                HttpError::NotFound(requested.to_string())
            } else {
                HttpError::Io(e)
            }
        })?;

        Ok(ResolvedTarget {
            path,
            is_directory: metadata.is_dir(),
        })
    }

    /// Walks `requested` one component at a time from the root.
    ///
    /// Existing symlinks are followed as they are met, so `..` after a link
    /// pops from the link's target. Components that do not exist are kept
    /// as written; a later `..` may step back onto real entries.
    fn walk(&self, requested: &str) -> io::Result<PathBuf> {
        let mut resolved = self.root.clone();

        for component in Path::new(requested).components() {
            match component {
                Component::CurDir => {}
                Component::ParentDir => {
                    resolved.pop();
                }
                Component::Prefix(_) => resolved = PathBuf::from(component.as_os_str()),
                Component::RootDir => resolved.push(component),
                Component::Normal(name) => {
                    let candidate = resolved.join(name);
                    resolved = match fs::symlink_metadata(&candidate) {
                        Ok(meta) if meta.file_type().is_symlink() => {
                            match fs::canonicalize(&candidate) {
                                Ok(canonical) => canonical,
                                // Dangling link: judge it by where it points.
                                Err(e) if is_missing(&e) => {
                                    normalize(&resolved.join(fs::read_link(&candidate)?))
                                }
                                Err(e) => return Err(e),
                            }
                        }
                        Ok(_) => candidate,
                        Err(e) if is_missing(&e) => candidate,
                        Err(e) => return Err(e),
                    };
                }
            }
        }

        Ok(resolved)
    }

    fn contains(&self, path: &Path) -> bool {
        path.starts_with(&self.root)
    }

    fn escaped(&self, requested: &str) -> Result<ResolvedTarget, HttpError> {
        match self.policy {
            TraversalPolicy::ServeRoot => {
                tracing::debug!(target_path = %requested, "Target escapes root, serving root");
                Ok(ResolvedTarget {
                    path: self.root.clone(),
                    is_directory: true,
                })
            }
            TraversalPolicy::Reject => Err(HttpError::Forbidden(requested.to_string())),
        }
    }
}

fn is_missing(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::NotFound | io::ErrorKind::NotADirectory
    )
}

/// Lexical `.`/`..` resolution for link targets that do not exist.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other),
        }
    }
    out
}
