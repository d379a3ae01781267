//! Loading partial sources from a directory of `.hbs` files.

use crate::error::{HeraldError, Result};
use indexmap::IndexMap;
use std::fs;
use std::path::{Path, PathBuf};

const EXTENSION: &str = "hbs";

/// Reads partials named `a/b` from `<root>/a/b.hbs`.
#[derive(Debug, Clone)]
pub struct PartialLoader {
    root: PathBuf,
}

impl PartialLoader {
    /// Create a loader over `root`, which must exist.
    pub fn new(root: impl AsRef<Path>) -> Result<Self> {
        let root = root
            .as_ref()
            .canonicalize()
            .map_err(|e| HeraldError::PartialLoad {
                message: format!("Invalid partial root: {e}"),
            })?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Read the source of one partial.
    pub fn load(&self, name: &str) -> Result<String> {
        validate_partial_name(name)?;

        let path = self.partial_path(name);
        self.ensure_within_root(&path)?;

        if !path.is_file() {
            return Err(HeraldError::PartialLoad {
                message: format!("Partial file not found: {} ({})", name, path.display()),
            });
        }

        tracing::trace!(partial = name, path = %path.display(), "loading partial");
        Ok(fs::read_to_string(&path)?)
    }

    /// Read every `.hbs` file under the root, keyed by partial name.
    ///
    /// Files whose names are not valid partial names are skipped.
    pub fn load_all(&self) -> Result<IndexMap<String, String>> {
        let mut names = Vec::new();
        self.collect_names(&self.root, &mut names)?;
        names.sort();

        let mut partials = IndexMap::with_capacity(names.len());
        for name in names {
            let source = self.load(&name)?;
            partials.insert(name, source);
        }

        tracing::debug!(
            root = %self.root.display(),
            partials = partials.len(),
            "partials loaded"
        );
        Ok(partials)
    }

    fn collect_names(&self, dir: &Path, names: &mut Vec<String>) -> Result<()> {
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            let path = entry.path();
            // `file_type` does not follow links.
            let file_type = entry.file_type()?;
            if file_type.is_dir() {
                self.collect_names(&path, names)?;
                continue;
            }
            if file_type.is_symlink() && path.is_dir() {
                tracing::debug!(path = %path.display(), "skipping linked directory");
                continue;
            }
            if path.extension().and_then(|ext| ext.to_str()) != Some(EXTENSION) {
                continue;
            }

            match self.name_for(&path) {
                Some(name) if validate_partial_name(&name).is_ok() => names.push(name),
                _ => tracing::debug!(path = %path.display(), "skipping file with invalid partial name"),
            }
        }
        Ok(())
    }

    fn name_for(&self, path: &Path) -> Option<String> {
        let relative = path.strip_prefix(&self.root).ok()?.with_extension("");
        let segments: Option<Vec<&str>> = relative
            .components()
            .map(|component| component.as_os_str().to_str())
            .collect();
        Some(segments?.join("/"))
    }

    fn partial_path(&self, name: &str) -> PathBuf {
        let mut path = self.root.clone();
        for segment in name.split('/') {
            path.push(segment);
        }
        path.set_extension(EXTENSION);
        path
    }

    fn ensure_within_root(&self, path: &Path) -> Result<()> {
        // Missing files are reported by the caller; only check real paths.
        if !path.exists() {
            return Ok(());
        }
        let resolved = path.canonicalize().map_err(|e| HeraldError::PartialLoad {
            message: format!("Failed to resolve partial path: {e}"),
        })?;
        if resolved.starts_with(&self.root) {
            Ok(())
        } else {
            Err(HeraldError::PartialLoad {
                message: format!("Path traversal detected: {}", path.display()),
            })
        }
    }
}

/// Names are `/`-separated segments of `[A-Za-z][A-Za-z0-9_-]*`.
fn validate_partial_name(name: &str) -> Result<()> {
    if name.is_empty() || name.split('/').any(|segment| !is_valid_segment(segment)) {
        return Err(HeraldError::PartialLoad {
            message: format!("Invalid partial name '{name}'"),
        });
    }
    Ok(())
}

fn is_valid_segment(segment: &str) -> bool {
    let mut chars = segment.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}
