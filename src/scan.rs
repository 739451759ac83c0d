use ignore::overrides::{Override, OverrideBuilder};
use ignore::{Walk, WalkBuilder};
use std::io;
use std::path::{Path, PathBuf};
use tracing::trace;

use crate::error::{DiscoveryError, Result};

pub const DEFAULT_EXTENSIONS: &[&str] = &["php"];

/// Lazily enumerates source files under a list of roots.
///
/// Roots are visited in the order given, entries inside a directory in
/// file-name order. Nothing touches the filesystem until the next path is
/// pulled.
pub struct SourceFiles {
    walks: std::vec::IntoIter<Walk>,
    current: Option<Walk>,
    extensions: Vec<String>,
}

impl SourceFiles {
    fn matches_extension(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| self.extensions.iter().any(|x| x.eq_ignore_ascii_case(e)))
    }
}

impl Iterator for SourceFiles {
    type Item = Result<PathBuf>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let walk = match self.current.as_mut() {
                Some(walk) => walk,
                None => self.current.insert(self.walks.next()?),
            };

            match walk.next() {
                None => {
                    self.current = None;
                }
                Some(Err(err)) => return Some(Err(DiscoveryError::Walk(err).into())),
                Some(Ok(entry)) => {
                    if !entry.file_type().is_some_and(|t| t.is_file()) {
                        continue;
                    }
                    // An explicitly named file is scanned whatever its extension.
                    if entry.depth() == 0 || self.matches_extension(entry.path()) {
                        return Some(Ok(entry.into_path()));
                    }
                    trace!(path = %entry.path().display(), "skipping non-source file");
                }
            }
        }
    }
}

/// Prepares discovery over `roots`, failing before any walk starts if a
/// root is missing or unreadable or an exclude pattern is malformed.
///
/// Exclude patterns use gitignore glob syntax relative to each root: a bare
/// name such as `vendor` matches at any depth, `src/Legacy` is anchored.
pub fn scan_sources<R, E>(roots: R, excludes: E, extensions: &[String]) -> Result<SourceFiles>
where
    R: IntoIterator,
    R::Item: AsRef<Path>,
    E: IntoIterator,
    E::Item: AsRef<str>,
{
    let excludes: Vec<String> = excludes
        .into_iter()
        .map(|p| p.as_ref().trim().to_string())
        .filter(|p| !p.is_empty())
        .collect();

    let mut walks = Vec::new();
    for root in roots {
        let root = root.as_ref();
        check_root(root)?;
        let overrides = build_overrides(root, &excludes)?;

        let walk = WalkBuilder::new(root)
            .hidden(true)
            .parents(false)
            .ignore(false)
            .git_ignore(false)
            .git_global(false)
            .git_exclude(false)
            .overrides(overrides)
            .sort_by_file_name(|a, b| a.cmp(b))
            .build();
        walks.push(walk);
    }

    let extensions = if extensions.is_empty() {
        DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect()
    } else {
        extensions.to_vec()
    };

    Ok(SourceFiles {
        walks: walks.into_iter(),
        current: None,
        extensions,
    })
}

fn check_root(root: &Path) -> std::result::Result<(), DiscoveryError> {
    let unreadable = |source: io::Error| DiscoveryError::UnreadableRoot {
        path: root.to_path_buf(),
        source,
    };

    let meta = match std::fs::metadata(root) {
        Ok(meta) => meta,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(DiscoveryError::MissingRoot(root.to_path_buf()));
        }
        Err(e) => return Err(unreadable(e)),
    };

    if meta.is_dir() {
        std::fs::read_dir(root).map_err(unreadable)?;
    } else {
        std::fs::File::open(root).map_err(unreadable)?;
    }
    Ok(())
}

fn build_overrides(
    root: &Path,
    excludes: &[String],
) -> std::result::Result<Override, DiscoveryError> {
    let mut builder = OverrideBuilder::new(root);
    for pattern in excludes {
        let glob = format!("!{}", relative_pattern(root, pattern));
        builder
            .add(&glob)
            .map_err(|source| DiscoveryError::InvalidExclude {
                pattern: pattern.clone(),
                source,
            })?;
    }
    builder
        .build()
        .map_err(|source| DiscoveryError::InvalidExclude {
            pattern: excludes.join(", "),
            source,
        })
}

/// Rewrites an absolute exclude path under `root` into a root-anchored glob.
/// The root is made absolute first so `src` and `/abs/src/vendor` line up.
fn relative_pattern(root: &Path, pattern: &str) -> String {
    let path = Path::new(pattern);
    if path.is_absolute()
        && let Ok(root) = std::path::absolute(root)
        && let Ok(rel) = path.strip_prefix(&root)
    {
        return format!("/{}", rel.to_string_lossy().replace('\\', "/"));
    }
    pattern.strip_prefix("./").unwrap_or(pattern).to_string()
}
