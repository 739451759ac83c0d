use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::declaration::Declaration;
use crate::error::{Error, Result};
use crate::extract::Extractor;
use crate::filter::{Declarations, Filter, FilterChain};
use crate::kind::KindMask;
use crate::parse::SourceParser;
use crate::scan::{DEFAULT_EXTENSIONS, scan_sources};

/// What a scan does with a file that fails to parse.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParsePolicy {
    /// Yield the error and end the scan.
    #[default]
    Abort,
    /// Log the file and continue with the next one.
    Skip,
}

/// Finds PHP type declarations under a set of roots.
///
/// A finder is immutable; the `with_*` methods return a reconfigured copy.
#[derive(Debug, Clone)]
pub struct ClassFinder {
    mask: KindMask,
    filters: FilterChain,
    policy: ParsePolicy,
    extensions: Vec<String>,
}

impl Default for ClassFinder {
    fn default() -> Self {
        Self::new(KindMask::ALL, [])
    }
}

impl ClassFinder {
    pub fn new<I>(mask: KindMask, filters: I) -> Self
    where
        I: IntoIterator<Item = Arc<dyn Filter>>,
    {
        Self {
            mask,
            filters: filters.into_iter().collect(),
            policy: ParsePolicy::default(),
            extensions: DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
        }
    }

    pub fn mask(&self) -> KindMask {
        self.mask
    }

    pub fn filters(&self) -> &FilterChain {
        &self.filters
    }

    pub fn parse_policy(&self) -> ParsePolicy {
        self.policy
    }

    pub fn with_filter(&self, filter: impl Filter + 'static) -> Self {
        self.with_shared_filter(Arc::new(filter))
    }

    pub fn with_shared_filter(&self, filter: Arc<dyn Filter>) -> Self {
        Self {
            filters: self.filters.with(filter),
            ..self.clone()
        }
    }

    pub fn with_filters<I>(&self, filters: I) -> Self
    where
        I: IntoIterator<Item = Arc<dyn Filter>>,
    {
        Self {
            filters: self.filters.with_all(filters),
            ..self.clone()
        }
    }

    pub fn with_mask(&self, mask: KindMask) -> Self {
        Self {
            mask,
            ..self.clone()
        }
    }

    pub fn with_parse_policy(&self, policy: ParsePolicy) -> Self {
        Self {
            policy,
            ..self.clone()
        }
    }

    pub fn with_extensions<I>(&self, extensions: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        let extensions: Vec<String> = extensions
            .into_iter()
            .map(|e| e.into().trim_start_matches('.').to_string())
            .filter(|e| !e.is_empty())
            .collect();
        Self {
            extensions,
            ..self.clone()
        }
    }

    /// Scans `roots`, skipping anything matched by `excludes`.
    ///
    /// Roots and exclude patterns are checked before this returns; files are
    /// only read and parsed as the returned stream is consumed.
    pub fn find<R, E>(&self, roots: R, excludes: E) -> Result<Declarations>
    where
        R: IntoIterator,
        R::Item: AsRef<Path>,
        E: IntoIterator,
        E::Item: AsRef<str>,
    {
        let files = scan_sources(roots, excludes, &self.extensions)?;
        self.find_files(files)
    }

    /// Runs extraction and the filter chain over an explicit file sequence.
    pub fn find_files<I>(&self, files: I) -> Result<Declarations>
    where
        I: IntoIterator<Item = Result<PathBuf>>,
        I::IntoIter: 'static,
    {
        if self.mask.is_empty() {
            warn!(mask = self.mask.bits(), "kind mask selects nothing; files are still parsed");
        }
        let scan = Scan {
            files: Box::new(files.into_iter()),
            parser: SourceParser::new()?,
            extractor: Extractor::new(self.mask),
            policy: self.policy,
            pending: Vec::new().into_iter(),
            done: false,
        };
        Ok(self.filters.apply(Box::new(scan)))
    }
}

/// Pull-driven scan: one file is parsed only when its declarations are
/// needed.
struct Scan {
    files: Box<dyn Iterator<Item = Result<PathBuf>>>,
    parser: SourceParser,
    extractor: Extractor,
    policy: ParsePolicy,
    pending: std::vec::IntoIter<Declaration>,
    done: bool,
}

impl Iterator for Scan {
    type Item = Result<Declaration>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(decl) = self.pending.next() {
                return Some(Ok(decl));
            }
            if self.done {
                return None;
            }

            let path = match self.files.next() {
                Some(Ok(path)) => path,
                Some(Err(err)) => return Some(Err(self.fail(err))),
                None => {
                    self.done = true;
                    return None;
                }
            };

            match self.parser.parse_file(&path) {
                Ok(parsed) => {
                    let found = self.extractor.extract(&path, &parsed);
                    debug!(file = %path.display(), declarations = found.len(), "parsed");
                    self.pending = found.into_iter();
                }
                Err(err) if self.policy == ParsePolicy::Skip => {
                    warn!(file = %path.display(), error = %err.cause, "skipping unparsable file");
                }
                Err(err) => return Some(Err(self.fail(err.into()))),
            }
        }
    }
}

impl Scan {
    fn fail(&mut self, err: Error) -> Error {
        self.done = true;
        err
    }
}
