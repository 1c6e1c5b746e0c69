use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::Path;

use crate::errors::{Result, RunfilesError};

/// Name of the repository mapping file at the root of the runfiles.
pub const REPO_MAPPING_FILENAME: &str = "_repo_mapping";

/// Translates apparent repository names into canonical ones, per source
/// repository.
///
/// Each line of the mapping file is `source,apparent,target`. A source that
/// ends in `*` applies to every source repository starting with the text
/// before the `*`; exact rows take precedence over such prefix rows.
#[derive(Debug, Clone, Default)]
pub struct RepoMapping {
    exact: HashMap<(String, String), String>,
    /// `(source prefix, apparent, target)`, in file order.
    prefixed: Vec<(String, String, String)>,
}

impl RepoMapping {
    /// A mapping with no rows; every lookup misses.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Reads the mapping file at `path`. A missing file yields an empty
    /// mapping.
    pub fn load(path: &Path) -> Result<Self> {
        match fs::read_to_string(path) {
            Ok(contents) => {
                let mapping = Self::parse(path, &contents)?;
                tracing::debug!("loaded repo mapping {} ({} rows)", path.display(), mapping.len());
                Ok(mapping)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::debug!("no repo mapping at {}", path.display());
                Ok(Self::empty())
            }
            Err(e) => Err(RunfilesError::Unavailable {
                message: format!("failed to read repo mapping '{}': {}", path.display(), e),
            }),
        }
    }

    /// Parses mapping `contents`; `path` is used for error reporting.
    pub fn parse(path: &Path, contents: &str) -> Result<Self> {
        let mut mapping = Self::empty();

        for (idx, line) in contents.lines().enumerate() {
            let line = line.trim_end_matches('\r');
            if line.is_empty() {
                continue;
            }

            let fields: Vec<&str> = line.split(',').collect();
            let &[source, apparent, target] = fields.as_slice() else {
                return Err(RunfilesError::RepoMapping {
                    message: format!("expected 3 comma-separated fields, found {}", fields.len()),
                    path: path.display().to_string(),
                    line: idx + 1,
                });
            };

            match source.strip_suffix('*') {
                Some(prefix) => mapping.prefixed.push((
                    prefix.to_string(),
                    apparent.to_string(),
                    target.to_string(),
                )),
                None => {
                    mapping
                        .exact
                        .insert((source.to_string(), apparent.to_string()), target.to_string());
                }
            }
        }

        Ok(mapping)
    }

    /// Number of rows, counting prefix rows once.
    pub fn len(&self) -> usize {
        self.exact.len() + self.prefixed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the canonical name that `apparent` refers to when seen from
    /// `source`.
    pub fn lookup(&self, source: &str, apparent: &str) -> Option<&str> {
        if let Some(target) = self.exact.get(&(source.to_string(), apparent.to_string())) {
            return Some(target);
        }

        self.prefixed
            .iter()
            .find(|(prefix, app, _)| app == apparent && source.starts_with(prefix.as_str()))
            .map(|(_, _, target)| target.as_str())
    }
}
