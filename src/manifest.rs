use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::errors::{Result, RunfilesError};

/// A parsed runfiles manifest.
///
/// Each line maps a runfile key (`<canonical repo>/<path>`) to the real path
/// of the file. A line starting with a space has an escaped key and value:
/// `\s` stands for a space (key only), `\n` for a newline and `\b` for a
/// backslash. A line without a separator maps the key to itself, and a line
/// with an empty value records an empty placeholder that has no real file.
#[derive(Debug, Clone)]
pub struct Manifest {
    path: PathBuf,
    entries: HashMap<String, String>,
}

impl Manifest {
    /// Reads and parses the manifest at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|e| RunfilesError::Unavailable {
            message: format!("failed to read runfiles manifest '{}': {}", path.display(), e),
        })?;
        let manifest = Self::parse(path, &contents)?;
        tracing::debug!(
            "loaded runfiles manifest {} ({} entries)",
            path.display(),
            manifest.len()
        );
        Ok(manifest)
    }

    /// Parses manifest `contents`; `path` is only used for error reporting and
    /// for deriving the runfiles directory.
    pub fn parse(path: &Path, contents: &str) -> Result<Self> {
        let mut entries = HashMap::new();

        for (idx, line) in contents.lines().enumerate() {
            let line = line.strip_suffix('\r').unwrap_or(line);
            if line.is_empty() {
                continue;
            }

            let parse_err = |message: String| RunfilesError::Manifest {
                message,
                path: path.display().to_string(),
                line: idx + 1,
            };

            let (key, value) = match line.strip_prefix(' ') {
                Some(escaped) => match escaped.split_once(' ') {
                    Some((key, value)) => (
                        unescape(key, true).map_err(parse_err)?,
                        unescape(value, false).map_err(parse_err)?,
                    ),
                    None => {
                        let key = unescape(escaped, true).map_err(parse_err)?;
                        (key.clone(), key)
                    }
                },
                None => {
                    let (key, value) = line.split_once(' ').unwrap_or((line, line));
                    (key.to_string(), value.to_string())
                }
            };

            entries.insert(key, value);
        }

        Ok(Self {
            path: path.to_path_buf(),
            entries,
        })
    }

    /// Location of the manifest file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of entries, including empty placeholders.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the raw value recorded for `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Resolves `key` to a real path.
    ///
    /// An exact entry wins. Otherwise the longest parent directory of `key`
    /// that has an entry is used and the rest of `key` is appended to it,
    /// which covers tree artifacts that are listed only by their root.
    pub fn lookup(&self, key: &str) -> Option<PathBuf> {
        if let Some(value) = self.entries.get(key) {
            return (!value.is_empty()).then(|| PathBuf::from(value));
        }

        let mut prefix_end = key.len();
        while let Some(sep) = key[..prefix_end].rfind('/') {
            if let Some(value) = self.entries.get(&key[..sep]).filter(|v| !v.is_empty()) {
                return Some(Path::new(value).join(&key[sep + 1..]));
            }
            prefix_end = sep;
        }

        None
    }
}

fn unescape(raw: &str, is_key: bool) -> std::result::Result<String, String> {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('s') if is_key => out.push(' '),
            Some('n') => out.push('\n'),
            Some('b') => out.push('\\'),
            Some(other) => return Err(format!("unknown escape sequence '\\{}'", other)),
            None => return Err("dangling backslash".to_string()),
        }
    }

    Ok(out)
}
