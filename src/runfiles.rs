use std::collections::BTreeMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;

use crate::config::{
    runfiles_dir_for_manifest, RunfilesEnv, RunfilesLocation, JAVA_RUNFILES, RUNFILES_DIR,
    RUNFILES_MANIFEST_FILE, RUNFILES_MANIFEST_ONLY,
};
use crate::errors::{Result, RunfilesError};
use crate::manifest::Manifest;
use crate::repo_mapping::{RepoMapping, REPO_MAPPING_FILENAME};

/// How runfiles are laid out for the current process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunfilesKind {
    Manifest,
    Directory,
}

impl RunfilesKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunfilesKind::Manifest => "manifest",
            RunfilesKind::Directory => "directory",
        }
    }
}

#[derive(Debug, Clone)]
enum Mode {
    Manifest(Arc<Manifest>),
    Directory(PathBuf),
}

/// Index that maps runfile paths to real filesystem locations.
///
/// The loaded manifest and repo mapping are shared between clones, so
/// [`Runfiles::with_source_repository`] and [`Runfiles::unmapped`] are cheap.
#[derive(Debug, Clone)]
pub struct Runfiles {
    mode: Mode,
    repo_mapping: Arc<RepoMapping>,
    source_repository: String,
    apply_mapping: bool,
}

impl Runfiles {
    /// Builds the index from the environment of the current process.
    pub fn preload() -> Result<Self> {
        Self::create(&RunfilesEnv::from_env())
    }

    /// Builds the index from an explicit environment snapshot.
    pub fn create(env: &RunfilesEnv) -> Result<Self> {
        match env.discover()? {
            RunfilesLocation::Manifest(path) => Self::from_manifest(&path),
            RunfilesLocation::Directory(path) => Self::from_directory(&path),
        }
    }

    /// Builds a manifest-mode index. The repo mapping is looked up through the
    /// manifest itself.
    pub fn from_manifest(path: &Path) -> Result<Self> {
        let manifest = Manifest::load(path)?;
        let repo_mapping = match manifest.lookup(REPO_MAPPING_FILENAME) {
            Some(mapping_path) => RepoMapping::load(&mapping_path)?,
            None => RepoMapping::empty(),
        };
        Ok(Self::new(Mode::Manifest(Arc::new(manifest)), repo_mapping))
    }

    /// Builds a directory-mode index rooted at `root`.
    pub fn from_directory(root: &Path) -> Result<Self> {
        if !root.is_dir() {
            return Err(RunfilesError::Unavailable {
                message: format!("runfiles directory '{}' does not exist", root.display()),
            });
        }
        let repo_mapping = RepoMapping::load(&root.join(REPO_MAPPING_FILENAME))?;
        tracing::debug!("using runfiles directory {}", root.display());
        Ok(Self::new(Mode::Directory(root.to_path_buf()), repo_mapping))
    }

    fn new(mode: Mode, repo_mapping: RepoMapping) -> Self {
        Self {
            mode,
            repo_mapping: Arc::new(repo_mapping),
            source_repository: String::new(),
            apply_mapping: true,
        }
    }

    /// Returns a copy that resolves apparent repository names as seen from
    /// `source_repository` (a canonical name; `""` is the main repository).
    pub fn with_source_repository(&self, source_repository: &str) -> Self {
        Self {
            source_repository: source_repository.to_string(),
            ..self.clone()
        }
    }

    /// Returns a copy that uses runfile paths verbatim, without applying the
    /// repo mapping.
    pub fn unmapped(&self) -> Self {
        Self {
            apply_mapping: false,
            ..self.clone()
        }
    }

    pub fn kind(&self) -> RunfilesKind {
        match self.mode {
            Mode::Manifest(_) => RunfilesKind::Manifest,
            Mode::Directory(_) => RunfilesKind::Directory,
        }
    }

    /// Path of the manifest file or runfiles directory backing this index.
    pub fn location(&self) -> &Path {
        match &self.mode {
            Mode::Manifest(manifest) => manifest.path(),
            Mode::Directory(root) => root,
        }
    }

    pub fn source_repository(&self) -> &str {
        &self.source_repository
    }

    pub fn repo_mapping(&self) -> &RepoMapping {
        &self.repo_mapping
    }

    /// Number of manifest entries, or `None` in directory mode.
    pub fn manifest_len(&self) -> Option<usize> {
        match &self.mode {
            Mode::Manifest(manifest) => Some(manifest.len()),
            Mode::Directory(_) => None,
        }
    }

    /// Resolves a runfile path such as `my_repo/pkg/file.txt` to the real
    /// location of the file.
    ///
    /// Absolute paths are returned unchanged. Paths with `.`, `..` or empty
    /// segments are rejected; a single trailing `/` is accepted. The first
    /// segment is translated through the repo mapping unless this is an
    /// [unmapped](Runfiles::unmapped) view.
    pub fn rlocation(&self, path: &str) -> Result<PathBuf> {
        validate(path)?;

        if Path::new(path).is_absolute() {
            return Ok(PathBuf::from(path));
        }

        let key = self.apply_repo_mapping(path);
        tracing::trace!("rlocation {} -> key {}", path, key);

        let found = match &self.mode {
            Mode::Manifest(manifest) => manifest.lookup(&key),
            Mode::Directory(root) => Some(root.join(&key)).filter(|p| p.exists()),
        };

        found.ok_or_else(|| RunfilesError::NotFound {
            path: path.to_string(),
        })
    }

    fn apply_repo_mapping(&self, path: &str) -> String {
        if !self.apply_mapping {
            return path.to_string();
        }

        let (apparent, rest) = match path.split_once('/') {
            Some((apparent, rest)) => (apparent, Some(rest)),
            None => (path, None),
        };

        match (self.repo_mapping.lookup(&self.source_repository, apparent), rest) {
            (Some(canonical), Some(rest)) => format!("{}/{}", canonical, rest),
            (Some(canonical), None) => canonical.to_string(),
            (None, _) => path.to_string(),
        }
    }

    /// Environment variables a child process needs to find the same runfiles.
    ///
    /// In manifest mode `RUNFILES_MANIFEST_ONLY=1` is included so the child
    /// does not pick up a runfiles directory that may be absent or stale.
    pub fn env_vars(&self) -> BTreeMap<&'static str, OsString> {
        let mut vars = BTreeMap::new();
        match &self.mode {
            Mode::Manifest(manifest) => {
                vars.insert(RUNFILES_MANIFEST_ONLY, OsString::from("1"));
                vars.insert(RUNFILES_MANIFEST_FILE, manifest.path().as_os_str().to_owned());
                if let Some(dir) = runfiles_dir_for_manifest(manifest.path()) {
                    vars.insert(RUNFILES_DIR, dir.clone().into_os_string());
                    vars.insert(JAVA_RUNFILES, dir.into_os_string());
                }
            }
            Mode::Directory(root) => {
                vars.insert(RUNFILES_DIR, root.as_os_str().to_owned());
                vars.insert(JAVA_RUNFILES, root.as_os_str().to_owned());
            }
        }
        vars
    }
}

fn validate(path: &str) -> Result<()> {
    let invalid = |message: &str| {
        Err(RunfilesError::InvalidPath {
            message: message.to_string(),
            path: path.to_string(),
        })
    };

    if path.is_empty() {
        return invalid("path is empty");
    }
    if Path::new(path).is_absolute() {
        return Ok(());
    }

    // A single trailing separator names a directory and is allowed.
    let trimmed = path.strip_suffix('/').unwrap_or(path);
    for segment in trimmed.split('/') {
        match segment {
            "" => return invalid("path contains an empty segment"),
            "." => return invalid("path is not normalized ('.' segment)"),
            ".." => return invalid("path is not normalized ('..' segment)"),
            _ => {}
        }
    }

    Ok(())
}
