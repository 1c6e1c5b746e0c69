use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::errors::{Result, RunfilesError};

/// Set to `1` when only the manifest is available and no runfiles tree exists.
pub const RUNFILES_MANIFEST_ONLY: &str = "RUNFILES_MANIFEST_ONLY";

/// Path of the runfiles manifest file.
pub const RUNFILES_MANIFEST_FILE: &str = "RUNFILES_MANIFEST_FILE";

/// Root of the runfiles directory tree.
pub const RUNFILES_DIR: &str = "RUNFILES_DIR";

/// Legacy spelling of `RUNFILES_DIR` still exported for Java binaries.
pub const JAVA_RUNFILES: &str = "JAVA_RUNFILES";

/// Runfiles root exported by the test runner.
pub const TEST_SRCDIR: &str = "TEST_SRCDIR";

/// Suffix of the runfiles directory placed next to a binary.
pub const RUNFILES_DIR_SUFFIX: &str = ".runfiles";

/// Suffix of the runfiles manifest placed next to a binary.
pub const RUNFILES_MANIFEST_SUFFIX: &str = ".runfiles_manifest";

/// Name of the manifest inside a runfiles directory.
pub const MANIFEST_FILENAME: &str = "MANIFEST";

/// Where the runfiles of the current process live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunfilesLocation {
    Manifest(PathBuf),
    Directory(PathBuf),
}

/// Snapshot of the environment that describes where runfiles are located.
///
/// Empty variable values are treated as unset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunfilesEnv {
    pub manifest_only: bool,
    pub manifest_file: Option<PathBuf>,
    pub runfiles_dir: Option<PathBuf>,
    pub java_runfiles: Option<PathBuf>,
    pub test_srcdir: Option<PathBuf>,
    pub executable: Option<PathBuf>,
}

impl RunfilesEnv {
    /// Captures the runfiles variables of the current process and the path of
    /// the running executable.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var_os(name))
            .with_executable(std::env::current_exe().ok())
    }

    /// Builds an environment from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<OsString>,
    {
        let path_var = |name: &str| lookup(name).filter(|v| !v.is_empty()).map(PathBuf::from);

        Self {
            manifest_only: lookup(RUNFILES_MANIFEST_ONLY).is_some_and(|v| v == "1"),
            manifest_file: path_var(RUNFILES_MANIFEST_FILE),
            runfiles_dir: path_var(RUNFILES_DIR),
            java_runfiles: path_var(JAVA_RUNFILES),
            test_srcdir: path_var(TEST_SRCDIR),
            executable: None,
        }
    }

    /// Sets the executable used for discovering sibling runfiles.
    pub fn with_executable(mut self, executable: Option<PathBuf>) -> Self {
        self.executable = executable;
        self
    }

    /// Determines where the runfiles are, checking the sources in order of
    /// precedence.
    pub fn discover(&self) -> Result<RunfilesLocation> {
        if self.manifest_only {
            return match &self.manifest_file {
                Some(manifest) => Ok(RunfilesLocation::Manifest(manifest.clone())),
                None => Err(RunfilesError::Unavailable {
                    message: format!(
                        "{} is set but {} is not",
                        RUNFILES_MANIFEST_ONLY, RUNFILES_MANIFEST_FILE
                    ),
                }),
            };
        }

        let dir_vars = [&self.runfiles_dir, &self.java_runfiles];
        if let Some(dir) = dir_vars.into_iter().flatten().find(|d| d.is_dir()) {
            tracing::debug!("using runfiles directory from environment: {}", dir.display());
            return Ok(RunfilesLocation::Directory(dir.clone()));
        }

        if let Some(manifest) = self.manifest_file.as_ref().filter(|m| m.is_file()) {
            tracing::debug!("using runfiles manifest from environment: {}", manifest.display());
            return Ok(RunfilesLocation::Manifest(manifest.clone()));
        }

        if let Some(location) = self.executable.as_deref().and_then(beside_executable) {
            return Ok(location);
        }

        if let Some(dir) = self.test_srcdir.as_ref().filter(|d| d.is_dir()) {
            tracing::debug!("using {}: {}", TEST_SRCDIR, dir.display());
            return Ok(RunfilesLocation::Directory(dir.clone()));
        }

        Err(RunfilesError::Unavailable {
            message: format!(
                "no runfiles manifest or directory found (checked {}, {}, {}, {} and the executable's siblings)",
                RUNFILES_DIR, JAVA_RUNFILES, RUNFILES_MANIFEST_FILE, TEST_SRCDIR
            ),
        })
    }
}

/// Looks for `<exe>.runfiles/` and `<exe>.runfiles_manifest`.
fn beside_executable(executable: &Path) -> Option<RunfilesLocation> {
    let dir = append_suffix(executable, RUNFILES_DIR_SUFFIX);
    if dir.is_dir() {
        tracing::debug!("using runfiles directory beside executable: {}", dir.display());
        return Some(RunfilesLocation::Directory(dir));
    }

    let manifest = append_suffix(executable, RUNFILES_MANIFEST_SUFFIX);
    if manifest.is_file() {
        tracing::debug!("using runfiles manifest beside executable: {}", manifest.display());
        return Some(RunfilesLocation::Manifest(manifest));
    }

    None
}

fn append_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut os: OsString = path.as_os_str().to_owned();
    os.push(suffix);
    PathBuf::from(os)
}

/// Derives the runfiles directory that belongs to a manifest, if the manifest
/// follows one of the standard naming schemes.
pub fn runfiles_dir_for_manifest(manifest: &Path) -> Option<PathBuf> {
    let name = manifest.file_name()?.to_str()?;

    if name == MANIFEST_FILENAME {
        let parent = manifest.parent()?;
        let parent_name = parent.file_name()?.to_str()?;
        return parent_name
            .ends_with(RUNFILES_DIR_SUFFIX)
            .then(|| parent.to_path_buf());
    }

    let stem = name.strip_suffix(RUNFILES_MANIFEST_SUFFIX)?;
    Some(manifest.with_file_name(format!("{stem}{RUNFILES_DIR_SUFFIX}")))
}
