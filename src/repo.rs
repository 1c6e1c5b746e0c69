use std::path::PathBuf;

use once_cell::sync::OnceCell;

use crate::config::RunfilesEnv;
use crate::errors::{Result, RunfilesError};
use crate::runfiles::Runfiles;

/// Canonical name of the main repository inside the runfiles tree. Every
/// logical path handed to [`rlocation`] is resolved beneath it.
pub const MAIN_REPOSITORY: &str = "_main";

/// Canonical name of the repository this crate was built in, as provided by
/// the build at compile time. Empty for the main repository.
pub const SOURCE_REPOSITORY: &str = match option_env!("REPOSITORY_NAME") {
    Some(name) => name,
    None => "",
};

/// Constructor for the index behind a [`RunfileResolver`].
pub type Loader = fn() -> Result<Runfiles>;

static RESOLVER: RunfileResolver = RunfileResolver::new();

/// Resolves `path`, relative to the main repository, through the process-wide
/// runfiles index.
///
/// The index is built from the process environment on first use and reused
/// for the rest of the process.
pub fn rlocation(path: &str) -> Result<PathBuf> {
    RESOLVER.resolve(path)
}

/// Builds an index from `env`, scoped to [`SOURCE_REPOSITORY`].
pub fn load_runfiles(env: &RunfilesEnv) -> Result<Runfiles> {
    Ok(Runfiles::create(env)?.with_source_repository(SOURCE_REPOSITORY))
}

fn load_process_runfiles() -> Result<Runfiles> {
    load_runfiles(&RunfilesEnv::from_env())
}

/// Lazily-initialized runfiles index with main-repository lookups.
///
/// The index is constructed at most once, on the first call to
/// [`resolve`](RunfileResolver::resolve), even when many threads make that
/// first call at the same time. A failed construction is reported to the
/// caller and leaves the resolver uninitialized.
pub struct RunfileResolver<F = Loader> {
    index: OnceCell<Runfiles>,
    loader: F,
}

impl RunfileResolver {
    /// A resolver that reads the runfiles location from the process
    /// environment.
    pub const fn new() -> Self {
        Self {
            index: OnceCell::new(),
            loader: load_process_runfiles,
        }
    }
}

impl Default for RunfileResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl<F> RunfileResolver<F>
where
    F: Fn() -> Result<Runfiles>,
{
    /// A resolver that builds its index with `loader`.
    pub const fn with_loader(loader: F) -> Self {
        Self {
            index: OnceCell::new(),
            loader,
        }
    }

    /// Resolves `path` beneath [`MAIN_REPOSITORY`].
    ///
    /// A missing entry is reported with the caller's `path`, not the prefixed
    /// key.
    pub fn resolve(&self, path: &str) -> Result<PathBuf> {
        if path.is_empty() {
            return Err(RunfilesError::InvalidPath {
                message: "path is empty".to_string(),
                path: String::new(),
            });
        }

        let runfiles = self.runfiles()?;
        runfiles
            .rlocation(&format!("{}/{}", MAIN_REPOSITORY, path))
            .map_err(|err| match err {
                RunfilesError::NotFound { .. } => RunfilesError::NotFound {
                    path: path.to_string(),
                },
                other => other,
            })
    }

    /// Returns the index, building it if this is the first use.
    pub fn runfiles(&self) -> Result<&Runfiles> {
        self.index.get_or_try_init(|| (self.loader)())
    }

    pub fn is_initialized(&self) -> bool {
        self.index.get().is_some()
    }
}
