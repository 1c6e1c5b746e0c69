use clap::{Parser, Subcommand};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process;
use tracing_subscriber::EnvFilter;

use runfiles_repo::errors::Result;
use runfiles_repo::repo::load_runfiles;
use runfiles_repo::{RunfileResolver, Runfiles, RunfilesEnv, RunfilesKind};

/// Resolve Bazel runfiles to absolute paths.
#[derive(Parser)]
#[command(name = "rlocation", about = "Resolve Bazel runfiles to absolute paths")]
struct Cli {
    /// Use this runfiles manifest instead of discovering one
    #[arg(long, global = true, conflicts_with = "runfiles_dir")]
    manifest: Option<PathBuf>,
    /// Use this runfiles directory instead of discovering one
    #[arg(long, global = true)]
    runfiles_dir: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve runfile paths
    Locate {
        /// Runfile paths, e.g. `my_repo/pkg/file.txt`
        #[arg(required = true)]
        paths: Vec<String>,
        /// Resolve paths relative to the main repository
        #[arg(long, conflicts_with_all = ["unmapped", "source_repository"])]
        main: bool,
        /// Do not apply the repo mapping
        #[arg(short, long)]
        unmapped: bool,
        /// Canonical name of the repository the paths are written from
        #[arg(short, long)]
        source_repository: Option<String>,
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },
    /// Print the environment variables a child process needs to find these runfiles
    Env {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },
    /// Show where the runfiles were found
    Info {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },
}

#[derive(Serialize)]
struct Info<'a> {
    kind: RunfilesKind,
    location: String,
    source_repository: &'a str,
    manifest_entries: Option<usize>,
    repo_mapping_rows: usize,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("RLOCATION_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let env = runfiles_env(cli.manifest, cli.runfiles_dir);

    match cli.command {
        Commands::Locate {
            paths,
            main,
            unmapped,
            source_repository,
            json,
        } => {
            let resolved = if main {
                let resolver = RunfileResolver::with_loader(|| load_runfiles(&env));
                paths
                    .iter()
                    .map(|p| resolver.resolve(p).map(|r| (p.clone(), r)))
                    .collect::<Result<Vec<_>>>()?
            } else {
                let mut runfiles = load_runfiles(&env)?;
                if let Some(source) = &source_repository {
                    runfiles = runfiles.with_source_repository(source);
                }
                if unmapped {
                    runfiles = runfiles.unmapped();
                }
                paths
                    .iter()
                    .map(|p| runfiles.rlocation(p).map(|r| (p.clone(), r)))
                    .collect::<Result<Vec<_>>>()?
            };

            if json {
                let map: BTreeMap<_, _> = resolved
                    .iter()
                    .map(|(p, r)| (p.as_str(), r.display().to_string()))
                    .collect();
                println!("{}", serde_json::to_string_pretty(&map).unwrap_or_default());
            } else {
                for (_, location) in &resolved {
                    println!("{}", location.display());
                }
            }
        }
        Commands::Env { json } => {
            let runfiles = Runfiles::create(&env)?;
            let vars: BTreeMap<_, _> = runfiles
                .env_vars()
                .into_iter()
                .map(|(k, v)| (k, v.to_string_lossy().into_owned()))
                .collect();
            if json {
                println!("{}", serde_json::to_string_pretty(&vars).unwrap_or_default());
            } else {
                for (name, value) in &vars {
                    println!("{}={}", name, value);
                }
            }
        }
        Commands::Info { json } => {
            let runfiles = load_runfiles(&env)?;
            let info = Info {
                kind: runfiles.kind(),
                location: runfiles.location().display().to_string(),
                source_repository: runfiles.source_repository(),
                manifest_entries: runfiles.manifest_len(),
                repo_mapping_rows: runfiles.repo_mapping().len(),
            };
            if json {
                println!("{}", serde_json::to_string_pretty(&info).unwrap_or_default());
            } else {
                println!("Runfiles");
                println!("  Kind:      {}", info.kind.as_str());
                println!("  Location:  {}", info.location);
                println!("  Source:    {:?}", info.source_repository);
                if let Some(entries) = info.manifest_entries {
                    println!("  Entries:   {}", entries);
                }
                println!("  Mappings:  {}", info.repo_mapping_rows);
            }
        }
    }
    Ok(())
}

/// Builds the runfiles environment, letting explicit flags take precedence
/// over discovery.
fn runfiles_env(manifest: Option<PathBuf>, runfiles_dir: Option<PathBuf>) -> RunfilesEnv {
    match (manifest, runfiles_dir) {
        (Some(manifest), _) => RunfilesEnv {
            manifest_only: true,
            manifest_file: Some(manifest),
            ..RunfilesEnv::default()
        },
        (None, Some(dir)) => RunfilesEnv {
            runfiles_dir: Some(dir),
            ..RunfilesEnv::default()
        },
        (None, None) => RunfilesEnv::from_env(),
    }
}
