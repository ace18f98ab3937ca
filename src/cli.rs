//! Command-line interface for restruct.
//!
//! Every subcommand maps onto one [`SessionService`] operation. Sessions are
//! persisted between invocations in the JSON session store.

use crate::config::AppConfig;
use crate::error::Result;
use crate::output::OutputFormatter;
use crate::service::SessionService;
use crate::store::SessionStore;
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use std::path::{Path, PathBuf};
use uuid::Uuid;

#[derive(Debug, Parser)]
#[command(
    name = "restruct",
    version,
    about = "Plan, preview and apply a reorganization of a directory"
)]
pub struct Cli {
    /// Configuration file (defaults to .restructrc.toml, then ~/.config/restruct/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Session store file
    #[arg(long, global = true)]
    pub store: Option<PathBuf>,

    /// Print reports as JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Args)]
pub struct ScanArgs {
    /// Scan the whole subtree
    #[arg(long, conflicts_with = "flat")]
    pub recursive: bool,

    /// Scan immediate children only
    #[arg(long)]
    pub flat: bool,
}

impl ScanArgs {
    fn recursive(&self) -> Option<bool> {
        match (self.recursive, self.flat) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List the entries of a directory
    Ls { directory: PathBuf },
    /// Open a new session on a directory
    New {
        directory: PathBuf,
        #[command(flatten)]
        scan: ScanArgs,
    },
    /// List sessions
    List,
    /// Show one session
    Show { id: Uuid },
    /// Delete a session and everything it owns
    Delete { id: Uuid },
    /// Scan and describe the session directory
    Analyze {
        id: Uuid,
        #[arg(short, long)]
        method: Option<String>,
    },
    /// Compile the instruction plan
    Plan {
        id: Uuid,
        #[arg(short, long)]
        algorithm: Option<String>,
    },
    /// Analyze and plan in one step
    Process {
        id: Uuid,
        #[arg(short, long)]
        method: Option<String>,
        #[arg(short, long)]
        algorithm: Option<String>,
    },
    /// Show the directory tree the plan will produce
    Preview { id: Uuid },
    /// Apply the plan to the filesystem
    Apply {
        id: Uuid,
        #[arg(long)]
        dry_run: bool,
    },
    /// Show apply progress
    Progress { id: Uuid },
    /// List analysis methods
    Methods,
    /// List structuring algorithms
    Algorithms,
    /// Create, plan, preview and apply in one go
    Organize {
        directory: PathBuf,
        #[command(flatten)]
        scan: ScanArgs,
        #[arg(short, long)]
        method: Option<String>,
        #[arg(short, long)]
        algorithm: Option<String>,
        #[arg(long)]
        dry_run: bool,
    },
}

/// Runs a parsed command line.
///
/// ```no_run
/// use clap::Parser;
/// use restruct::cli::{Cli, run_cli};
///
/// let cli = Cli::parse_from(["restruct", "organize", "/path/to/directory", "--dry-run"]);
/// if let Err(e) = run_cli(cli) {
///     eprintln!("Error: {}", e);
/// }
/// ```
pub fn run_cli(cli: Cli) -> Result<()> {
    let config = AppConfig::load(cli.config.as_deref())?;
    let store_path = cli.store.clone().unwrap_or_else(|| config.store.resolve());
    let store = SessionStore::open(&store_path)?;
    let mut service = SessionService::new(config, store)?;
    let json = cli.json;

    match cli.command {
        Command::Ls { directory } => {
            let listing = service.list_entries(&directory)?;
            if json {
                return emit(&listing);
            }
            OutputFormatter::directory_listing(&listing);
        }
        Command::New { directory, scan } => {
            let session = service.create_session(&directory, scan.recursive())?;
            if json {
                return emit(&session);
            }
            OutputFormatter::success(&format!("Created session {}", session.id));
        }
        Command::List => {
            let sessions = service.list_sessions();
            if json {
                return emit(&sessions);
            }
            OutputFormatter::session_list(&sessions);
        }
        Command::Show { id } => {
            let record = service.get_session(id)?;
            if json {
                return emit(record);
            }
            OutputFormatter::session_details(record);
        }
        Command::Delete { id } => {
            service.delete_session(id)?;
            OutputFormatter::success(&format!("Deleted session {}", id));
        }
        Command::Analyze { id, method } => {
            let summary = service.analyze(id, method.as_deref())?;
            if json {
                return emit(&summary);
            }
            OutputFormatter::analysis_summary(&summary);
        }
        Command::Plan { id, algorithm } => {
            let summary = service.plan(id, algorithm.as_deref())?;
            if json {
                return emit(&summary);
            }
            OutputFormatter::plan_summary(&summary);
        }
        Command::Process {
            id,
            method,
            algorithm,
        } => {
            let summary = service.process(id, method.as_deref(), algorithm.as_deref())?;
            if json {
                return emit(&summary);
            }
            OutputFormatter::plan_summary(&summary);
        }
        Command::Preview { id } => {
            let tree = service.preview(id)?;
            if json {
                return emit(&tree);
            }
            OutputFormatter::preview_tree(&tree);
        }
        Command::Apply { id, dry_run } => apply(&mut service, id, dry_run, json)?,
        Command::Progress { id } => {
            let progress = service.progress(id)?;
            if json {
                return emit(&progress);
            }
            OutputFormatter::progress(&progress);
        }
        Command::Methods => {
            let methods = service.methods();
            if json {
                return emit(&methods);
            }
            OutputFormatter::strategies("ANALYSIS METHODS", &methods);
        }
        Command::Algorithms => {
            let algorithms = service.algorithms();
            if json {
                return emit(&algorithms);
            }
            OutputFormatter::strategies("STRUCTURING ALGORITHMS", &algorithms);
        }
        Command::Organize {
            directory,
            scan,
            method,
            algorithm,
            dry_run,
        } => organize(
            &mut service,
            &directory,
            scan.recursive(),
            method.as_deref(),
            algorithm.as_deref(),
            dry_run,
            json,
        )?,
    }

    Ok(())
}

fn emit<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    OutputFormatter::json(value).map_err(std::io::Error::from)?;
    Ok(())
}

fn apply(service: &mut SessionService, id: Uuid, dry_run: bool, json: bool) -> Result<()> {
    let total = service.get_session(id)?.instructions.len() as u64;
    let pb = if json || dry_run {
        None
    } else {
        Some(OutputFormatter::create_progress_bar(total))
    };

    let callback = |done: usize, total: usize| {
        if let Some(pb) = &pb {
            pb.set_length(total as u64);
            pb.set_position(done as u64);
        }
    };
    let summary = service.apply(id, dry_run, Some(&callback))?;
    if let Some(pb) = &pb {
        pb.finish_and_clear();
    }

    if json {
        return emit(&summary);
    }
    OutputFormatter::apply_summary(&summary);
    Ok(())
}

fn organize(
    service: &mut SessionService,
    directory: &Path,
    recursive: Option<bool>,
    method: Option<&str>,
    algorithm: Option<&str>,
    dry_run: bool,
    json: bool,
) -> Result<()> {
    let session = service.create_session(directory, recursive)?;
    if !json {
        OutputFormatter::info(&format!(
            "Organizing contents of: {} (session {})",
            session.directory.display(),
            session.id
        ));
    }

    let plan = service.process(session.id, method, algorithm)?;
    if !json {
        OutputFormatter::plan_summary(&plan);
        OutputFormatter::header("PREVIEW");
        OutputFormatter::preview_tree(&service.preview(session.id)?);
    }

    apply(service, session.id, dry_run, json)?;
    if dry_run && !json {
        OutputFormatter::plain(&format!(
            "Run 'restruct apply {}' to execute the plan.",
            session.id
        ));
    }
    Ok(())
}
