pub mod add;
pub mod commit;
pub mod diff;
pub mod gc;
pub mod init;
pub mod lint;
pub mod pull;
pub mod push;
pub mod reset;
pub mod status;

use anyhow::Result;
use clap::Subcommand;

use nt_repository::Repository;
use nt_utils::PathSpecs;

use crate::Cli;

#[derive(Subcommand)]
pub enum Commands {
    /// Create an empty repository in the current directory
    Init(init::InitArgs),
    /// Stage changes under the given paths
    Add(add::AddArgs),
    /// Promote the staging area
    Commit(commit::CommitArgs),
    /// Show staged and unstaged changes
    Status(status::StatusArgs),
    /// Show content differences per object
    Diff(diff::DiffArgs),
    /// Unstage matching entries
    Reset(reset::ResetArgs),
    /// Upload local state to the remote
    Push(push::PushArgs),
    /// Mirror the remote state locally
    Pull(pull::PullArgs),
    /// Run the configured lint rules
    Lint(lint::LintArgs),
    /// Remove unreferenced packs and blobs
    Gc(gc::GcArgs),
}

pub fn run(cli: &Cli) -> Result<i32> {
    match &cli.command {
        Commands::Init(args) => init::run(args),
        Commands::Add(args) => add::run(args),
        Commands::Commit(args) => commit::run(args),
        Commands::Status(args) => status::run(args),
        Commands::Diff(args) => diff::run(args),
        Commands::Reset(args) => reset::run(args),
        Commands::Push(args) => push::run(args),
        Commands::Pull(args) => pull::run(args),
        Commands::Lint(args) => lint::run(args),
        Commands::Gc(args) => gc::run(args),
    }
}

/// Open the repository from the current directory.
pub fn open_repo() -> Result<Repository> {
    let cwd = std::env::current_dir()?;
    Ok(Repository::open(&cwd)?)
}

/// Positional pathspecs, defaulting to everything.
pub fn pathspecs(raw: &[String]) -> Result<PathSpecs> {
    if raw.is_empty() {
        return Ok(PathSpecs::any());
    }
    Ok(PathSpecs::parse_owned(raw)?)
}
