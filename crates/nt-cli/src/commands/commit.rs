use anyhow::Result;
use clap::Args;

use super::open_repo;

#[derive(Args)]
pub struct CommitArgs {
    /// Commit message (informational; the store keeps no commit graph)
    #[arg(short = 'm', long = "message")]
    message: Option<String>,
}

pub fn run(args: &CommitArgs) -> Result<i32> {
    let mut repo = open_repo()?;
    repo.commit()?;
    if let Some(message) = &args.message {
        tracing::info!("committed: {message}");
    }
    Ok(0)
}
