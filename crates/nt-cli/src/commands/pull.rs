use anyhow::Result;
use clap::Args;

use super::open_repo;

#[derive(Args)]
pub struct PullArgs {
    /// Adopt the remote even when the local index is newer
    #[arg(long)]
    force: bool,
}

pub fn run(args: &PullArgs) -> Result<i32> {
    let mut repo = open_repo()?;
    repo.pull(args.force)?;
    Ok(0)
}
