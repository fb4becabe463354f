use anyhow::Result;
use clap::Args;

use super::open_repo;

#[derive(Args)]
pub struct PushArgs {
    /// Overwrite the remote even when it is newer
    #[arg(long)]
    force: bool,
}

pub fn run(args: &PushArgs) -> Result<i32> {
    let mut repo = open_repo()?;
    repo.push(args.force)?;
    Ok(0)
}
