use anyhow::Result;
use clap::Args;

use super::{open_repo, pathspecs};

#[derive(Args)]
pub struct DiffArgs {
    /// Compare the staging area against the committed state
    #[arg(long)]
    staged: bool,

    #[arg(value_name = "pathspec")]
    paths: Vec<String>,
}

pub fn run(args: &DiffArgs) -> Result<i32> {
    let repo = open_repo()?;
    let specs = pathspecs(&args.paths)?;
    let diff = repo.diff(&specs, args.staged)?;
    print!("{diff}");
    Ok(0)
}
