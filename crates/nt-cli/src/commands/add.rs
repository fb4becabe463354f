use anyhow::Result;
use clap::Args;

use super::{open_repo, pathspecs};

#[derive(Args)]
pub struct AddArgs {
    /// Paths to stage
    #[arg(value_name = "pathspec")]
    paths: Vec<String>,
}

pub fn run(args: &AddArgs) -> Result<i32> {
    let mut repo = open_repo()?;
    let specs = pathspecs(&args.paths)?;
    repo.add(&specs)?;
    Ok(0)
}
