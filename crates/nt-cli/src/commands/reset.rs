use anyhow::Result;
use clap::Args;

use super::{open_repo, pathspecs};

#[derive(Args)]
pub struct ResetArgs {
    #[arg(value_name = "pathspec")]
    paths: Vec<String>,
}

pub fn run(args: &ResetArgs) -> Result<i32> {
    let mut repo = open_repo()?;
    let specs = pathspecs(&args.paths)?;
    repo.reset(&specs)?;
    Ok(0)
}
