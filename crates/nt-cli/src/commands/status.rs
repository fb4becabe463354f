use anyhow::Result;
use clap::Args;

use super::{open_repo, pathspecs};

#[derive(Args)]
pub struct StatusArgs {
    #[arg(value_name = "pathspec")]
    paths: Vec<String>,
}

pub fn run(args: &StatusArgs) -> Result<i32> {
    let repo = open_repo()?;
    let specs = pathspecs(&args.paths)?;
    let report = repo.status(&specs)?;
    print!("{report}");
    Ok(0)
}
