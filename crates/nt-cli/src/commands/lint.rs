use anyhow::Result;
use clap::Args;

use nt_config::Severity;

use super::{open_repo, pathspecs};

#[derive(Args)]
pub struct LintArgs {
    #[arg(value_name = "pathspec")]
    paths: Vec<String>,
}

pub fn run(args: &LintArgs) -> Result<i32> {
    let mut repo = open_repo()?;
    let specs = pathspecs(&args.paths)?;
    let violations = repo.lint(&specs)?;
    for violation in &violations {
        println!("{violation}");
    }
    let errors = violations
        .iter()
        .filter(|v| v.severity == Severity::Error)
        .count();
    if errors > 0 {
        eprintln!("{errors} error(s)");
        return Ok(1);
    }
    Ok(0)
}
