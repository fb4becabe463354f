use anyhow::Result;
use clap::Args;

use super::open_repo;

#[derive(Args)]
pub struct GcArgs {}

pub fn run(_args: &GcArgs) -> Result<i32> {
    let mut repo = open_repo()?;
    repo.gc()?;
    Ok(0)
}
