use anyhow::Result;
use clap::Args;

use nt_repository::Repository;

#[derive(Args)]
pub struct InitArgs {}

pub fn run(_args: &InitArgs) -> Result<i32> {
    let cwd = std::env::current_dir()?;
    Repository::init(&cwd)?;
    println!("Initialized empty NoteWriter repository in {}", cwd.join(".nt").display());
    Ok(0)
}
