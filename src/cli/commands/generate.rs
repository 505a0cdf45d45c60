//! `passvault generate` — print a random password without storing it.

use crate::cli::{Cli, Context, GeneratorArgs};
use crate::errors::Result;
use crate::generator;

/// Execute the `generate` command.
pub fn execute(cli: &Cli, generator_args: &GeneratorArgs) -> Result<()> {
    let ctx = Context::load(cli)?;
    let password = generator::generate(&generator_args.options(&ctx.settings))?;
    println!("{}", password.as_str());
    Ok(())
}
