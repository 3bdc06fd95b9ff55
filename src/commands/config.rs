/// `config` subcommands: inspect and edit the flowctl configuration file.
use super::{Context, Outcome};
use crate::cli::args::{ConfigCommand, ConfigFormat};
use crate::config::Configuration;
use crate::errors::Result;
use crate::render::{print_block, serialize, syntax::highlight, tree::scalar_text};

/// Run a `config` subcommand.
///
/// # Errors
///
/// Returns `FlowctlError::ConfigFileDisabled` for edits with the config file
/// disabled, plus key, server and I/O errors.
pub fn run(command: &ConfigCommand, ctx: &mut Context) -> Result<Outcome> {
    match command {
        ConfigCommand::Show { format, raw } => {
            let text = serialize(&ctx.config, (*format).into())?;
            if *raw {
                println!("{text}");
            } else {
                let language = match format {
                    ConfigFormat::Yaml => "yaml",
                    ConfigFormat::Json => "json",
                };
                print_block(&highlight(&text, language)?);
            }
        }
        ConfigCommand::Get { key } => println!("{}", scalar_text(&ctx.config.get_by_key(key)?)),
        ConfigCommand::Current => println!("{}", ctx.config.current_server),
        ConfigCommand::Set { key, value } => {
            ctx.config.writable_path()?;
            let updated = ctx.config.set_by_key(key, value)?;
            save(ctx, updated)?;
        }
        ConfigCommand::Use { server } => edit(ctx, |config| config.use_server(server))?,
        ConfigCommand::Add { server, url } => edit(ctx, |config| config.add_server(server, url))?,
        ConfigCommand::Remove { server } => edit(ctx, |config| config.remove_server(server))?,
    }
    Ok(Outcome::Success)
}

/// Apply `change` to a copy of the configuration and persist it.
fn edit(ctx: &mut Context, change: impl FnOnce(&mut Configuration) -> Result<()>) -> Result<()> {
    ctx.config.writable_path()?;
    let mut updated = ctx.config.clone();
    change(&mut updated)?;
    save(ctx, updated)
}

fn save(ctx: &mut Context, updated: Configuration) -> Result<()> {
    updated.to_file(updated.writable_path()?)?;
    ctx.config = updated;
    Ok(())
}
