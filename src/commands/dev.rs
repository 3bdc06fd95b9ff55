/// Hidden `dev` subcommands for maintainers.
use clap::CommandFactory;
use tracing::info;

use super::Outcome;
use crate::cli::Cli;
use crate::cli::args::DevCommand;
use crate::docs::{DocsStyle, generate};
use crate::errors::Result;
use crate::render::{markdown::render_markdown, print_block};

/// Run a `dev` subcommand.
///
/// # Errors
///
/// Returns I/O errors from writing the docs file.
pub fn run(command: &DevCommand) -> Result<Outcome> {
    match command {
        DevCommand::Docs { output, style } => match output {
            Some(path) => {
                std::fs::write(path, generate(Cli::command(), *style))?;
                info!(path = %path.display(), "Wrote CLI documentation");
            }
            None => print_block(&render_markdown(&generate(Cli::command(), DocsStyle::Simple))),
        },
    }
    Ok(Outcome::Success)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_docs_written_to_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("cli.md");
        let command = DevCommand::Docs {
            output: Some(path.clone()),
            style: DocsStyle::Table,
        };
        assert_eq!(run(&command).unwrap(), Outcome::Success);

        let docs = std::fs::read_to_string(path).unwrap();
        assert!(docs.starts_with("# `flowctl`\n"));
        assert!(docs.contains("## `flowctl get`"));
        assert!(!docs.contains("`flowctl dev`"));
    }

    #[test]
    fn test_printed_docs_are_rendered() {
        console::set_colors_enabled(false);
        let rendered = render_markdown(&generate(Cli::command(), DocsStyle::Simple));
        let plain = console::strip_ansi_codes(&rendered);
        assert!(plain.starts_with("flowctl\n"));
        assert!(plain.contains("flowctl get"));
        assert!(!plain.contains("## "));
        assert!(!plain.contains("```"));

        let command = DevCommand::Docs {
            output: None,
            style: DocsStyle::Table,
        };
        assert_eq!(run(&command).unwrap(), Outcome::Success);
    }
}
