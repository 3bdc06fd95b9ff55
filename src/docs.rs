/// Markdown reference generated from the clap command tree.
use std::fmt::Write as _;

use clap::{Arg, ArgAction, Command, ValueEnum};

/// HTML entity for `|`, so choices do not break markdown table cells.
const HTML_PIPE: &str = "&#x7C;";

/// Layout of the options section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum DocsStyle {
    /// Bullet list of options.
    #[default]
    Simple,
    /// Table with type, description and default columns.
    Table,
}

/// Generate the markdown reference for `command` and its visible subcommands.
#[must_use]
pub fn generate(mut command: Command, style: DocsStyle) -> String {
    command.build();
    let name = command.get_name().to_owned();
    let mut docs = String::new();
    write_command(&mut docs, &command, &name, 0, style);
    format!("{}\n", docs.trim())
}

fn write_command(docs: &mut String, cmd: &Command, full_name: &str, depth: usize, style: DocsStyle) {
    if depth > 0 {
        docs.push_str("---\n\n");
    }
    let _ = writeln!(docs, "{} `{full_name}`\n", "#".repeat(depth + 1));

    if let Some(about) = cmd.get_long_about().or_else(|| cmd.get_about()) {
        let _ = writeln!(docs, "{about}\n");
    }

    let _ = writeln!(docs, "**Usage**:\n\n```bash\n$ {}\n```\n", usage(cmd, full_name));

    let (positionals, options): (Vec<&Arg>, Vec<&Arg>) = cmd
        .get_arguments()
        .filter(|a| !a.is_hide_set() && !is_builtin(a))
        .partition(|a| a.is_positional());

    if !positionals.is_empty() {
        docs.push_str("**Arguments**:\n\n");
        for arg in &positionals {
            let _ = write!(docs, "* `{}`", value_name(arg));
            if let Some(help) = arg.get_help() {
                let _ = write!(docs, ": {help}");
            }
            docs.push('\n');
        }
        docs.push('\n');
    }

    if !options.is_empty() {
        docs.push_str("**Options**:\n\n");
        match style {
            DocsStyle::Simple => {
                for arg in &options {
                    let _ = write!(docs, "* `{}`", option_names(arg));
                    if let Some(help) = arg.get_help() {
                        let _ = write!(docs, ": {help}");
                    }
                    docs.push('\n');
                }
            }
            DocsStyle::Table => {
                docs.push_str("| Name | Type | Description | Default |\n");
                docs.push_str("| ---- | ---- | ----------- | ------- |\n");
                for arg in &options {
                    let _ = writeln!(
                        docs,
                        "| `{}` | {} | {} | **{}** |",
                        option_names(arg),
                        option_type(arg),
                        arg.get_help().map(ToString::to_string).unwrap_or_default(),
                        default_value(arg),
                    );
                }
            }
        }
        docs.push('\n');
    }

    let subcommands: Vec<&Command> = visible_subcommands(cmd).collect();
    if !subcommands.is_empty() {
        docs.push_str("**Commands**:\n\n");
        for sub in &subcommands {
            let _ = write!(docs, "* `{}`", sub.get_name());
            if let Some(about) = sub.get_about() {
                let _ = write!(docs, ": {about}");
            }
            docs.push('\n');
        }
        docs.push('\n');

        for sub in subcommands {
            let sub_name = format!("{full_name} {}", sub.get_name());
            write_command(docs, sub, &sub_name, depth + 1, style);
        }
    }
}

fn visible_subcommands(cmd: &Command) -> impl Iterator<Item = &Command> {
    cmd.get_subcommands()
        .filter(|s| !s.is_hide_set() && s.get_name() != "help")
}

fn is_builtin(arg: &Arg) -> bool {
    matches!(arg.get_action(), ArgAction::Help | ArgAction::HelpShort | ArgAction::HelpLong | ArgAction::Version)
}

fn usage(cmd: &Command, full_name: &str) -> String {
    let mut pieces = vec![full_name.to_owned()];
    if cmd.get_arguments().any(|a| !a.is_positional() && !a.is_hide_set()) {
        pieces.push("[OPTIONS]".to_owned());
    }
    for arg in cmd.get_arguments().filter(|a| a.is_positional() && !a.is_hide_set()) {
        let name = value_name(arg);
        let repeat = if takes_many(arg) { "..." } else { "" };
        if arg.is_required_set() {
            pieces.push(format!("<{name}>{repeat}"));
        } else {
            pieces.push(format!("[{name}]{repeat}"));
        }
    }
    if visible_subcommands(cmd).next().is_some() {
        pieces.push("<COMMAND>".to_owned());
    }
    pieces.join(" ")
}

fn takes_many(arg: &Arg) -> bool {
    matches!(arg.get_action(), ArgAction::Append)
        || arg.get_num_args().is_some_and(|range| range.max_values() > 1)
}

fn value_name(arg: &Arg) -> String {
    arg.get_value_names()
        .and_then(|names| names.first())
        .map_or_else(|| arg.get_id().as_str().to_uppercase(), ToString::to_string)
}

fn option_names(arg: &Arg) -> String {
    let mut names = Vec::new();
    if let Some(short) = arg.get_short() {
        names.push(format!("-{short}"));
    }
    if let Some(long) = arg.get_long() {
        names.push(format!("--{long}"));
    }
    if takes_value(arg) {
        format!("{} <{}>", names.join(", "), value_name(arg))
    } else {
        names.join(", ")
    }
}

fn takes_value(arg: &Arg) -> bool {
    !matches!(
        arg.get_action(),
        ArgAction::SetTrue | ArgAction::SetFalse | ArgAction::Count
    ) && !is_builtin(arg)
}

fn option_type(arg: &Arg) -> String {
    if !takes_value(arg) {
        return "boolean".to_owned();
    }
    let choices: Vec<String> = arg
        .get_possible_values()
        .iter()
        .filter(|v| !v.is_hide_set())
        .map(|v| format!("`{}`", v.get_name()))
        .collect();
    if choices.is_empty() {
        value_name(arg).to_lowercase()
    } else {
        format!("choice ({})", choices.join(&format!(" {HTML_PIPE} ")))
    }
}

fn default_value(arg: &Arg) -> String {
    let defaults: Vec<String> = arg
        .get_default_values()
        .iter()
        .map(|v| v.to_string_lossy().into_owned())
        .collect();
    if defaults.is_empty() {
        "None".to_owned()
    } else {
        defaults.join(", ")
    }
}
