/// Line-numbered, syntax-highlighted YAML and JSON documents.
use std::fmt::Write as _;
use std::sync::LazyLock;

use console::style;
use syntect::easy::HighlightLines;
use syntect::highlighting::{Style, Theme, ThemeSet};
use syntect::parsing::SyntaxSet;
use syntect::util::{LinesWithEndings, as_24_bit_terminal_escaped};

use crate::errors::{FlowctlError, Result};

const THEME: &str = "base16-ocean.dark";
const RESET: &str = "\u{1b}[0m";

static SYNTAXES: LazyLock<SyntaxSet> = LazyLock::new(SyntaxSet::load_defaults_newlines);
static THEMES: LazyLock<ThemeSet> = LazyLock::new(ThemeSet::load_defaults);

/// Number each line of `text` and highlight it as `language` (a file
/// extension such as `yaml` or `json`). Plain text when colours are off.
///
/// # Errors
///
/// Returns `FlowctlError::Render` when the highlighter fails on a line.
pub fn highlight(text: &str, language: &str) -> Result<String> {
    highlight_lines(text, language, console::colors_enabled())
}

fn highlight_lines(text: &str, language: &str, colored: bool) -> Result<String> {
    let total = text.lines().count();
    let digits = total.to_string().len();
    let mut out = String::new();

    let mut highlighter = colored
        .then(|| theme().map(|theme| HighlightLines::new(syntax_for(language), theme)))
        .flatten();

    for (i, line) in LinesWithEndings::from(text).enumerate() {
        let number = format!("{:>digits$}", i + 1);
        let body = match highlighter.as_mut() {
            Some(h) => {
                let ranges: Vec<(Style, &str)> = h
                    .highlight_line(line, &SYNTAXES)
                    .map_err(|e| FlowctlError::render("syntax", e.to_string()))?;
                let escaped = as_24_bit_terminal_escaped(&ranges, false);
                format!("{}{RESET}", escaped.trim_end_matches(['\n', '\r']))
            }
            None => line.trim_end_matches(['\n', '\r']).to_owned(),
        };
        let _ = writeln!(
            out,
            "{} {} {body}",
            style(number).dim().force_styling(colored),
            style("│").dim().force_styling(colored)
        );
    }

    Ok(out)
}

fn syntax_for(language: &str) -> &'static syntect::parsing::SyntaxReference {
    SYNTAXES
        .find_syntax_by_extension(language)
        .unwrap_or_else(|| SYNTAXES.find_syntax_plain_text())
}

fn theme() -> Option<&'static Theme> {
    THEMES.themes.get(THEME)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const CONFIG: &str = "servers:\n- name: default\n  url: http://localhost:8080\ncurrent_server: default\n";

    #[test]
    fn test_numbers_lines() {
        let expected = "\
1 │ servers:
2 │ - name: default
3 │   url: http://localhost:8080
4 │ current_server: default
";
        assert_eq!(highlight_lines(CONFIG, "yaml", false).unwrap(), expected);
    }

    #[test]
    fn test_colours_yaml_and_keeps_text() {
        let out = highlight_lines(CONFIG, "yaml", true).unwrap();
        assert!(out.contains("\u{1b}[38;2;"));
        let plain = highlight_lines(CONFIG, "yaml", false).unwrap();
        assert_eq!(console::strip_ansi_codes(&out), plain);
    }

    #[test]
    fn test_json_and_unknown_language() {
        let json = "{\n  \"current_server\": \"default\"\n}";
        let out = highlight_lines(json, "json", true).unwrap();
        assert!(out.contains("\u{1b}[38;2;"));
        assert!(highlight_lines(json, "nope", true).is_ok());
    }

    #[test]
    fn test_pads_line_numbers() {
        let text = (1..=10).map(|i| format!("k{i}: {i}")).collect::<Vec<_>>().join("\n");
        let out = highlight_lines(&text, "yaml", false).unwrap();
        assert!(out.starts_with(" 1 │ k1: 1\n"));
        assert!(out.ends_with("10 │ k10: 10\n"));
    }
}
