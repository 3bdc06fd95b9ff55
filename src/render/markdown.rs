/// Markdown rendered for the terminal: styled headings and inline code,
/// bulleted lists, indented code blocks and tables.
use std::mem;

use console::Style;
use pulldown_cmark::{Event, HeadingLevel, Options, Parser, Tag, TagEnd};

use super::table::{TableStyle, build_table};

const RULE_WIDTH: usize = 40;
const CODE_INDENT: &str = "    ";

/// Render markdown for the terminal, styled when colours are enabled.
#[must_use]
pub fn render_markdown(text: &str) -> String {
    render_styled(text, console::colors_enabled())
}

fn render_styled(text: &str, colored: bool) -> String {
    let mut renderer = Renderer {
        colored,
        ..Renderer::default()
    };
    for event in Parser::new_ext(text, Options::ENABLE_TABLES) {
        renderer.event(&event);
    }
    format!("{}\n", renderer.out.trim_end())
}

#[derive(Debug, Default)]
struct TableBuffer {
    head: Vec<String>,
    rows: Vec<Vec<String>>,
    row: Vec<String>,
    cell: String,
}

#[derive(Debug, Default)]
struct Renderer {
    out: String,
    colored: bool,
    heading: Option<HeadingLevel>,
    strong: usize,
    emphasis: usize,
    code_block: bool,
    /// Next number of each open list; `None` for bullet lists.
    lists: Vec<Option<u64>>,
    table: Option<TableBuffer>,
}

impl Renderer {
    fn event(&mut self, event: &Event<'_>) {
        match event {
            Event::Start(tag) => self.start(tag),
            Event::End(tag) => self.end(*tag),
            Event::Text(text) if self.code_block => {
                for line in text.lines() {
                    let line = self.paint(&Style::new().dim(), line);
                    self.push(&format!("{CODE_INDENT}{line}\n"));
                }
            }
            Event::Text(text) => {
                let text = self.paint(&self.inline_style(), text);
                self.push(&text);
            }
            Event::Code(code) => {
                let code = self.paint(&self.inline_style().cyan(), code);
                self.push(&code);
            }
            Event::Html(html) | Event::InlineHtml(html) => self.push(html),
            Event::SoftBreak => self.push(" "),
            Event::HardBreak => self.push("\n"),
            Event::Rule => {
                let rule = self.paint(&Style::new().dim(), &"─".repeat(RULE_WIDTH));
                self.push(&format!("{rule}\n\n"));
            }
            _ => {}
        }
    }

    fn start(&mut self, tag: &Tag<'_>) {
        match tag {
            Tag::Heading { level, .. } => self.heading = Some(*level),
            Tag::Strong => self.strong += 1,
            Tag::Emphasis => self.emphasis += 1,
            Tag::CodeBlock(_) => self.code_block = true,
            Tag::List(start) => {
                if !self.lists.is_empty() && !self.out.ends_with('\n') {
                    self.out.push('\n');
                }
                self.lists.push(*start);
            }
            Tag::Item => {
                let indent = "  ".repeat(self.lists.len().saturating_sub(1));
                let marker = match self.lists.last_mut() {
                    Some(Some(number)) => {
                        let marker = format!("{number}. ");
                        *number += 1;
                        marker
                    }
                    _ => "• ".to_owned(),
                };
                self.out.push_str(&indent);
                self.out.push_str(&marker);
            }
            Tag::Table(_) => self.table = Some(TableBuffer::default()),
            _ => {}
        }
    }

    fn end(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Heading(_) => {
                self.heading = None;
                self.out.push_str("\n\n");
            }
            TagEnd::Paragraph => {
                let gap = if self.lists.is_empty() { "\n\n" } else { "\n" };
                self.out.push_str(gap);
            }
            TagEnd::Strong => self.strong = self.strong.saturating_sub(1),
            TagEnd::Emphasis => self.emphasis = self.emphasis.saturating_sub(1),
            TagEnd::CodeBlock => {
                self.code_block = false;
                self.out.push('\n');
            }
            TagEnd::Item => {
                if !self.out.ends_with('\n') {
                    self.out.push('\n');
                }
            }
            TagEnd::List(_) => {
                self.lists.pop();
                if self.lists.is_empty() {
                    self.out.push('\n');
                }
            }
            TagEnd::TableCell => {
                if let Some(table) = self.table.as_mut() {
                    let cell = mem::take(&mut table.cell);
                    table.row.push(cell.trim().to_owned());
                }
            }
            TagEnd::TableHead => {
                if let Some(table) = self.table.as_mut() {
                    table.head = mem::take(&mut table.row);
                }
            }
            TagEnd::TableRow => {
                if let Some(table) = self.table.as_mut() {
                    let row = mem::take(&mut table.row);
                    table.rows.push(row);
                }
            }
            TagEnd::Table => {
                if let Some(table) = self.table.take() {
                    let rendered = build_table(&table.head, &table.rows, TableStyle::default());
                    self.out.push_str(&format!("{rendered}\n\n"));
                }
            }
            _ => {}
        }
    }

    fn inline_style(&self) -> Style {
        let mut style = Style::new();
        match self.heading {
            Some(HeadingLevel::H1) => style = style.bold().underlined(),
            Some(_) => style = style.bold(),
            None => {}
        }
        if self.strong > 0 {
            style = style.bold();
        }
        if self.emphasis > 0 {
            style = style.italic();
        }
        style
    }

    fn paint(&self, style: &Style, text: &str) -> String {
        style.apply_to(text).force_styling(self.colored).to_string()
    }

    /// Append to the open table cell, or to the output.
    fn push(&mut self, text: &str) {
        match self.table.as_mut() {
            Some(table) => table.cell.push_str(text),
            None => self.out.push_str(text),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_renders_blocks_as_plain_text() {
        let md = "\
# `flowctl`

Manage Flowdapt.

**Usage**:

```bash
$ flowctl get KIND
```

* `--format`: Output format
* `--select`
";
        let expected = "\
flowctl

Manage Flowdapt.

Usage:

    $ flowctl get KIND

• --format: Output format
• --select
";
        assert_eq!(render_styled(md, false), expected);
    }

    #[test]
    fn test_nested_and_numbered_lists() {
        let md = "1. one\n2. two\n   - inner\n";
        assert_eq!(render_styled(md, false), "1. one\n2. two\n  • inner\n");
    }

    #[test]
    fn test_tables_and_entities() {
        let md = "| Name | Choices |\n|---|---|\n| `--format` | json&#x7C;yaml |\n";
        let out = render_styled(md, false);
        let plain = console::strip_ansi_codes(&out);
        assert!(plain.contains("Name"));
        assert!(plain.contains("json|yaml"));
        assert!(!plain.contains("---"));
    }

    #[test]
    fn test_styles_when_coloured() {
        let out = render_styled("# Title\n\nSome **bold** and `code`.\n", true);
        assert!(out.contains("\u{1b}[1m"));
        assert!(out.contains("\u{1b}[36m"));
        assert_eq!(console::strip_ansi_codes(&out), "Title\n\nSome bold and code.\n");
    }
}
