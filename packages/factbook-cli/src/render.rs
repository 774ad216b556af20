//! Markdown rendering for the terminal.
//!
//! Factbook sections and strategy bodies arrive as markdown; this flattens
//! them to ANSI-styled text. Only the constructs the backend actually emits
//! are styled (headings, emphasis, lists, inline and fenced code).

use pulldown_cmark::{Event, Options, Parser, Tag, TagEnd};

const BOLD: &str = "\x1b[1m";
const ITALIC: &str = "\x1b[3m";
const ITALIC_OFF: &str = "\x1b[23m";
const CYAN: &str = "\x1b[36m";
const RESET: &str = "\x1b[0m";

/// Render a markdown string for terminal display.
pub fn render_markdown(source: &str) -> String {
    let options = Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH;
    let parser = Parser::new_ext(source, options);

    let mut out = String::with_capacity(source.len());
    let mut list_depth: usize = 0;
    let mut in_code_block = false;

    for event in parser {
        match event {
            Event::Start(Tag::Heading { .. }) => {
                if !out.is_empty() {
                    out.push('\n');
                }
                out.push_str(BOLD);
            }
            Event::End(TagEnd::Heading(_)) => {
                out.push_str(RESET);
                out.push('\n');
            }
            Event::Start(Tag::Strong) => out.push_str(BOLD),
            Event::End(TagEnd::Strong) => out.push_str(RESET),
            Event::Start(Tag::Emphasis) => out.push_str(ITALIC),
            Event::End(TagEnd::Emphasis) => out.push_str(ITALIC_OFF),
            Event::Start(Tag::List(_)) => list_depth += 1,
            Event::End(TagEnd::List(_)) => {
                list_depth = list_depth.saturating_sub(1);
                if list_depth == 0 {
                    out.push('\n');
                }
            }
            Event::Start(Tag::Item) => {
                out.push_str(&"  ".repeat(list_depth.saturating_sub(1)));
                out.push_str("• ");
            }
            Event::End(TagEnd::Item) => out.push('\n'),
            Event::Start(Tag::CodeBlock(_)) => {
                in_code_block = true;
                out.push('\n');
            }
            Event::End(TagEnd::CodeBlock) => {
                in_code_block = false;
                out.push('\n');
            }
            Event::Text(text) => {
                if in_code_block {
                    for line in text.lines() {
                        out.push_str("    ");
                        out.push_str(line);
                        out.push('\n');
                    }
                } else {
                    out.push_str(&text);
                }
            }
            Event::Code(code) => {
                out.push_str(CYAN);
                out.push_str(&code);
                out.push_str(RESET);
            }
            Event::SoftBreak => out.push(' '),
            Event::HardBreak => out.push('\n'),
            Event::End(TagEnd::Paragraph) => out.push_str("\n\n"),
            Event::Rule => out.push_str("\n────────\n"),
            _ => {}
        }
    }

    let trimmed = out.trim_end();
    format!("{trimmed}\n")
}
