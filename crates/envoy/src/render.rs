use crossterm::{
    queue,
    style::{Color, Print, PrintStyledContent, ResetColor, SetForegroundColor, Stylize},
};
use once_cell::sync::Lazy;
use regex::Regex;
use std::io::{self, Write};

static CODE_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"```(\w+)?\n((?s:.*?))```").expect("valid code fence pattern"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodeBlock<'a> {
    /// The whole fenced region, backticks included.
    pub source: &'a str,
    pub language: Option<&'a str>,
    pub code: &'a str,
}

impl CodeBlock<'_> {
    pub fn language_label(&self) -> &str {
        self.language.unwrap_or("text")
    }

    pub fn header(&self) -> String {
        format!("{} Example", self.language_label().to_uppercase())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'a> {
    Prose(&'a str),
    Code(CodeBlock<'a>),
}

impl<'a> Segment<'a> {
    pub fn source(&self) -> &'a str {
        match self {
            Segment::Prose(text) => text,
            Segment::Code(block) => block.source,
        }
    }
}

/// Splits `text` into prose and fenced code, borrowing every span from the input.
/// Joining the `source` of each segment reproduces `text` exactly.
pub fn split_code_blocks(text: &str) -> Vec<Segment<'_>> {
    let mut segments = Vec::new();
    let mut last = 0;

    for caps in CODE_FENCE.captures_iter(text) {
        let Some(whole) = caps.get(0) else { continue };
        if whole.start() > last {
            segments.push(Segment::Prose(&text[last..whole.start()]));
        }
        segments.push(Segment::Code(CodeBlock {
            source: whole.as_str(),
            language: caps.get(1).map(|m| m.as_str()),
            code: caps.get(2).map_or("", |m| m.as_str()),
        }));
        last = whole.end();
    }

    if last < text.len() {
        segments.push(Segment::Prose(&text[last..]));
    }
    segments
}

/// Writes an assistant reply with code blocks framed and line-numbered.
pub fn render_reply<W: Write>(out: &mut W, text: &str) -> io::Result<()> {
    for segment in split_code_blocks(text) {
        match segment {
            Segment::Prose(prose) => queue!(out, Print(prose))?,
            Segment::Code(block) => render_code_block(out, &block)?,
        }
    }
    queue!(out, Print("\n"))?;
    out.flush()
}

fn render_code_block<W: Write>(out: &mut W, block: &CodeBlock<'_>) -> io::Result<()> {
    let lines: Vec<&str> = block.code.lines().collect();
    let width = lines.len().to_string().len();

    queue!(
        out,
        Print("\n"),
        PrintStyledContent(block.header().bold()),
        Print("\n")
    )?;
    for (n, line) in lines.iter().enumerate() {
        queue!(
            out,
            SetForegroundColor(Color::DarkGrey),
            Print(format!("{:>width$} │ ", n + 1, width = width)),
            ResetColor,
            SetForegroundColor(Color::Cyan),
            Print(line),
            ResetColor,
            Print("\n")
        )?;
    }
    Ok(())
}
