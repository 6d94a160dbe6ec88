// Answer text -> render segments -> styled terminal lines

use std::borrow::Cow;

use pulldown_cmark::{Event, HeadingLevel, Options, Parser, Tag};
use ratatui::{
    style::{Color, Modifier, Style},
    text::{Line, Span},
};

const FENCE: &str = "```";

/// A derived view of a turn's text. Recomputed on every draw, never stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderSegment {
    /// Prose, shown through [`render_markdown_to_lines`].
    Text(String),
    /// Fenced code, shown and copied verbatim.
    Code {
        language: Option<String>,
        code: String,
    },
}

impl RenderSegment {
    #[cfg(test)]
    pub fn code(code: impl Into<String>) -> Self {
        Self::Code {
            language: None,
            code: code.into(),
        }
    }
}

/// Split `text` on triple-backtick fences.
///
/// Text between an opening and a closing fence becomes a `Code` segment. An
/// opening fence without a partner is kept as prose, fence included.
pub fn render(text: &str) -> Vec<RenderSegment> {
    let mut segments = Vec::new();
    let mut rest = text;

    while let Some(open) = rest.find(FENCE) {
        let after_open = &rest[open + FENCE.len()..];
        let Some(close) = after_open.find(FENCE) else {
            break;
        };

        if open > 0 {
            segments.push(RenderSegment::Text(rest[..open].to_string()));
        }
        segments.push(code_segment(&after_open[..close]));
        rest = &after_open[close + FENCE.len()..];
    }

    if !rest.is_empty() || segments.is_empty() {
        segments.push(RenderSegment::Text(rest.to_string()));
    }

    segments
}

fn code_segment(body: &str) -> RenderSegment {
    // A language tag needs the closing fence on a line of its own
    let (language, code) = match body.split_once('\n') {
        Some((first, remainder)) if is_language_tag(first) && body.ends_with('\n') => {
            (Some(first.trim().to_string()), remainder)
        }
        _ => (None, body.strip_prefix('\n').unwrap_or(body)),
    };

    RenderSegment::Code {
        language,
        code: code.strip_suffix('\n').unwrap_or(code).to_string(),
    }
}

fn is_language_tag(line: &str) -> bool {
    let tag = line.trim();
    !tag.is_empty()
        && tag
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '#' | '-' | '_' | '.'))
}

/// Strip terminal escape sequences and control characters from remote text.
///
/// Newlines survive; tabs become four spaces.
pub fn sanitize(text: &str) -> Cow<'_, str> {
    if !text.chars().any(|c| c.is_control() && c != '\n') {
        return Cow::Borrowed(text);
    }

    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '\n' => out.push('\n'),
            '\t' => out.push_str("    "),
            '\u{1b}' => match chars.next() {
                // CSI: parameters then a final byte in @..~
                Some('[') => {
                    for c in chars.by_ref() {
                        if ('@'..='~').contains(&c) {
                            break;
                        }
                    }
                }
                // OSC / DCS / APC / PM: up to BEL or ST
                Some(']' | 'P' | '_' | '^') => {
                    while let Some(c) = chars.next() {
                        if c == '\u{7}' {
                            break;
                        }
                        if c == '\u{1b}' && chars.peek() == Some(&'\\') {
                            chars.next();
                            break;
                        }
                    }
                }
                _ => {}
            },
            c if c.is_control() => {}
            c => out.push(c),
        }
    }

    Cow::Owned(out)
}

/// Convert markdown text to ratatui Lines with styling
pub fn render_markdown_to_lines(markdown: &str) -> Vec<Line<'static>> {
    let source = sanitize(markdown);
    let options =
        Options::ENABLE_STRIKETHROUGH | Options::ENABLE_TABLES | Options::ENABLE_TASKLISTS;

    let mut writer = LineWriter::default();
    for event in Parser::new_ext(&source, options) {
        writer.handle(event);
    }
    writer.finish()
}

/// What an open `Start` tag contributes, popped again on its `End`.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Block {
    Paragraph,
    Heading,
    Quote,
    List,
    Item,
    CodeBlock,
    Table,
    TableHead,
    TableRow,
    /// Emphasis, strong or strikethrough: pops one style.
    Styled,
    Link { url: String, text_from: usize },
    Other,
}

#[derive(Default)]
struct LineWriter {
    lines: Vec<Line<'static>>,
    spans: Vec<Span<'static>>,
    styles: Vec<Style>,
    blocks: Vec<Block>,
    /// Next number for each open list, `None` for bullets.
    lists: Vec<Option<u64>>,
    quote_depth: usize,
    row_cells: usize,
    needs_gap: bool,
}

impl LineWriter {
    fn handle(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.start(tag),
            Event::End(_) => {
                if let Some(block) = self.blocks.pop() {
                    self.end(block);
                }
            }
            Event::Text(text) => {
                if self.blocks.contains(&Block::CodeBlock) {
                    self.code_text(&text);
                } else {
                    self.push_text(&text, self.style());
                }
            }
            Event::Code(code) => {
                let style = self.style().fg(Color::Magenta);
                self.push_text(&code, style);
            }
            Event::Html(html) => {
                self.push_text(html.trim_end_matches('\n'), self.style());
                self.break_line();
            }
            Event::InlineHtml(html) => self.push_text(&html, self.style()),
            Event::SoftBreak | Event::HardBreak => self.break_line(),
            Event::Rule => {
                self.break_line();
                self.push_span(Span::styled(
                    "─".repeat(40),
                    Style::default().fg(Color::DarkGray),
                ));
                self.break_line();
                self.needs_gap = true;
            }
            Event::TaskListMarker(done) => {
                let marker = if done { "[x] " } else { "[ ] " };
                self.push_text(marker, Style::default().fg(Color::Cyan));
            }
            _ => {}
        }
    }

    fn start(&mut self, tag: Tag<'_>) {
        let block = match tag {
            Tag::Paragraph => Block::Paragraph,
            Tag::Heading { level, .. } => {
                self.break_line();
                let color = match level {
                    HeadingLevel::H1 => Color::Yellow,
                    HeadingLevel::H2 => Color::Cyan,
                    _ => Color::Blue,
                };
                self.styles.push(Style::default().fg(color).add_modifier(Modifier::BOLD));
                Block::Heading
            }
            Tag::BlockQuote(_) => {
                self.break_line();
                self.quote_depth += 1;
                self.styles.push(Style::default().add_modifier(Modifier::ITALIC));
                Block::Quote
            }
            Tag::List(first) => {
                self.break_line();
                self.lists.push(first);
                Block::List
            }
            Tag::Item => {
                self.break_line();
                let depth = self.lists.len().saturating_sub(1);
                let marker = match self.lists.last_mut() {
                    Some(Some(number)) => {
                        let marker = format!("{number}. ");
                        *number += 1;
                        marker
                    }
                    _ => "• ".to_string(),
                };
                self.push_span(Span::styled(
                    format!("{}{marker}", "  ".repeat(depth)),
                    Style::default().fg(Color::Cyan),
                ));
                Block::Item
            }
            Tag::CodeBlock(_) => {
                self.break_line();
                Block::CodeBlock
            }
            Tag::Emphasis => self.styled(Style::default().add_modifier(Modifier::ITALIC)),
            Tag::Strong => {
                self.styled(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
            }
            Tag::Strikethrough => {
                self.styled(Style::default().add_modifier(Modifier::CROSSED_OUT))
            }
            Tag::Link { dest_url, .. } => {
                self.styles.push(
                    Style::default()
                        .fg(Color::Blue)
                        .add_modifier(Modifier::UNDERLINED),
                );
                Block::Link {
                    url: dest_url.to_string(),
                    text_from: self.spans.len(),
                }
            }
            Tag::Table(_) => {
                self.break_line();
                self.styles.push(Style::default().fg(Color::Cyan));
                Block::Table
            }
            Tag::TableHead => {
                self.row_cells = 0;
                self.styles.push(Style::default().add_modifier(Modifier::BOLD));
                Block::TableHead
            }
            Tag::TableRow => {
                self.row_cells = 0;
                Block::TableRow
            }
            Tag::TableCell => {
                let separator = if self.row_cells == 0 { "  " } else { " | " };
                self.push_text(separator, self.style());
                self.row_cells += 1;
                Block::Other
            }
            _ => Block::Other,
        };
        self.blocks.push(block);
    }

    fn end(&mut self, block: Block) {
        match block {
            Block::Paragraph | Block::CodeBlock => {
                self.break_line();
                self.needs_gap = true;
            }
            Block::Heading | Block::Table => {
                self.styles.pop();
                self.break_line();
                self.needs_gap = true;
            }
            Block::Quote => {
                self.styles.pop();
                self.break_line();
                self.quote_depth -= 1;
                self.needs_gap = true;
            }
            Block::List => {
                self.break_line();
                self.lists.pop();
                if self.lists.is_empty() {
                    self.needs_gap = true;
                }
            }
            Block::Item => self.break_line(),
            Block::TableHead => {
                self.styles.pop();
                self.break_line();
            }
            Block::TableRow => self.break_line(),
            Block::Styled => {
                self.styles.pop();
            }
            Block::Link { url, text_from } => {
                self.styles.pop();
                let text: String = self
                    .spans
                    .get(text_from..)
                    .unwrap_or_default()
                    .iter()
                    .map(|s| s.content.as_ref())
                    .collect();
                if !url.is_empty() && !text.ends_with(url.as_str()) {
                    self.push_text(&format!(" <{url}>"), Style::default().fg(Color::DarkGray));
                }
            }
            Block::Other => {}
        }
    }

    fn styled(&mut self, style: Style) -> Block {
        self.styles.push(style);
        Block::Styled
    }

    fn style(&self) -> Style {
        self.styles
            .iter()
            .fold(Style::default(), |acc, style| acc.patch(*style))
    }

    fn code_text(&mut self, text: &str) {
        for piece in text.split_inclusive('\n') {
            let code = piece.strip_suffix('\n');
            self.push_span(Span::styled(
                format!("    {}", code.unwrap_or(piece)),
                Style::default().fg(Color::Green),
            ));
            if code.is_some() {
                self.break_line();
            }
        }
    }

    fn push_text(&mut self, text: &str, style: Style) {
        if !text.is_empty() {
            self.push_span(Span::styled(text.to_string(), style));
        }
    }

    /// Adjacent spans of one style are merged, so parser text splits are invisible.
    fn push_span(&mut self, span: Span<'static>) {
        if self.spans.is_empty() {
            if self.needs_gap {
                self.lines.push(Line::from(""));
                self.needs_gap = false;
            }
            let prefix = self.line_prefix();
            self.spans.extend(prefix);
        }
        match self.spans.last_mut() {
            Some(last) if last.style == span.style => {
                last.content.to_mut().push_str(&span.content);
            }
            _ => self.spans.push(span),
        }
    }

    fn line_prefix(&self) -> Vec<Span<'static>> {
        let mut prefix = Vec::new();
        if self.quote_depth > 0 {
            prefix.push(Span::styled(
                "▎ ".repeat(self.quote_depth),
                Style::default().fg(Color::DarkGray),
            ));
        }
        // Continuation lines of a list item line up under its text
        if self.blocks.last() != Some(&Block::List) && !self.lists.is_empty() {
            prefix.push(Span::raw("  ".repeat(self.lists.len())));
        }
        prefix
    }

    fn break_line(&mut self) {
        if !self.spans.is_empty() {
            self.lines.push(Line::from(std::mem::take(&mut self.spans)));
        }
    }

    fn finish(mut self) -> Vec<Line<'static>> {
        self.break_line();
        self.lines
    }
}

/// Lines for one fenced block: header with the copy control, body, footer.
pub fn render_code_block(
    language: Option<&str>,
    code: &str,
    copied: bool,
    selected: bool,
) -> Vec<Line<'static>> {
    let frame_style = if selected {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    let control = if copied { "[Copied]" } else { "[Copy code]" };
    let control_style = if copied {
        Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::Gray)
    };

    let mut lines = Vec::new();
    lines.push(Line::from(vec![
        Span::styled(
            format!("┌─ {} ────────────── ", language.unwrap_or("code")),
            frame_style,
        ),
        Span::styled(control, control_style),
    ]));

    for code_line in sanitize(code).lines() {
        lines.push(Line::from(vec![
            Span::styled("│ ", frame_style),
            Span::styled(code_line.to_string(), Style::default().fg(Color::Green)),
        ]));
    }

    lines.push(Line::from(Span::styled(
        "└──────────────────────────────────────────────",
        frame_style,
    )));
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> RenderSegment {
        RenderSegment::Text(s.to_string())
    }

    fn line_text(line: &Line<'_>) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn test_render_without_fences_is_one_text_segment() {
        let input = "# Title\n\nSome **bold** prose\n- item";
        assert_eq!(render(input), vec![text(input)]);
        assert_eq!(
            render_markdown_to_lines(input),
            render_markdown_to_lines(match &render(input)[0] {
                RenderSegment::Text(t) => t,
                RenderSegment::Code { .. } => unreachable!(),
            })
        );
    }

    #[test]
    fn test_render_inline_fence() {
        assert_eq!(
            render("pre ```code``` post"),
            vec![text("pre "), RenderSegment::code("code"), text(" post")]
        );
    }

    #[test]
    fn test_render_language_tag() {
        let segments = render("Try:\n```rust\nfn main() {}\n```\nDone");
        assert_eq!(
            segments,
            vec![
                text("Try:\n"),
                RenderSegment::Code {
                    language: Some("rust".to_string()),
                    code: "fn main() {}".to_string(),
                },
                text("\nDone"),
            ]
        );
    }

    #[test]
    fn test_render_single_word_line_is_code_without_closing_newline() {
        assert_eq!(render("```ls\npwd```"), vec![RenderSegment::code("ls\npwd")]);
    }

    #[test]
    fn test_render_fence_without_language() {
        let segments = render("```\nlet x = 1;\n```");
        assert_eq!(segments, vec![RenderSegment::code("let x = 1;")]);
    }

    #[test]
    fn test_render_unterminated_fence_stays_text() {
        let segments = render("a ```one``` b ```two");
        assert_eq!(
            segments,
            vec![text("a "), RenderSegment::code("one"), text(" b ```two")]
        );
    }

    #[test]
    fn test_render_empty_input() {
        assert_eq!(render(""), vec![text("")]);
    }

    #[test]
    fn test_sanitize_strips_escape_sequences() {
        let hostile = "safe\u{1b}[2J\u{1b}]0;pwned\u{7}text\u{1b}[31mred\r\n";
        assert_eq!(sanitize(hostile), "safetextred\n");
    }

    #[test]
    fn test_sanitize_borrows_clean_text() {
        assert!(matches!(sanitize("plain\ntext"), Cow::Borrowed(_)));
        assert_eq!(sanitize("a\tb"), "a    b");
    }

    #[test]
    fn test_render_plain_text() {
        let lines = render_markdown_to_lines("Hello world");
        assert_eq!(lines.len(), 1);
        assert_eq!(line_text(&lines[0]), "Hello world");
    }

    #[test]
    fn test_render_bold_and_italic() {
        let lines = render_markdown_to_lines("This is **bold** and *soft*");
        let spans = &lines[0].spans;
        assert_eq!(spans[1].content, "bold");
        assert!(spans[1].style.add_modifier.contains(Modifier::BOLD));
        assert_eq!(spans[3].content, "soft");
        assert!(spans[3].style.add_modifier.contains(Modifier::ITALIC));
    }

    #[test]
    fn test_unclosed_emphasis_is_literal() {
        let lines = render_markdown_to_lines("2 * 3 and **open");
        assert_eq!(line_text(&lines[0]), "2 * 3 and **open");
    }

    #[test]
    fn test_snake_case_is_not_italic() {
        let lines = render_markdown_to_lines("call my_var_name now");
        assert_eq!(line_text(&lines[0]), "call my_var_name now");
        assert_eq!(lines[0].spans.len(), 1);
    }

    #[test]
    fn test_render_inline_code() {
        let lines = render_markdown_to_lines("Use `println!` macro");
        assert_eq!(lines[0].spans[1].content, "println!");
    }

    #[test]
    fn test_render_header() {
        let lines = render_markdown_to_lines("## Header");
        assert_eq!(line_text(&lines[0]), "Header");
        assert!(lines[0].spans[0].style.add_modifier.contains(Modifier::BOLD));
        assert_eq!(line_text(&render_markdown_to_lines("#hashtag")[0]), "#hashtag");
    }

    #[test]
    fn test_render_lists() {
        let lines = render_markdown_to_lines("- first\n  * nested\n\n1. one\n2. two");
        let text: Vec<String> = lines.iter().map(line_text).collect();
        assert_eq!(text, ["• first", "  • nested", "", "1. one", "2. two"]);
    }

    #[test]
    fn test_render_blockquote_and_rule() {
        let lines = render_markdown_to_lines("> quoted\n---");
        assert_eq!(line_text(&lines[0]), "▎ quoted");
        assert!(lines[0].spans[1].style.add_modifier.contains(Modifier::ITALIC));
        assert!(line_text(lines.last().unwrap()).starts_with('─'));
    }

    #[test]
    fn test_nested_emphasis() {
        let lines = render_markdown_to_lines("**a *b* c**");
        let spans = &lines[0].spans;
        assert_eq!(line_text(&lines[0]), "a b c");
        assert_eq!(spans[1].content, "b");
        assert!(spans[1].style.add_modifier.contains(Modifier::BOLD | Modifier::ITALIC));
        assert!(spans[2].style.add_modifier.contains(Modifier::BOLD));
        assert!(!spans[2].style.add_modifier.contains(Modifier::ITALIC));
    }

    #[test]
    fn test_emphasis_across_lines() {
        let lines = render_markdown_to_lines("*one\ntwo*");
        assert_eq!(lines.len(), 2);
        assert!(lines
            .iter()
            .all(|line| line.spans[0].style.add_modifier.contains(Modifier::ITALIC)));
    }

    #[test]
    fn test_render_links() {
        let lines =
            render_markdown_to_lines("See [docs](https://example.com) or <https://a.io>");
        assert_eq!(
            line_text(&lines[0]),
            "See docs <https://example.com> or https://a.io"
        );
        assert!(lines[0].spans[1].style.add_modifier.contains(Modifier::UNDERLINED));
    }

    #[test]
    fn test_render_table() {
        let lines = render_markdown_to_lines("| A | B |\n|---|---|\n| 1 | 2 |");
        let text: Vec<String> = lines.iter().map(line_text).collect();
        assert_eq!(text, ["  A | B", "  1 | 2"]);
        assert!(lines[0].spans[0].style.add_modifier.contains(Modifier::BOLD));
        assert_eq!(lines[1].spans[0].style.fg, Some(Color::Cyan));
    }

    #[test]
    fn test_paragraphs_are_separated() {
        let lines = render_markdown_to_lines("first\n\nsecond");
        let text: Vec<String> = lines.iter().map(line_text).collect();
        assert_eq!(text, ["first", "", "second"]);
    }

    #[test]
    fn test_markup_is_shown_as_text() {
        let lines = render_markdown_to_lines("a <b>bold</b> claim");
        assert_eq!(line_text(&lines[0]), "a <b>bold</b> claim");
    }

    #[test]
    fn test_code_block_copy_control() {
        let idle = render_code_block(Some("rust"), "let a = 1;\nlet b = 2;", false, false);
        assert_eq!(idle.len(), 4);
        assert!(line_text(&idle[0]).contains("rust"));
        assert!(line_text(&idle[0]).ends_with("[Copy code]"));
        assert_eq!(line_text(&idle[2]), "│ let b = 2;");

        let copied = render_code_block(None, "x", true, true);
        assert!(line_text(&copied[0]).contains("code"));
        assert!(line_text(&copied[0]).ends_with("[Copied]"));
    }
}
