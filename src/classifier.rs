use once_cell::sync::Lazy;
use regex::Regex;

use crate::inline;
use crate::token::{Alignment, Token};

static ORDERED_PREFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+\.\s").unwrap());
static IMAGE_LINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^!\[([^\]]*)\]\(([^)]*)\)$").unwrap());

/// Strip YAML frontmatter from the beginning of markdown content
fn strip_frontmatter(markdown: &str) -> &str {
    if !markdown.starts_with("---") {
        return markdown;
    }
    // Find the closing ---
    if let Some(end) = markdown[3..].find("\n---") {
        // Skip past the closing --- and any trailing newline
        let after_frontmatter = &markdown[3 + end + 4..];
        after_frontmatter.trim_start_matches('\n')
    } else {
        markdown
    }
}

/// Classify markdown text into a flat token stream.
pub(crate) fn classify(markdown: &str) -> Vec<Token> {
    Classifier::new(strip_frontmatter(markdown)).run()
}

/// Line-by-line dispatch state: a cursor over the input lines, the
/// paragraph accumulation buffer, and the tokens emitted so far.
struct Classifier<'a> {
    lines: Vec<&'a str>,
    pos: usize,
    paragraph: Vec<&'a str>,
    tokens: Vec<Token>,
}

impl<'a> Classifier<'a> {
    fn new(markdown: &'a str) -> Self {
        Self {
            lines: markdown.lines().collect(),
            pos: 0,
            paragraph: Vec::new(),
            tokens: Vec::new(),
        }
    }

    fn run(mut self) -> Vec<Token> {
        while self.pos < self.lines.len() {
            let line = self.lines[self.pos];
            let trimmed = line.trim();

            if let Some(tag) = fence_marker(trimmed) {
                self.consume_code_block(tag);
            } else if trimmed.is_empty() {
                self.flush_paragraph();
                self.pos += 1;
            } else if is_horizontal_rule(trimmed) {
                self.flush_paragraph();
                self.tokens.push(Token::HorizontalRule);
                self.pos += 1;
            } else if let Some((level, text)) = heading_parts(trimmed) {
                self.flush_paragraph();
                let spans = inline::resolve(text);
                self.tokens.push(Token::Heading {
                    level,
                    text: text.to_string(),
                    spans,
                    line: self.pos + 1,
                });
                self.pos += 1;
            } else if let Some(rest) = trimmed.strip_prefix('>') {
                self.flush_paragraph();
                let text = rest.trim().to_string();
                let spans = inline::resolve(&text);
                self.tokens.push(Token::Blockquote { text, spans });
                self.pos += 1;
            } else if is_unordered_item(trimmed) {
                self.consume_list_item(line, false);
            } else if is_ordered_item(trimmed) {
                self.consume_list_item(line, true);
            } else if let Some(caps) = IMAGE_LINE.captures(trimmed) {
                self.flush_paragraph();
                self.tokens.push(Token::Image {
                    alt: caps[1].to_string(),
                    url: caps[2].to_string(),
                });
                self.pos += 1;
            } else if trimmed.contains('|') && self.next_is_separator() {
                self.consume_table();
            } else {
                self.paragraph.push(line);
                self.pos += 1;
            }
        }
        self.flush_paragraph();

        log::debug!(
            "classified {} lines into {} tokens",
            self.lines.len(),
            self.tokens.len()
        );
        self.tokens
    }

    /// Consume a fenced code block; interior lines are kept verbatim. An
    /// unterminated fence still flushes whatever was buffered.
    fn consume_code_block(&mut self, tag: &str) {
        self.flush_paragraph();
        let language = if tag.is_empty() {
            None
        } else {
            Some(tag.to_string())
        };
        self.pos += 1;

        let mut body: Vec<&str> = Vec::new();
        while self.pos < self.lines.len() {
            let line = self.lines[self.pos];
            self.pos += 1;
            if fence_marker(line.trim()).is_some() {
                break;
            }
            body.push(line);
        }

        self.tokens.push(Token::CodeBlock {
            language,
            code: body.join("\n"),
        });
    }

    /// Consume a list item and any continuation lines indented past the
    /// item's own level.
    fn consume_list_item(&mut self, line: &str, ordered: bool) {
        self.flush_paragraph();
        let indent = line.chars().take_while(|c| *c == ' ').count();
        let level = indent / 2;
        let trimmed = line.trim();
        let mut text = if ordered {
            ORDERED_PREFIX.replace(trimmed, "").trim().to_string()
        } else {
            trimmed[1..].trim().to_string()
        };
        self.pos += 1;

        while self.pos < self.lines.len() {
            let next = self.lines[self.pos];
            let next_trimmed = next.trim();
            if next_trimmed.is_empty() || starts_new_block(next_trimmed) {
                break;
            }
            let next_indent = next.chars().take_while(|c| *c == ' ').count();
            if next_indent < (level + 1) * 2 {
                break;
            }
            text.push(' ');
            text.push_str(next_trimmed);
            self.pos += 1;
        }

        let spans = inline::resolve(&text);
        self.tokens.push(Token::ListItem {
            ordered,
            level,
            text,
            spans,
        });
    }

    fn next_is_separator(&self) -> bool {
        self.lines
            .get(self.pos + 1)
            .is_some_and(|line| is_table_separator(line.trim()))
    }

    /// Consume a table: the current line is the header row, the lookahead
    /// line the separator, and every following pipe line a data row.
    fn consume_table(&mut self) {
        self.flush_paragraph();
        let header_cells = split_cells(self.lines[self.pos].trim());
        let alignments: Vec<Alignment> = split_cells(self.lines[self.pos + 1].trim())
            .iter()
            .map(|cell| cell_alignment(cell))
            .collect();
        self.pos += 2;

        self.tokens.push(Token::TableRow {
            cells: header_cells,
            header: true,
            alignments: Some(alignments.clone()),
        });

        while self.pos < self.lines.len() {
            let trimmed = self.lines[self.pos].trim();
            if trimmed.is_empty() || !trimmed.contains('|') {
                break;
            }
            self.pos += 1;
            if is_table_separator(trimmed) {
                continue;
            }
            self.tokens.push(Token::TableRow {
                cells: split_cells(trimmed),
                header: false,
                alignments: Some(alignments.clone()),
            });
        }
    }

    /// Newline-join the buffered paragraph lines, trim, and emit.
    fn flush_paragraph(&mut self) {
        if self.paragraph.is_empty() {
            return;
        }
        let text = self.paragraph.join("\n").trim().to_string();
        self.paragraph.clear();
        if text.is_empty() {
            return;
        }
        let spans = inline::resolve(&text);
        self.tokens.push(Token::Paragraph { text, spans });
    }
}

/// Three or more backticks open or close a fence; returns the trailing
/// text (the language tag on an opening fence).
fn fence_marker(trimmed: &str) -> Option<&str> {
    let ticks = trimmed.chars().take_while(|c| *c == '`').count();
    if ticks >= 3 {
        Some(trimmed[ticks..].trim())
    } else {
        None
    }
}

fn is_horizontal_rule(trimmed: &str) -> bool {
    let mut chars = trimmed.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    matches!(first, '-' | '*' | '_') && trimmed.len() >= 3 && chars.all(|c| c == first)
}

/// A heading marker with no following whitespace is not a heading.
fn heading_parts(trimmed: &str) -> Option<(u8, &str)> {
    let level = trimmed.chars().take_while(|c| *c == '#').count();
    if !(1..=6).contains(&level) {
        return None;
    }
    let rest = &trimmed[level..];
    if !rest.starts_with(char::is_whitespace) {
        return None;
    }
    Some((level as u8, rest.trim()))
}

fn is_unordered_item(trimmed: &str) -> bool {
    let mut chars = trimmed.chars();
    matches!(chars.next(), Some('-' | '*' | '+')) && chars.next().is_some_and(char::is_whitespace)
}

fn is_ordered_item(trimmed: &str) -> bool {
    ORDERED_PREFIX.is_match(trimmed)
}

/// Lines that terminate a list item's continuation run.
fn starts_new_block(trimmed: &str) -> bool {
    is_unordered_item(trimmed)
        || is_ordered_item(trimmed)
        || heading_parts(trimmed).is_some()
        || fence_marker(trimmed).is_some()
        || trimmed.starts_with('>')
        || is_horizontal_rule(trimmed)
}

fn is_table_separator(trimmed: &str) -> bool {
    if !trimmed.contains('|') {
        return false;
    }
    let cells = split_cells(trimmed);
    !cells.is_empty() && cells.iter().all(|cell| is_separator_cell(cell))
}

fn is_separator_cell(cell: &str) -> bool {
    let body = cell.strip_prefix(':').unwrap_or(cell);
    let body = body.strip_suffix(':').unwrap_or(body);
    !body.is_empty() && body.chars().all(|c| c == '-')
}

fn split_cells(trimmed: &str) -> Vec<String> {
    let inner = trimmed.strip_prefix('|').unwrap_or(trimmed);
    let inner = inner.strip_suffix('|').unwrap_or(inner);
    inner
        .split('|')
        .map(|cell| cell.trim().to_string())
        .collect()
}

fn cell_alignment(cell: &str) -> Alignment {
    match (cell.starts_with(':'), cell.ends_with(':')) {
        (true, true) => Alignment::Center,
        (false, true) => Alignment::Right,
        _ => Alignment::Left,
    }
}
