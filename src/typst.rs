use std::path::Path;

use crate::config::Config;
use crate::element::{Document, Element, ListItem};
use crate::token::{Alignment, FormatKind, InlineFormat};

/// Convert a structured document to Typst markup
pub(crate) fn document_to_typst(doc: &Document, config: &Config) -> String {
    let mut out = String::new();
    emit_preamble(doc, config, &mut out);

    let mut i = 0;
    while i < doc.elements.len() {
        let element = &doc.elements[i];

        match element {
            Element::Heading { .. } => {
                // Keep heading with following content using a block that prevents breaks
                out.push_str("#block(breakable: false)[\n");
                emit_heading(element, &mut out);

                // Include the next element if it exists (to keep heading with first content)
                if i + 1 < doc.elements.len() {
                    i += 1;
                    emit_element(&doc.elements[i], &mut out);
                }
                out.push_str("]\n\n");
            }
            _ => {
                emit_element(element, &mut out);
            }
        }

        i += 1;
    }

    out
}

fn emit_preamble(doc: &Document, config: &Config, out: &mut String) {
    out.push_str(&format!(
        "#set document(title: \"{}\")\n",
        escape_string(&doc.title)
    ));
    if config.page.numbers {
        out.push_str(&format!(
            "#set page(paper: \"{}\", numbering: \"1\")\n",
            escape_string(&config.page.paper)
        ));
    } else {
        out.push_str(&format!(
            "#set page(paper: \"{}\")\n",
            escape_string(&config.page.paper)
        ));
    }
    match &config.font.family {
        Some(family) => out.push_str(&format!(
            "#set text(size: {}pt, font: \"{}\")\n",
            config.font.size,
            escape_string(family)
        )),
        None => out.push_str(&format!("#set text(size: {}pt)\n", config.font.size)),
    }
    // Set up paragraph settings to prevent widows/orphans
    out.push_str("#set par(linebreaks: \"optimized\")\n");
    out.push_str(&format!(
        "#show link: set text(fill: rgb(\"{}\"))\n",
        escape_string(&config.links.color)
    ));
    if config.links.underline {
        out.push_str("#show link: underline\n");
    }
    out.push('\n');
}

fn emit_heading(element: &Element, out: &mut String) {
    if let Element::Heading {
        level, text, spans, ..
    } = element
    {
        for _ in 0..*level {
            out.push('=');
        }
        out.push(' ');
        styled_text(text, spans, out);
        out.push('\n');
        out.push('\n');
    }
}

fn emit_element(element: &Element, out: &mut String) {
    match element {
        Element::Heading { .. } => {
            emit_heading(element, out);
        }
        Element::Paragraph { text, spans } => {
            styled_text(text, spans, out);
            out.push_str("\n\n");
        }
        Element::CodeBlock { language, code } => {
            // Keep code blocks together when possible
            out.push_str("#block(breakable: false)[\n```");
            if let Some(lang) = language {
                out.push_str(lang);
            }
            out.push('\n');
            out.push_str(code);
            if !code.ends_with('\n') {
                out.push('\n');
            }
            out.push_str("```\n]\n\n");
        }
        Element::List { ordered, items } => {
            // Wrap list to keep together when small, allow breaks when large
            if items.len() <= 5 {
                out.push_str("#block(breakable: false)[\n");
                list_to_typst(*ordered, items, out);
                out.push_str("]\n\n");
            } else {
                list_to_typst(*ordered, items, out);
                out.push('\n');
            }
        }
        Element::Table {
            headers,
            alignments,
            rows,
        } => {
            // Keep tables together when possible
            out.push_str("#block(breakable: false)[\n");
            table_to_typst(headers, alignments, rows, out);
            out.push_str("]\n\n");
        }
        Element::Image { alt, url, base_dir } => {
            emit_image(alt, url, base_dir.as_deref(), out);
        }
        Element::Blockquote { text, spans } => {
            out.push_str("#quote(block: true)[");
            styled_text(text, spans, out);
            out.push_str("]\n\n");
        }
        Element::HorizontalRule => {
            out.push_str("#line(length: 100%)\n\n");
        }
    }
}

fn list_to_typst(ordered: bool, items: &[ListItem], out: &mut String) {
    let prefix = if ordered { "+" } else { "-" };

    for item in items {
        for _ in 0..item.level {
            out.push_str("  ");
        }
        out.push_str(prefix);
        out.push(' ');
        styled_text(&item.text, &item.spans, out);
        out.push('\n');
    }
}

fn table_to_typst(
    headers: &[String],
    alignments: &[Alignment],
    rows: &[Vec<String>],
    out: &mut String,
) {
    let col_count = if headers.is_empty() {
        rows.first().map_or(0, Vec::len)
    } else {
        headers.len()
    };
    if col_count == 0 {
        return;
    }

    out.push_str("#table(\n");
    out.push_str(&format!("  columns: {},\n", col_count));
    if !alignments.is_empty() {
        let names: Vec<&str> = alignments.iter().map(alignment_name).collect();
        out.push_str(&format!("  align: ({}),\n", names.join(", ")));
    }

    // Header cells (bold)
    for cell in headers {
        out.push_str("  [*");
        escape_text(cell, out);
        out.push_str("*],\n");
    }

    // Data rows
    for row in rows {
        for cell in row {
            out.push_str("  [");
            escape_text(cell, out);
            out.push_str("],\n");
        }
    }

    out.push_str(")\n");
}

fn alignment_name(alignment: &Alignment) -> &'static str {
    match alignment {
        Alignment::Left => "left",
        Alignment::Center => "center",
        Alignment::Right => "right",
    }
}

/// Image bytes are acquired outside this pipeline: remote targets render
/// as links, local ones as an alt-text placeholder with the resolved path.
fn emit_image(alt: &str, url: &str, base_dir: Option<&Path>, out: &mut String) {
    if url.starts_with("http://") || url.starts_with("https://") {
        out.push_str(&format!("#link(\"{}\")[", escape_string(url)));
        escape_text(if alt.is_empty() { url } else { alt }, out);
        out.push_str("]\n\n");
    } else {
        let path = match base_dir {
            Some(base) => base.join(url).display().to_string(),
            None => url.to_string(),
        };
        out.push_str("#emph[");
        escape_text(if alt.is_empty() { path.as_str() } else { alt }, out);
        out.push_str("] (");
        escape_text(&path, out);
        out.push_str(")\n\n");
    }
}

/// The style set active at one position of a text.
#[derive(Clone, Default, PartialEq)]
struct Style<'a> {
    bold: bool,
    italic: bool,
    code: bool,
    link: Option<&'a str>,
}

fn style_at<'a>(spans: &'a [InlineFormat], idx: usize) -> Style<'a> {
    let mut style = Style::default();
    for span in spans {
        if span.start <= idx && idx < span.end {
            match span.kind {
                FormatKind::Bold => style.bold = true,
                FormatKind::Italic => style.italic = true,
                FormatKind::Code => style.code = true,
                FormatKind::Link => {
                    if style.link.is_none() {
                        style.link = span.url.as_deref();
                    }
                }
            }
        }
    }
    style
}

fn is_hidden(spans: &[InlineFormat], idx: usize) -> bool {
    spans
        .iter()
        .any(|span| span.hidden_ranges().iter().any(|range| range.contains(&idx)))
}

/// Emit a text with its resolved spans: literal markers are skipped and
/// visible characters grouped into runs of identical style.
fn styled_text(text: &str, spans: &[InlineFormat], out: &mut String) {
    let mut run = String::new();
    let mut style = Style::default();

    for (idx, ch) in text.char_indices() {
        if is_hidden(spans, idx) {
            continue;
        }
        let next = style_at(spans, idx);
        if next != style {
            emit_run(&style, &run, out);
            run.clear();
            style = next;
        }
        run.push(ch);
    }
    emit_run(&style, &run, out);
}

fn emit_run(style: &Style, text: &str, out: &mut String) {
    if text.is_empty() {
        return;
    }
    if let Some(url) = style.link {
        out.push_str(&format!("#link(\"{}\")[", escape_string(url)));
    }
    if style.italic {
        out.push('_');
    }
    if style.bold {
        out.push('*');
    }
    if style.code {
        out.push('`');
        // Inside raw/code, backticks need special handling
        out.push_str(&text.replace('`', "\\`"));
        out.push('`');
    } else {
        escape_text(text, out);
    }
    if style.bold {
        out.push('*');
    }
    if style.italic {
        out.push('_');
    }
    if style.link.is_some() {
        out.push(']');
    }
}

fn escape_text(text: &str, out: &mut String) {
    // Escape special Typst characters
    for ch in text.chars() {
        match ch {
            '#' | '*' | '_' | '@' | '$' | '\\' | '`' | '<' | '>' | '[' | ']' => {
                out.push('\\');
                out.push(ch);
            }
            _ => out.push(ch),
        }
    }
}

fn escape_string(text: &str) -> String {
    text.replace('\\', "\\\\").replace('"', "\\\"")
}

#[cfg(test)]
mod tests {
    use crate::config::Config;
    use crate::{markdown_to_typst, markdown_to_typst_with_config};

    fn preamble(title: &str) -> String {
        format!(
            "#set document(title: \"{title}\")\n\
             #set page(paper: \"a4\")\n\
             #set text(size: 11pt)\n\
             #set par(linebreaks: \"optimized\")\n\
             #show link: set text(fill: rgb(\"#1a4f8b\"))\n\
             #show link: underline\n\n"
        )
    }

    #[test]
    fn heading() {
        assert_eq!(
            markdown_to_typst("# Hello"),
            format!(
                "{}#block(breakable: false)[\n= Hello\n\n]\n\n",
                preamble("Hello")
            )
        );
    }

    #[test]
    fn heading_with_following_content() {
        // Heading should be grouped with following paragraph
        let result = markdown_to_typst("# Title\n\nSome text.");
        assert!(result.contains("#block(breakable: false)[\n= Title\n\nSome text.\n\n]\n\n"));
    }

    #[test]
    fn paragraph() {
        assert_eq!(
            markdown_to_typst("Hello world"),
            format!("{}Hello world\n\n", preamble("Untitled Document"))
        );
    }

    #[test]
    fn bold_and_italic() {
        let body = |s: &str| format!("{}{s}\n\n", preamble("Untitled Document"));
        assert_eq!(markdown_to_typst("**bold**"), body("*bold*"));
        assert_eq!(markdown_to_typst("*italic*"), body("_italic_"));
        assert_eq!(markdown_to_typst("***both***"), body("_*both*_"));
    }

    #[test]
    fn inline_code() {
        assert_eq!(
            markdown_to_typst("`code`"),
            format!("{}`code`\n\n", preamble("Untitled Document"))
        );
    }

    #[test]
    fn link() {
        assert_eq!(
            markdown_to_typst("see [docs](https://example.com) now"),
            format!(
                "{}see #link(\"https://example.com\")[docs] now\n\n",
                preamble("Untitled Document")
            )
        );
    }

    #[test]
    fn link_with_bold_text() {
        assert_eq!(
            markdown_to_typst("[**x**](u)"),
            format!("{}#link(\"u\")[*x*]\n\n", preamble("Untitled Document"))
        );
    }

    #[test]
    fn code_block() {
        assert_eq!(
            markdown_to_typst("```rust\nlet x = 1;\n```"),
            format!(
                "{}#block(breakable: false)[\n```rust\nlet x = 1;\n```\n]\n\n",
                preamble("Untitled Document")
            )
        );
    }

    #[test]
    fn unordered_list() {
        assert_eq!(
            markdown_to_typst("- one\n- two"),
            format!(
                "{}#block(breakable: false)[\n- one\n- two\n]\n\n",
                preamble("Untitled Document")
            )
        );
    }

    #[test]
    fn ordered_list() {
        assert_eq!(
            markdown_to_typst("1. one\n2. two"),
            format!(
                "{}#block(breakable: false)[\n+ one\n+ two\n]\n\n",
                preamble("Untitled Document")
            )
        );
    }

    #[test]
    fn nested_list_indents_by_level() {
        assert_eq!(
            markdown_to_typst("- top\n  - nested"),
            format!(
                "{}#block(breakable: false)[\n- top\n  - nested\n]\n\n",
                preamble("Untitled Document")
            )
        );
    }

    #[test]
    fn escapes_special_chars() {
        let body = |s: &str| format!("{}{s}\n\n", preamble("Untitled Document"));
        assert_eq!(markdown_to_typst("a * b"), body("a \\* b"));
        assert_eq!(markdown_to_typst("a # b"), body("a \\# b"));
        assert_eq!(markdown_to_typst("a_b"), body("a\\_b"));
    }

    #[test]
    fn table_with_alignment() {
        let md = "| A | B |\n| :---: | ---: |\n| 1 | 2 |";
        let expected = format!(
            "{}#block(breakable: false)[\n#table(\n  columns: 2,\n  align: (center, right),\n  [*A*],\n  [*B*],\n  [1],\n  [2],\n)\n]\n\n",
            preamble("Untitled Document")
        );
        assert_eq!(markdown_to_typst(md), expected);
    }

    #[test]
    fn blockquote() {
        assert_eq!(
            markdown_to_typst("> quoted words"),
            format!(
                "{}#quote(block: true)[quoted words]\n\n",
                preamble("Untitled Document")
            )
        );
    }

    #[test]
    fn horizontal_rule() {
        assert_eq!(
            markdown_to_typst("---\n"),
            format!("{}#line(length: 100%)\n\n", preamble("Untitled Document"))
        );
    }

    #[test]
    fn local_image_renders_a_placeholder() {
        assert_eq!(
            markdown_to_typst("![logo](img/logo.png)"),
            format!(
                "{}#emph[logo] (img/logo.png)\n\n",
                preamble("Untitled Document")
            )
        );
    }

    #[test]
    fn remote_image_renders_a_link() {
        assert_eq!(
            markdown_to_typst("![site](https://example.com/x.png)"),
            format!(
                "{}#link(\"https://example.com/x.png\")[site]\n\n",
                preamble("Untitled Document")
            )
        );
    }

    #[test]
    fn config_drives_the_preamble() {
        let config = Config {
            page: crate::config::PageConfig {
                paper: "us-letter".into(),
                numbers: true,
            },
            ..Config::default()
        };
        let result = markdown_to_typst_with_config("hi", &config);
        assert!(result.contains("#set page(paper: \"us-letter\", numbering: \"1\")\n"));
    }
}
