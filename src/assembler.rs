use std::path::Path;

use crate::element::{Document, Element, ListItem};
use crate::token::Token;

pub(crate) const DEFAULT_TITLE: &str = "Untitled Document";

/// Group the flat token stream into renderer-ready elements and derive
/// the document metadata.
pub(crate) fn assemble(tokens: Vec<Token>, base_dir: Option<&Path>) -> Document {
    let mut elements = Vec::new();
    let mut tokens = tokens.into_iter().peekable();

    while let Some(token) = tokens.next() {
        match token {
            Token::Heading {
                level, text, spans, ..
            } => {
                let id = heading_id(&text);
                elements.push(Element::Heading {
                    level,
                    text,
                    spans,
                    id,
                });
            }
            Token::Paragraph { text, spans } => elements.push(Element::Paragraph { text, spans }),
            Token::CodeBlock { language, code } => {
                elements.push(Element::CodeBlock { language, code })
            }
            Token::Image { alt, url } => elements.push(Element::Image {
                alt,
                url,
                base_dir: base_dir.map(Path::to_path_buf),
            }),
            Token::Blockquote { text, spans } => {
                elements.push(Element::Blockquote { text, spans })
            }
            Token::HorizontalRule => elements.push(Element::HorizontalRule),
            Token::ListItem {
                ordered,
                level,
                text,
                spans,
            } => {
                let mut items = vec![ListItem { level, text, spans }];
                while let Some(Token::ListItem { ordered: next, .. }) = tokens.peek() {
                    // mixing ordered and unordered starts a new list
                    if *next != ordered {
                        break;
                    }
                    if let Some(Token::ListItem {
                        level, text, spans, ..
                    }) = tokens.next()
                    {
                        items.push(ListItem { level, text, spans });
                    }
                }
                elements.push(Element::List { ordered, items });
            }
            Token::TableRow { .. } => {
                let mut headers = Vec::new();
                let mut alignments = None;
                let mut rows = Vec::new();
                let mut current = Some(token);
                while let Some(Token::TableRow {
                    cells,
                    header,
                    alignments: row_alignments,
                }) = current
                {
                    if alignments.is_none() {
                        alignments = row_alignments;
                    }
                    if header && headers.is_empty() {
                        headers = cells;
                    } else {
                        rows.push(cells);
                    }
                    current = if matches!(tokens.peek(), Some(Token::TableRow { .. })) {
                        tokens.next()
                    } else {
                        None
                    };
                }
                elements.push(Element::Table {
                    headers,
                    alignments: alignments.unwrap_or_default(),
                    rows,
                });
            }
        }
    }

    let title = elements
        .iter()
        .find_map(|element| match element {
            Element::Heading { text, .. } => Some(text.clone()),
            _ => None,
        })
        .unwrap_or_else(|| DEFAULT_TITLE.to_string());

    log::debug!("assembled {} elements", elements.len());
    Document { elements, title }
}

/// Lower-case the text, collapse every run of non-alphanumeric characters
/// into a single hyphen, and trim leading/trailing hyphens.
pub(crate) fn heading_id(text: &str) -> String {
    let mut id = String::with_capacity(text.len());
    let mut pending_hyphen = false;
    for c in text.chars() {
        if c.is_alphanumeric() {
            if pending_hyphen && !id.is_empty() {
                id.push('-');
            }
            pending_hyphen = false;
            id.extend(c.to_lowercase());
        } else {
            pending_hyphen = true;
        }
    }
    id
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::{assemble, heading_id, DEFAULT_TITLE};
    use crate::classifier::classify;
    use crate::element::Element;
    use crate::token::{Alignment, Token};

    fn item(ordered: bool, text: &str) -> Token {
        Token::ListItem {
            ordered,
            level: 0,
            text: text.into(),
            spans: vec![],
        }
    }

    #[test]
    fn three_consecutive_items_group_into_one_list() {
        let doc = assemble(vec![item(false, "a"), item(false, "b"), item(false, "c")], None);
        assert_eq!(doc.elements.len(), 1);
        match &doc.elements[0] {
            Element::List { ordered, items } => {
                assert!(!ordered);
                let texts: Vec<&str> = items.iter().map(|i| i.text.as_str()).collect();
                assert_eq!(texts, vec!["a", "b", "c"]);
            }
            other => panic!("expected a list, got {other:?}"),
        }
    }

    #[test]
    fn mixed_ordering_splits_into_adjacent_lists() {
        let doc = assemble(
            vec![item(false, "a"), item(true, "b"), item(true, "c")],
            None,
        );
        assert_eq!(doc.elements.len(), 2);
        assert!(matches!(
            doc.elements[0],
            Element::List { ordered: false, .. }
        ));
        assert!(matches!(doc.elements[1], Element::List { ordered: true, .. }));
    }

    #[test]
    fn table_rows_merge_into_one_table() {
        let doc = assemble(
            classify("| A | B |\n| :---: | ---: |\n| 1 | 2 |\n| 3 | 4 |"),
            None,
        );
        assert_eq!(doc.elements.len(), 1);
        match &doc.elements[0] {
            Element::Table {
                headers,
                alignments,
                rows,
            } => {
                assert_eq!(headers, &vec!["A".to_string(), "B".to_string()]);
                assert_eq!(alignments, &vec![Alignment::Center, Alignment::Right]);
                assert_eq!(rows.len(), 2);
            }
            other => panic!("expected a table, got {other:?}"),
        }
    }

    #[test]
    fn heading_ids_are_deterministic_slugs() {
        assert_eq!(heading_id("Hello World Test"), "hello-world-test");
        assert_eq!(heading_id("Test & Example #1"), "test-example-1");
        assert_eq!(heading_id("  padded  "), "padded");
        assert_eq!(heading_id("---"), "");
    }

    #[test]
    fn title_comes_from_the_first_heading() {
        let doc = assemble(classify("intro text\n\n# First\n\n## Second"), None);
        assert_eq!(doc.title, "First");
    }

    #[test]
    fn title_falls_back_to_the_placeholder() {
        let doc = assemble(classify("no headings here"), None);
        assert_eq!(doc.title, DEFAULT_TITLE);
    }

    #[test]
    fn base_dir_is_attached_to_images_unchanged() {
        let doc = assemble(classify("![a](img/a.png)"), Some(Path::new("/docs")));
        match &doc.elements[0] {
            Element::Image { base_dir, .. } => {
                assert_eq!(base_dir.as_deref(), Some(Path::new("/docs")));
            }
            other => panic!("expected an image, got {other:?}"),
        }
    }

    #[test]
    fn scalar_tokens_map_one_to_one() {
        let doc = assemble(
            classify("# T\n\npara\n\n> quote\n\n---\n\n```\nx\n```"),
            None,
        );
        let kinds: Vec<&str> = doc
            .elements
            .iter()
            .map(|e| match e {
                Element::Heading { .. } => "heading",
                Element::Paragraph { .. } => "paragraph",
                Element::Blockquote { .. } => "blockquote",
                Element::HorizontalRule => "rule",
                Element::CodeBlock { .. } => "code",
                other => panic!("unexpected element {other:?}"),
            })
            .collect();
        assert_eq!(
            kinds,
            vec!["heading", "paragraph", "blockquote", "rule", "code"]
        );
    }
}
