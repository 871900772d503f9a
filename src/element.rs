use std::path::PathBuf;

use crate::token::{Alignment, InlineFormat};

/// A single list entry with its nesting level.
#[derive(Debug, Clone, PartialEq)]
pub struct ListItem {
    pub level: usize,
    pub text: String,
    pub spans: Vec<InlineFormat>,
}

/// Renderer-ready structural elements grouped from the token stream
#[derive(Debug, Clone, PartialEq)]
pub enum Element {
    Heading {
        level: u8,
        text: String,
        spans: Vec<InlineFormat>,
        /// Slug derived from the heading text.
        id: String,
    },
    Paragraph {
        text: String,
        spans: Vec<InlineFormat>,
    },
    List {
        ordered: bool,
        items: Vec<ListItem>,
    },
    CodeBlock {
        language: Option<String>,
        code: String,
    },
    Table {
        headers: Vec<String>,
        alignments: Vec<Alignment>,
        rows: Vec<Vec<String>>,
    },
    Image {
        alt: String,
        url: String,
        /// Hint for resolving relative paths, attached unchanged.
        base_dir: Option<PathBuf>,
    },
    Blockquote {
        text: String,
        spans: Vec<InlineFormat>,
    },
    HorizontalRule,
}

/// The terminal artifact handed to the rendering collaborator.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub elements: Vec<Element>,
    pub title: String,
}
