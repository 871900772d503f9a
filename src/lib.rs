mod assembler;
mod classifier;
mod config;
mod element;
mod inline;
mod token;
mod typst;

pub use config::{Config, FontConfig, LinksConfig, PageConfig};
pub use element::{Document, Element, ListItem};
pub use token::{Alignment, FormatKind, InlineFormat, Token};

use std::path::Path;

use thiserror::Error;
use typst_as_lib::typst_kit_options::TypstKitFontOptions;
use typst_as_lib::TypstEngine;
use typst_library::layout::PagedDocument;
use typst_pdf::PdfOptions;

/// Failure of the rendering collaborator; parsing itself cannot fail.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Typst compilation failed: {0}")]
    Compile(String),
    #[error("PDF generation failed: {0}")]
    Pdf(String),
}

/// Parse markdown text into a flat token stream.
pub fn parse(markdown: &str) -> Vec<Token> {
    classifier::classify(markdown)
}

/// Parse and group markdown text into a structured document.
pub fn convert(markdown: &str) -> Document {
    assembler::assemble(parse(markdown), None)
}

/// Like [`convert`], with a base directory attached to image elements for
/// relative path resolution.
pub fn convert_with_base(markdown: &str, base_dir: &Path) -> Document {
    assembler::assemble(parse(markdown), Some(base_dir))
}

/// Convert a structured document to Typst markup.
pub fn document_to_typst(doc: &Document, config: &Config) -> String {
    typst::document_to_typst(doc, config)
}

/// Convert markdown to Typst markup using default config.
pub fn markdown_to_typst(markdown: &str) -> String {
    markdown_to_typst_with_config(markdown, &Config::default())
}

/// Convert markdown to Typst markup with custom config.
pub fn markdown_to_typst_with_config(markdown: &str, config: &Config) -> String {
    document_to_typst(&convert(markdown), config)
}

/// Render a structured document to PDF bytes.
pub fn document_to_pdf(doc: &Document, config: &Config) -> Result<Vec<u8>, RenderError> {
    let typst_content = document_to_typst(doc, config);

    let font_options = TypstKitFontOptions::new()
        .include_embedded_fonts(true)
        .include_system_fonts(false);

    let engine = TypstEngine::builder()
        .main_file(typst_content)
        .search_fonts_with(font_options)
        .build();

    let paged: PagedDocument = engine
        .compile()
        .output
        .map_err(|e| RenderError::Compile(format!("{e:?}")))?;

    typst_pdf::pdf(&paged, &PdfOptions::default()).map_err(|e| RenderError::Pdf(format!("{e:?}")))
}

/// Convert markdown to PDF bytes using default config.
pub fn markdown_to_pdf(markdown: &str) -> Result<Vec<u8>, RenderError> {
    markdown_to_pdf_with_config(markdown, &Config::default())
}

/// Convert markdown to PDF bytes with custom config.
pub fn markdown_to_pdf_with_config(
    markdown: &str,
    config: &Config,
) -> Result<Vec<u8>, RenderError> {
    document_to_pdf(&convert(markdown), config)
}
