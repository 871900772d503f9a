use std::fs;
use std::path::PathBuf;

use clap::Parser;

use mdpress::Config;

#[derive(Parser)]
#[command(name = "mdpress")]
#[command(about = "Convert Markdown files to PDF")]
struct Cli {
    /// Input Markdown file
    input: PathBuf,

    /// Output PDF file (defaults to input name with .pdf extension)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Config file (TOML)
    #[arg(short, long, default_value = "mdpress.toml")]
    config: PathBuf,

    /// Print the generated Typst markup instead of writing a PDF
    #[arg(long)]
    typst: bool,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    // Read input file
    let markdown = match fs::read_to_string(&cli.input) {
        Ok(content) => content,
        Err(e) => {
            eprintln!("Error reading {}: {}", cli.input.display(), e);
            std::process::exit(1);
        }
    };

    let config = Config::load(&cli.config);

    // Relative image paths resolve against the input file's directory
    let doc = match cli.input.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => mdpress::convert_with_base(&markdown, dir),
        _ => mdpress::convert(&markdown),
    };

    if cli.typst {
        print!("{}", mdpress::document_to_typst(&doc, &config));
        return;
    }

    let pdf_bytes = match mdpress::document_to_pdf(&doc, &config) {
        Ok(bytes) => bytes,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    // Determine output path
    let output = cli
        .output
        .unwrap_or_else(|| cli.input.with_extension("pdf"));

    // Write PDF
    if let Err(e) = fs::write(&output, pdf_bytes) {
        eprintln!("Error writing {}: {}", output.display(), e);
        std::process::exit(1);
    }

    println!("Created {}", output.display());
}
