//! candoc CLI - document conversion tool

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use colored::Colorize;

use candoc::{Candoc, EngineOptions, RenderOptions};

#[derive(Parser)]
#[command(name = "candoc")]
#[command(version)]
#[command(about = "Convert DOCX and HTML documents to Markdown, text, and JSON", long_about = None)]
struct Cli {
    /// Input document file
    #[arg(value_name = "FILE")]
    input: Option<PathBuf>,

    /// Output directory
    #[arg(value_name = "OUTPUT")]
    output: Option<PathBuf>,

    /// Input format override (docx, html)
    #[arg(long, value_name = "FORMAT", global = true)]
    from: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a document to all formats (Markdown, text, JSON)
    Convert {
        /// Input document file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output directory
        #[arg(short, long, value_name = "DIR")]
        output: Option<PathBuf>,
    },

    /// Convert a document to Markdown
    #[command(alias = "md")]
    Markdown {
        /// Input document file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output file (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Prepend a generated table of contents
        #[arg(long)]
        toc: bool,

        /// Escape Markdown syntax characters in text content
        #[arg(long)]
        escape: bool,

        /// Maximum heading level (1-6)
        #[arg(long, default_value = "6")]
        max_heading: u8,
    },

    /// Convert a document to plain text
    Text {
        /// Input document file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output file (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Convert a document to canonical JSON
    Json {
        /// Input document file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output file (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Output compact JSON
        #[arg(long)]
        compact: bool,
    },

    /// Show document information
    Info {
        /// Input document file
        #[arg(value_name = "FILE")]
        input: PathBuf,
    },
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();
    let from = cli.from.clone();

    let result = match cli.command {
        Some(Commands::Convert { input, output }) => {
            cmd_convert(&input, output.as_deref(), from.as_deref())
        }
        Some(Commands::Markdown {
            input,
            output,
            toc,
            escape,
            max_heading,
        }) => cmd_markdown(
            &input,
            output.as_deref(),
            from.as_deref(),
            toc,
            escape,
            max_heading,
        ),
        Some(Commands::Text { input, output }) => {
            cmd_text(&input, output.as_deref(), from.as_deref())
        }
        Some(Commands::Json {
            input,
            output,
            compact,
        }) => cmd_json(&input, output.as_deref(), from.as_deref(), compact),
        Some(Commands::Info { input }) => cmd_info(&input, from.as_deref()),
        None => {
            // Default behavior: convert if input is provided
            if let Some(input) = cli.input {
                cmd_convert(&input, cli.output.as_deref(), from.as_deref())
            } else {
                println!("{}", "Usage: candoc <FILE> [OUTPUT]".yellow());
                println!("       candoc --help for more information");
                Ok(())
            }
        }
    };

    if let Err(e) = result {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn read_input(path: &Path, from: Option<&str>) -> Result<(Vec<u8>, Option<String>), Box<dyn std::error::Error>> {
    let bytes = fs::read(path)?;
    let format = from
        .map(str::to_string)
        .or_else(|| candoc::detect::detect_format_from_path(path).map(|f| f.as_str().to_string()));
    Ok((bytes, format))
}

fn cmd_convert(
    input: &Path,
    output: Option<&Path>,
    from: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    let output_dir = output.map(|p| p.to_path_buf()).unwrap_or_else(|| {
        let stem = input.file_stem().unwrap_or_default().to_string_lossy();
        PathBuf::from(format!("{}_output", stem))
    });
    fs::create_dir_all(&output_dir)?;

    let (bytes, format) = read_input(input, from)?;
    let converter = Candoc::new();

    println!("{} {}", "Converting".cyan(), input.display());
    let result = converter.convert_full(&bytes, format.as_deref(), "markdown")?;
    fs::write(output_dir.join("document.md"), &result.output)?;

    let text = converter.engine_ref().render(
        &result.ast,
        "text",
        &RenderOptions::default(),
    )?;
    fs::write(output_dir.join("document.txt"), &text)?;

    let json = converter.engine_ref().render(
        &result.ast,
        "json",
        &RenderOptions::default().with_pretty_json(true),
    )?;
    fs::write(output_dir.join("document.json"), &json)?;

    for warning in &result.report.warnings {
        println!("{}: {}", "Warning".yellow(), warning);
    }

    println!("\n{}", "Output files:".green().bold());
    println!("  {} document.md", "├─".dimmed());
    println!("  {} document.txt", "├─".dimmed());
    println!("  {} document.json", "└─".dimmed());

    Ok(())
}

fn cmd_markdown(
    input: &Path,
    output: Option<&Path>,
    from: Option<&str>,
    toc: bool,
    escape: bool,
    max_heading: u8,
) -> Result<(), Box<dyn std::error::Error>> {
    let (bytes, format) = read_input(input, from)?;

    let converter = Candoc::new().with_render_options(
        RenderOptions::default()
            .with_toc(toc)
            .with_escaping(escape)
            .with_max_heading_level(max_heading),
    );
    let markdown = converter.to_markdown(&bytes, format.as_deref())?;

    write_or_print(output, &markdown)
}

fn cmd_text(
    input: &Path,
    output: Option<&Path>,
    from: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    let (bytes, format) = read_input(input, from)?;
    let text = Candoc::new().to_text(&bytes, format.as_deref())?;
    write_or_print(output, &text)
}

fn cmd_json(
    input: &Path,
    output: Option<&Path>,
    from: Option<&str>,
    compact: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let (bytes, format) = read_input(input, from)?;
    let converter = Candoc::new()
        .with_render_options(RenderOptions::default().with_pretty_json(!compact));
    let json = converter.to_json(&bytes, format.as_deref())?;
    write_or_print(output, &json)
}

fn write_or_print(output: Option<&Path>, content: &str) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(path) = output {
        fs::write(path, content)?;
        println!("{} {}", "Saved to".green(), path.display());
    } else {
        println!("{}", content);
    }
    Ok(())
}

fn cmd_info(input: &Path, from: Option<&str>) -> Result<(), Box<dyn std::error::Error>> {
    let (bytes, format) = read_input(input, from)?;
    let converter = Candoc::new()
        .with_engine_options(EngineOptions::default().with_input_validation(false));
    let result = converter.convert_full(&bytes, format.as_deref(), "text")?;
    let doc = &result.ast;

    println!("{}", "Document Information".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());

    println!("{}: {}", "File".bold(), input.display());
    println!("{}: {}", "Format".bold(), doc.metadata.source_format);
    if let Some(ref properties) = doc.properties {
        if let Some(ref title) = properties.title {
            println!("{}: {}", "Title".bold(), title);
        }
        if let Some(ref author) = properties.author {
            println!("{}: {}", "Author".bold(), author);
        }
    }

    println!();
    println!("{}", "Content Statistics".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());

    let text = doc.plain_text();
    println!("{}: {}", "Words".bold(), text.split_whitespace().count());
    println!("{}: {}", "Characters".bold(), result.report.char_count);
    let features = result.report.features;
    println!("{}: {}", "Paragraphs".bold(), features.paragraphs);
    println!("{}: {}", "Headings".bold(), features.headings);
    println!("{}: {}", "Tables".bold(), features.tables);
    println!("{}: {}", "Images".bold(), features.images);
    println!("{}: {}", "Links".bold(), features.hyperlinks);

    if !result.report.warnings.is_empty() {
        println!();
        println!("{}", "Warnings".yellow().bold());
        println!("{}", "─".repeat(40).dimmed());
        for warning in &result.report.warnings {
            println!("  {}", warning);
        }
    }

    Ok(())
}
