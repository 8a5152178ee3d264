//! bookvoice - Convert EPUB files to spoken audio using cloud text-to-speech

mod audio;
mod config;
mod epub;
mod pipeline;
mod section;
mod text;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use pipeline::PipelineOptions;
use speech_client::ProviderKind;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "bookvoice")]
#[command(about = "Convert EPUB files to spoken audio using cloud text-to-speech", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Extract content from an EPUB file and save as markdown
    Extract {
        /// Path to the EPUB file
        epub_file: PathBuf,

        /// Output markdown filename (default: <epub-name>.md)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Convert markdown content to speech
    Speak {
        /// Path to the markdown file
        markdown_file: PathBuf,

        #[command(flatten)]
        opts: SpeechOpts,
    },
    /// Extract an EPUB and convert it to speech in one step
    Process {
        /// Path to the EPUB file
        epub_file: PathBuf,

        /// Keep the intermediate markdown file
        #[arg(short, long)]
        keep_markdown: bool,

        #[command(flatten)]
        opts: SpeechOpts,
    },
}

#[derive(Args, Debug)]
struct SpeechOpts {
    /// Output directory for audio files
    #[arg(short, long, default_value = "./audio_output")]
    output_dir: PathBuf,

    /// Speech service to use (openai, google, azure)
    #[arg(long)]
    service: Option<String>,

    /// Voice to use (service-specific alias, e.g. alloy, amber, jenny)
    #[arg(short, long)]
    voice: Option<String>,

    /// Split audio content at H1 and H2 heading levels. Without this flag,
    /// content is split at H1 (chapter) level only
    #[arg(short, long)]
    split_at_subheadings: bool,

    /// Synthesize through the service's SSML input for prosody and pause
    /// control (Azure only)
    #[arg(long)]
    ssml: bool,

    /// Path to a JSON file with pronunciation hints for key terms
    #[arg(long)]
    pronunciation_config: Option<PathBuf>,

    /// Maximum characters per synthesis request
    #[arg(long, default_value_t = text::chunker::DEFAULT_MAX_CHUNK)]
    chunk_size: usize,

    /// Start fresh, ignore chunk files left by an interrupted run
    #[arg(long)]
    no_resume: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Extract { epub_file, output } => handle_extract(&epub_file, output),
        Commands::Speak {
            markdown_file,
            opts,
        } => {
            let document = fs::read_to_string(&markdown_file)
                .with_context(|| format!("Failed to read {}", markdown_file.display()))?;
            eprintln!("Converting {} to speech...", markdown_file.display());
            convert_document(&document, &opts).await
        }
        Commands::Process {
            epub_file,
            keep_markdown,
            opts,
        } => handle_process(&epub_file, keep_markdown, &opts).await,
    }
}

fn handle_extract(epub_file: &Path, output: Option<PathBuf>) -> Result<()> {
    let output = output.unwrap_or_else(|| default_markdown_path(epub_file));

    eprintln!(
        "Extracting content from {} to {}...",
        epub_file.display(),
        output.display()
    );

    let extraction = epub::extract_epub_to_markdown(epub_file).context("Failed to parse EPUB")?;
    epub::write_markdown(&extraction, &output)?;

    eprintln!(
        "Book: \"{}\" by {}",
        extraction.title,
        extraction.author.as_deref().unwrap_or("Unknown")
    );
    eprintln!("Words: ~{}", extraction.total_words());
    eprintln!("Extraction complete: {}", output.display());

    Ok(())
}

async fn handle_process(epub_file: &Path, keep_markdown: bool, opts: &SpeechOpts) -> Result<()> {
    eprintln!("Processing {}...", epub_file.display());

    let extraction = epub::extract_epub_to_markdown(epub_file).context("Failed to parse EPUB")?;
    eprintln!(
        "Book: \"{}\" by {}",
        extraction.title,
        extraction.author.as_deref().unwrap_or("Unknown")
    );

    // The intermediate markdown always lands on disk so a partial run can be
    // inspected; it is removed afterwards unless the caller keeps it.
    let md_path = default_markdown_path(epub_file);
    epub::write_markdown(&extraction, &md_path)?;
    eprintln!("Extraction complete: {}", md_path.display());

    let result = convert_document(&extraction.markdown, opts).await;

    if !keep_markdown && md_path.exists() {
        fs::remove_file(&md_path)?;
        eprintln!("Removed intermediate markdown file: {}", md_path.display());
    }

    result
}

/// Markdown filename next to the current directory, named after the EPUB.
fn default_markdown_path(epub_file: &Path) -> PathBuf {
    let stem = epub_file.file_stem().unwrap_or_default();
    PathBuf::from(format!("{}.md", stem.to_string_lossy()))
}

/// Run the full speech pipeline for a markdown document: section, chunk,
/// synthesize, then merge per-section audio into the output directory.
async fn convert_document(document: &str, opts: &SpeechOpts) -> Result<()> {
    let speech_config =
        speech_client::Config::load().context("Failed to load speech configuration")?;

    let service = opts
        .service
        .clone()
        .unwrap_or_else(|| speech_config.default_service.clone());
    let provider_config = speech_config.get_provider_config(&service);

    let kind = ProviderKind::from_str(&service)?;
    let voice = opts
        .voice
        .clone()
        .or_else(|| provider_config.and_then(|c| c.voice.clone()))
        .unwrap_or_else(|| kind.default_voice().to_string());

    let instructions = config::build_instructions(opts.pronunciation_config.as_deref())?;

    // Voice alias and credentials are validated here, before any synthesis
    let provider =
        speech_client::get_provider(&service, &voice, Some(instructions), provider_config)?;

    fs::create_dir_all(&opts.output_dir).with_context(|| {
        format!(
            "Failed to create output directory {}",
            opts.output_dir.display()
        )
    })?;
    let work_dir = pipeline::create_work_dir(&opts.output_dir, !opts.no_resume)?;

    eprintln!(
        "Synthesizing with {} using voice '{}'...",
        provider.name(),
        voice
    );

    let options = PipelineOptions {
        split_at_subheadings: opts.split_at_subheadings,
        ssml: opts.ssml,
        max_chunk_size: opts.chunk_size,
        call_delay: pipeline::SYNTHESIS_DELAY,
        progress: true,
    };

    let groups = pipeline::run_pipeline(document, provider.as_ref(), &work_dir, &options).await?;

    let outputs = audio::merge_groups(&groups, &opts.output_dir, &work_dir)?;

    // Chunk files are only cleaned up once every section has been merged
    fs::remove_dir_all(&work_dir)
        .with_context(|| format!("Failed to remove working directory {}", work_dir.display()))?;

    eprintln!("Audio files saved:");
    for path in &outputs {
        println!("{}", path.display());
    }
    eprintln!("Speech conversion complete.");

    Ok(())
}
