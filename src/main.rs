use anyhow::Context;
use clap::Parser;
use llm_context_builder::{
    Config, ContextFit, Pipeline, PresetKind, ProjectDetector, ScanResult, SimpleTokenizer,
    TokenEstimator, default_output_path,
};
use num_format::{Locale, ToFormattedString};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    name = "llm-context-builder",
    version,
    about = "Export any project to a single text file optimized for LLM context",
    long_about = "Export any project to a single text file optimized for LLM context.\n\n\
    Walks SOURCE_DIR, keeps the text files the selected preset admits, and writes them \
    into one document with clear per-file markers. Without --preset the project type \
    is detected and a matching preset is applied.\n\n\
    USAGE EXAMPLES:\n  \
      # Export the current directory to project_export/\n  \
      llm-context-builder\n\n  \
      # Export a React app with the web preset\n  \
      llm-context-builder ./my-app --preset web --count-tokens\n\n  \
      # Only Python and Markdown, to a chosen file\n  \
      llm-context-builder ./service --include-ext .py --include-ext .md -o context.txt"
)]
struct Cli {
    /// Directory to export
    #[arg(default_value = ".", value_name = "SOURCE_DIR")]
    source_dir: PathBuf,

    /// Output file path (default: project_export/NAME_TIMESTAMP.txt)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Use a predefined project preset
    #[arg(long, value_enum)]
    preset: Option<CliPreset>,

    /// List all available presets and exit
    #[arg(long)]
    list_presets: bool,

    /// Print detected project information as JSON and exit
    #[arg(long)]
    detect: bool,

    /// Estimate the token count of the document
    #[arg(long)]
    count_tokens: bool,

    /// Maximum file size in bytes before truncation
    #[arg(long, value_name = "BYTES")]
    max_size: Option<u64>,

    /// Additional file extensions to exclude
    #[arg(long, value_name = "EXT", value_delimiter = ',')]
    exclude_ext: Vec<String>,

    /// Additional folder patterns to exclude
    #[arg(long, value_name = "PATTERN", value_delimiter = ',')]
    exclude_folders: Vec<String>,

    /// Additional file patterns to exclude
    #[arg(long, value_name = "PATTERN", value_delimiter = ',')]
    exclude_files: Vec<String>,

    /// Only include these file extensions
    #[arg(long, value_name = "EXT", value_delimiter = ',')]
    include_ext: Vec<String>,

    /// Disable timestamp in the default output filename
    #[arg(long)]
    no_timestamp: bool,

    /// Print only the output file path
    #[arg(short, long)]
    quiet: bool,

    /// Use the minimal preset instead of detecting one
    #[arg(long)]
    no_auto_detect: bool,

    /// Assemble the document without writing it
    #[arg(long)]
    dry_run: bool,

    /// Verbose output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum CliPreset {
    /// React, Vue, Angular, HTML/CSS/JS projects
    Web,
    /// Python packages, Django, Flask, FastAPI projects
    Python,
    /// Node.js, npm packages, backend projects
    Node,
    /// React Native, Flutter, mobile app projects
    Mobile,
    /// Documentation, blog, content projects
    Docs,
    /// Only essential text files
    Minimal,
    /// Include everything (use with caution)
    Full,
}

impl From<CliPreset> for PresetKind {
    fn from(p: CliPreset) -> Self {
        match p {
            CliPreset::Web => Self::Web,
            CliPreset::Python => Self::Python,
            CliPreset::Node => Self::Node,
            CliPreset::Mobile => Self::Mobile,
            CliPreset::Docs => Self::Docs,
            CliPreset::Minimal => Self::Minimal,
            CliPreset::Full => Self::Full,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = setup_tracing(cli.verbose, cli.quiet) {
        eprintln!("Error: {e:#}");
        return ExitCode::FAILURE;
    }

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    if cli.list_presets {
        list_presets();
        return Ok(());
    }

    if cli.detect {
        let info = ProjectDetector::new(&cli.source_dir).project_info();
        println!(
            "{}",
            serde_json::to_string_pretty(&info).context("Failed to serialize project info")?
        );
        return Ok(());
    }

    let start_time = Instant::now();
    let preset = select_preset(&cli);

    let mut builder = Config::builder()
        .root_dir(&cli.source_dir)
        .preset(preset)
        .exclude_extensions(cli.exclude_ext)
        .exclude_folders(cli.exclude_folders)
        .exclude_files(cli.exclude_files)
        .dry_run(cli.dry_run);

    if !cli.include_ext.is_empty() {
        builder = builder.include_extensions(cli.include_ext);
    }

    if let Some(max_size) = cli.max_size {
        builder = builder.max_file_size(max_size);
    }

    let mut config = builder.build().context("Failed to build configuration")?;

    let output_file = match cli.output {
        Some(path) => path,
        None => {
            let cwd = std::env::current_dir().context("Failed to resolve current directory")?;
            let timestamp = (!cli.no_timestamp).then(chrono::Local::now);
            default_output_path(&cwd, &config.root_dir, timestamp)
        }
    };
    config.output_file = Some(output_file);

    if !cli.quiet {
        println!("LLM Context Builder");
        println!("Source: {}", config.root_dir.display());
        println!("Preset: {} ({})", config.preset_name(), config.preset);
    }

    let pipeline = Pipeline::new(config).context("Failed to create pipeline")?;
    if !cli.quiet {
        println!("Output: {}", pipeline.output_file().display());
    }

    let result = pipeline.run().context("Export failed")?;

    if cli.quiet {
        println!("{}", result.output_file.display());
    } else {
        print_report(&result, cli.count_tokens, start_time);
    }

    Ok(())
}

/// Explicit preset, else the detected one, else minimal.
fn select_preset(cli: &Cli) -> PresetKind {
    if let Some(preset) = cli.preset {
        return preset.into();
    }

    if cli.no_auto_detect {
        return PresetKind::Minimal;
    }

    let detector = ProjectDetector::new(&cli.source_dir);
    match detector.detect() {
        Some(project_type) => {
            let preset = project_type.preset();
            if !cli.quiet {
                println!(
                    "Detected: {} project, applying the {} preset",
                    project_type, preset
                );
            }
            preset
        }
        None => PresetKind::Minimal,
    }
}

fn list_presets() {
    println!("Available presets:\n");
    for kind in PresetKind::all() {
        println!("{:10} - {}", kind.id(), kind.preset().description);
    }
}

fn print_report(result: &ScanResult, count_tokens: bool, start_time: Instant) {
    println!(
        "Files: {} processed, {} skipped ({} bytes)",
        result.files_processed,
        result.files_skipped,
        result.total_size.to_formatted_string(&Locale::en)
    );

    if count_tokens && !result.content.is_empty() {
        let tokens = SimpleTokenizer.estimate(&result.content);
        let fit = ContextFit::for_tokens(tokens);
        println!(
            "Tokens: ~{} ({})",
            tokens.to_formatted_string(&Locale::en),
            fit
        );
        if !fit.fits() {
            println!("Tip: narrow the export with --preset, --include-ext or --exclude-folders");
        }
    }

    println!(
        "Export completed in {:.1}s",
        start_time.elapsed().as_secs_f64()
    );

    if result.written {
        println!("Ready for LLM context: {}", result.output_file.display());
    } else {
        println!("Dry run: nothing written to {}", result.output_file.display());
    }
}

fn setup_tracing(verbosity: u8, quiet: bool) -> anyhow::Result<()> {
    let filter = match (quiet, verbosity) {
        (true, _) => EnvFilter::new("llm_context_builder=warn"),
        (false, 0) => EnvFilter::new("llm_context_builder=info"),
        (false, 1) => EnvFilter::new("llm_context_builder=debug"),
        (false, _) => EnvFilter::new("llm_context_builder=trace"),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_writer(std::io::stderr),
        )
        .try_init()
        .context("Failed to install tracing subscriber")?;

    Ok(())
}
