use std::io::{self, BufReader, BufWriter, IsTerminal};
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand};
use env_logger::Env;
use indicatif::{ProgressBar, ProgressStyle};
use log::{info, warn};
use markov_text::config::DEFAULT_WORDS_PER_LINE;
use markov_text::generator::generate_text;
use markov_text::metrics::BuildMetrics;
use markov_text::{BuildConfig, ChainBuilder, GenerateConfig, MarkovChain};

#[derive(Parser, Debug)]
#[command(author, version, about = "Word-level Markov chain text toolkit", long_about = None)]
struct Cli {
    /// Increase verbosity (-v, -vv)
    #[arg(short = 'v', long, global = true, action = ArgAction::Count)]
    verbose: u8,

    /// Decrease verbosity (-q, -qq)
    #[arg(short = 'q', long, global = true, action = ArgAction::Count)]
    quiet: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Build a chain from text files, directories or URLs
    Build(BuildArgs),
    /// Generate text from a saved chain
    Generate(GenerateArgs),
    /// Inspect a saved chain
    Info(InfoArgs),
}

#[derive(Args, Debug)]
struct BuildArgs {
    /// Files, directories or URLs to ingest
    #[arg(required = true, value_name = "SOURCE")]
    sources: Vec<String>,

    /// Number of preceding words used as context
    #[arg(short = 'n', long, value_name = "ORDER")]
    order: usize,

    /// Output path for the chain (stdout when omitted)
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Read buffer size in bytes
    #[arg(long, value_name = "BYTES")]
    chunk_size: Option<usize>,

    /// Program used to fetch URL sources
    #[arg(long, value_name = "PROGRAM")]
    fetch_program: Option<String>,

    /// Only read the first level of directory sources
    #[arg(long)]
    no_recursive: bool,

    /// Follow symlinks while walking directories
    #[arg(long)]
    follow_symlinks: bool,

    /// Disable the progress bar
    #[arg(long)]
    no_progress: bool,
}

#[derive(Args, Debug)]
struct GenerateArgs {
    /// Seed words; the last ORDER of them start the walk
    #[arg(required = true, value_name = "WORD")]
    seeds: Vec<String>,

    /// Number of words to generate
    #[arg(short, long, value_name = "COUNT")]
    words: usize,

    /// Chain file to load (stdin when omitted)
    #[arg(short, long, value_name = "PATH")]
    input: Option<PathBuf>,

    /// Seed for reproducible output
    #[arg(long, value_name = "SEED")]
    seed: Option<u64>,

    /// Words printed per output line
    #[arg(long, value_name = "COUNT", default_value_t = DEFAULT_WORDS_PER_LINE)]
    words_per_line: usize,
}

#[derive(Args, Debug)]
struct InfoArgs {
    /// Chain file to inspect (stdin when omitted)
    #[arg(short, long, value_name = "PATH")]
    input: Option<PathBuf>,

    /// Emit machine-readable JSON summary
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    match cli.command {
        Commands::Build(args) => run_build(args),
        Commands::Generate(args) => run_generate(args),
        Commands::Info(args) => run_info(args),
    }
}

fn init_logging(verbose: u8, quiet: u8) {
    use log::LevelFilter;

    let level = if quiet > 0 {
        match quiet {
            1 => LevelFilter::Warn,
            _ => LevelFilter::Error,
        }
    } else {
        match verbose {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    };

    let mut builder = env_logger::Builder::from_env(Env::default().default_filter_or("info"));
    builder.format_timestamp_millis();
    builder.filter_level(level);
    let _ = builder.try_init();
}

fn run_build(args: BuildArgs) -> Result<()> {
    let mut cfg = BuildConfig::builder()
        .order(args.order)
        .recursive(!args.no_recursive)
        .follow_symlinks(args.follow_symlinks);
    if let Some(chunk_size) = args.chunk_size {
        cfg = cfg.chunk_size(chunk_size);
    }
    if let Some(program) = args.fetch_program {
        cfg = cfg.fetch_program(program);
    }
    let builder = ChainBuilder::new(cfg.build()?);

    let sources = builder
        .sources(args.sources.as_slice())
        .context("failed to resolve text sources")?;
    let progress = if args.no_progress || !io::stderr().is_terminal() {
        None
    } else {
        let pb = ProgressBar::new(sources.len() as u64);
        pb.set_style(ProgressStyle::with_template(
            "{spinner} [{elapsed}] {bar:30} {pos}/{len} {wide_msg}",
        )?);
        Some(pb)
    };

    let start = Instant::now();
    let mut chain = builder.new_chain();
    let mut metrics = BuildMetrics::new(sources.len());
    for source in &sources {
        if let Some(pb) = &progress {
            pb.set_message(source.id());
        }
        let source_metrics = builder
            .ingest_source(&mut chain, source)
            .with_context(|| format!("failed to process {}", source.id()))?;
        if source_metrics.words_ingested == 0 {
            warn!("{} contributed no words", source.id());
        }
        metrics.sources.push(source_metrics);
        if let Some(pb) = &progress {
            pb.inc(1);
        }
    }
    metrics.total_duration = start.elapsed();
    if let Some(pb) = progress {
        pb.finish_with_message("done");
    }

    match &args.output {
        Some(path) => chain
            .save_to_path(path)
            .with_context(|| format!("failed to save chain to {}", path.display()))?,
        None => chain
            .save(BufWriter::new(io::stdout().lock()))
            .context("failed to write chain to stdout")?,
    }

    let stats = chain.stats();
    info!(
        "built chain: order={} states={} transitions={} words={} sources={} duration={:.2?}",
        stats.order,
        stats.states,
        stats.transitions,
        metrics.words_ingested(),
        metrics.sources.len(),
        metrics.total_duration
    );
    if let Some(path) = &args.output {
        info!("wrote chain to {}", path.display());
    }
    Ok(())
}

fn load_chain(input: Option<&Path>) -> Result<MarkovChain> {
    let mut chain = MarkovChain::default();
    match input {
        Some(path) => {
            info!("loading chain from {}", path.display());
            chain
                .load_from_path(path)
                .with_context(|| format!("failed to load chain from {}", path.display()))?;
        }
        None => chain
            .load(BufReader::new(io::stdin().lock()))
            .context("failed to load chain from stdin")?,
    }
    Ok(chain)
}

fn run_generate(args: GenerateArgs) -> Result<()> {
    let cfg = GenerateConfig::builder()
        .word_count(args.words)
        .words_per_line(args.words_per_line)
        .seed(args.seed)
        .build()?;
    let mut chain = load_chain(args.input.as_deref())?;
    let written = generate_text(
        &mut chain,
        args.seeds.as_slice(),
        &cfg,
        BufWriter::new(io::stdout().lock()),
    )
    .context("cannot generate text")?;
    info!("generated {written} words");
    Ok(())
}

fn run_info(args: InfoArgs) -> Result<()> {
    let chain = load_chain(args.input.as_deref())?;
    let stats = chain.stats();

    if args.json {
        println!("{}", stats.to_json(true)?);
    } else {
        println!("Order        : {}", stats.order);
        println!("States       : {}", stats.states);
        println!("Transitions  : {}", stats.transitions);
        println!("Vocabulary   : {}", stats.vocabulary);
        println!("Widest state : {}", stats.widest_state);
        println!("Mean fan-out : {:.2}", stats.mean_successors());
    }

    Ok(())
}
