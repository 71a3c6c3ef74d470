//! NRR Search Tool
//!
//! Runs a search-and-classify pass over a query table and a corpus table
//! (JSON array or JSON Lines) and prints the annotated results as JSON.

use std::fs::File;
use std::io::{self, BufRead, BufWriter, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use nrr_core::classifier::{DEFAULT_WEIGHTS_PATH, DEFAULT_WEIGHTS_URL, ensure_artifact};
use nrr_core::retrieval::tantivy_engine::DEFAULT_INDEX_DIR;
use nrr_core::retrieval::DEFAULT_CANDIDATE_POOL;
use nrr_core::{
    Frame, LgdEngine, MatchClassifier, ModelConfig, PipelineConfig, ResultSet, RetrievalEngine,
    SearchPipeline, TantivyEngine, TextNormalizer,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// CLI arguments
#[derive(Parser)]
#[command(name = "nrr-search")]
#[command(about = "Retrieve, score and classify candidate matches for each query")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full pipeline and print the result table
    Search(SearchArgs),
    /// Normalize stdin, one line at a time
    Normalize,
    /// Download the classifier weights if they are not present
    FetchModel {
        #[command(flatten)]
        model: ModelArgs,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum EngineKind {
    /// In-memory log-logistic DFR ranking
    Lgd,
    /// On-disk tantivy index with BM25 ranking
    Tantivy,
}

#[derive(Args)]
struct ModelArgs {
    /// Local path of the classifier weights
    #[arg(long, env = "NRR_WEIGHTS", default_value = DEFAULT_WEIGHTS_PATH)]
    weights: PathBuf,

    /// Where to download the weights from when missing
    #[arg(long, env = "NRR_WEIGHTS_URL", default_value = DEFAULT_WEIGHTS_URL)]
    weights_url: String,

    /// Calibration means (defaults to `<weights>.calibration.json` if present)
    #[arg(long, env = "NRR_CALIBRATION")]
    calibration: Option<PathBuf>,
}

impl ModelArgs {
    fn to_config(&self) -> ModelConfig {
        let config = ModelConfig::new(&self.weights).with_url(&self.weights_url);
        match &self.calibration {
            Some(path) => config.with_calibration_path(path),
            None => config,
        }
    }
}

#[derive(Args)]
struct SearchArgs {
    /// Query table (.json or .jsonl)
    #[arg(short, long, env = "NRR_QUERIES")]
    queries: PathBuf,

    /// Corpus table (.json or .jsonl)
    #[arg(short, long, env = "NRR_CORPUS")]
    corpus: PathBuf,

    /// Write results here instead of stdout
    #[arg(short, long, env = "NRR_OUTPUT")]
    output: Option<PathBuf>,

    /// Keep only candidates classified as matches
    #[arg(long, env = "NRR_MATCHES_ONLY")]
    matches_only: bool,

    /// Retrieval engine
    #[arg(long, env = "NRR_ENGINE", value_enum, default_value_t = EngineKind::Lgd)]
    engine: EngineKind,

    /// Index directory for the tantivy engine (deleted and rebuilt each run)
    #[arg(long, env = "NRR_INDEX_DIR", default_value = DEFAULT_INDEX_DIR)]
    index_dir: PathBuf,

    /// Hits kept per query
    #[arg(short = 'n', long, env = "NRR_MAX_RESULTS", default_value_t = 10)]
    max_results: usize,

    /// Candidates ranked per query before truncation
    #[arg(long, env = "NRR_CANDIDATE_POOL", default_value_t = DEFAULT_CANDIDATE_POOL)]
    candidate_pool: usize,

    /// Scoring worker threads (default: one per core)
    #[arg(short = 'j', long, env = "NRR_THREADS")]
    threads: Option<usize>,

    /// Skip similarity scoring for texts longer than this many chars
    #[arg(long, env = "NRR_MAX_SCORING_CHARS")]
    max_scoring_chars: Option<usize>,

    /// Query identifier column
    #[arg(long, env = "NRR_QUERY_ID_COLUMN", default_value = "qid")]
    query_id_column: String,

    /// Query text column
    #[arg(long, env = "NRR_QUERY_TEXT_COLUMN", default_value = "query")]
    query_text_column: String,

    /// Corpus identifier column
    #[arg(long, env = "NRR_CORPUS_ID_COLUMN", default_value = "docno")]
    corpus_id_column: String,

    /// Corpus text column
    #[arg(long, env = "NRR_CORPUS_TEXT_COLUMN", default_value = "text")]
    corpus_text_column: String,

    /// Corpus column copied into each result as its source label
    #[arg(long, env = "NRR_SOURCE_COLUMN")]
    source_column: Option<String>,

    #[command(flatten)]
    model: ModelArgs,
}

impl SearchArgs {
    fn pipeline_config(&self) -> PipelineConfig {
        let mut config = PipelineConfig::new()
            .with_max_results(self.max_results)
            .with_query_columns(&self.query_id_column, &self.query_text_column)
            .with_corpus_columns(&self.corpus_id_column, &self.corpus_text_column);
        if let Some(threads) = self.threads {
            config = config.with_worker_threads(threads);
        }
        if let Some(limit) = self.max_scoring_chars {
            config = config.with_max_scoring_chars(limit);
        }
        if let Some(column) = &self.source_column {
            config = config.with_source_column(column);
        }
        config
    }

    fn engine(&self) -> Box<dyn RetrievalEngine> {
        match self.engine {
            EngineKind::Lgd => Box::new(LgdEngine::new().with_candidate_pool(self.candidate_pool)),
            EngineKind::Tantivy => Box::new(
                TantivyEngine::new(&self.index_dir).with_candidate_pool(self.candidate_pool),
            ),
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Search(args) => run_search(&args),
        Commands::Normalize => run_normalize(),
        Commands::FetchModel { model } => {
            let path = ensure_artifact(&model.weights, &model.weights_url)
                .context("Failed to fetch classifier weights")?;
            info!(path = %path.display(), "classifier weights ready");
            Ok(())
        }
    }
}

fn run_search(args: &SearchArgs) -> Result<()> {
    let queries = Frame::from_path(&args.queries)
        .with_context(|| format!("Failed to read queries from {}", args.queries.display()))?;
    let corpus = Frame::from_path(&args.corpus)
        .with_context(|| format!("Failed to read corpus from {}", args.corpus.display()))?;

    let classifier =
        MatchClassifier::load(&args.model.to_config()).context("Failed to load classifier")?;
    let pipeline = SearchPipeline::new(args.engine(), classifier, args.pipeline_config())
        .context("Invalid pipeline configuration")?;

    let mut results = pipeline.search(&queries, &corpus).context("Search failed")?;
    if args.matches_only {
        results = results.matches_only();
    }

    let matches: usize = results
        .iter()
        .map(|(_, candidates)| candidates.iter().filter(|c| c.is_match()).count())
        .sum();
    info!(queries = results.len(), matches, "search finished");

    match &args.output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            write_json(BufWriter::new(file), &results)
        }
        None => write_json(io::stdout().lock(), &results),
    }
}

fn write_json<W: Write>(mut writer: W, results: &ResultSet) -> Result<()> {
    serde_json::to_writer_pretty(&mut writer, results).context("Failed to serialize results")?;
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}

fn run_normalize() -> Result<()> {
    let normalizer = TextNormalizer::new()?;
    let stdin = io::stdin();
    let mut stdout = BufWriter::new(io::stdout().lock());
    for line in stdin.lock().lines() {
        let line = line.context("Failed to read stdin")?;
        let normalized = normalizer.normalize(&line).unwrap_or_default();
        writeln!(stdout, "{normalized}")?;
    }
    stdout.flush()?;
    Ok(())
}
