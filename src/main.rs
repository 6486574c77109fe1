// file: src/main.rs
// description: commandline application entry point with command handling
// reference: application bootstrap and orchestration

use anyhow::{Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand};
use ragquery::api::{ActionHandler, contract_schemas};
use ragquery::pipeline::{parse_questions, run_batch};
use ragquery::transform::TransformOverrides;
use ragquery::utils::logging::{
    format_error, format_info, format_score, format_step, format_success, format_warning,
    init_logger,
};
use ragquery::{
    AuditLogger, Chunker, ChunkerConfig, Config, Document, DocumentLoader, Generator,
    JsonExporter, OpenAiCompatClient, OperationTimer, PerformanceMetrics, ProgressTracker,
    RagPipeline, RagRequest, RankedResult, RetryPolicy, Retrying, SourceType, StoredAuditRecord,
    TransformOptions, Validator, analyze_complexity, extract_citations, search, transform,
};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

const PREVIEW_CHARS: usize = 300;

#[derive(Parser)]
#[command(name = "ragquery")]
#[command(author = "cipher")]
#[command(version = "0.1.0")]
#[command(about = "Grounded question answering over a single document", long_about = None)]
struct Cli {
    /// Configuration file (defaults to config/default.toml when present)
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    #[arg(long, default_value_t = true, action = ArgAction::Set, global = true)]
    color: bool,

    #[arg(short, long, action = ArgAction::SetTrue, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct DocumentArgs {
    /// Pre-extracted document text (.txt, .md, form-feed paged text)
    #[arg(short, long, value_name = "PATH")]
    file: PathBuf,

    #[arg(long, default_value = "text")]
    source_type: SourceType,
}

#[derive(Subcommand)]
enum Commands {
    /// Answer a question about a document
    Ask {
        #[command(flatten)]
        document: DocumentArgs,

        #[arg(short, long)]
        query: String,

        #[arg(short = 'k', long)]
        top_k: Option<usize>,

        /// Write an audit record for this user
        #[arg(short, long)]
        user: Option<String>,

        /// Print the full outcome as JSON
        #[arg(long)]
        json: bool,
    },

    /// Rank passages against a query without calling the model
    Search {
        #[command(flatten)]
        document: DocumentArgs,

        #[arg(short, long)]
        query: String,

        #[arg(short = 'k', long)]
        top_k: Option<usize>,
    },

    /// Print the provenance-tagged chunks of a document
    Chunk {
        #[command(flatten)]
        document: DocumentArgs,
    },

    /// Show the search queries a question is transformed into
    Transform {
        #[arg(short, long)]
        query: String,

        #[arg(long, overrides_with = "no_expand")]
        expand: bool,

        #[arg(long)]
        no_expand: bool,

        #[arg(long)]
        decompose: bool,

        #[arg(long)]
        hyde: bool,

        #[arg(long)]
        step_back: bool,

        /// Fill unset flags from the complexity heuristic
        #[arg(long)]
        auto: bool,
    },

    /// Print the complexity report for a query
    Analyze {
        #[arg(short, long)]
        query: String,
    },

    /// Extract citations from an answer
    Citations {
        #[arg(short, long, conflicts_with = "file", required_unless_present = "file")]
        text: Option<String>,

        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// Run one rag/scrape/chat action request and print the JSON response
    Action {
        /// Request file; stdin when omitted
        #[arg(short, long, value_name = "FILE")]
        input: Option<PathBuf>,
    },

    /// Answer a file of questions and export the answers as JSON
    Batch {
        #[command(flatten)]
        document: DocumentArgs,

        /// One question per line, `#` comments allowed
        #[arg(long, value_name = "FILE")]
        questions: PathBuf,

        #[arg(short, long, default_value = "./answers")]
        output: PathBuf,

        #[arg(short, long)]
        pretty: bool,

        #[arg(short, long)]
        user: Option<String>,

        #[arg(long, default_value_t = 2)]
        concurrency: usize,
    },

    /// List a user's audit records or show a single record
    Audit {
        #[arg(short, long, required_unless_present = "id")]
        user: Option<String>,

        #[arg(short, long, default_value_t = 50)]
        limit: usize,

        #[arg(long, conflicts_with = "user")]
        id: Option<i64>,
    },

    /// Print the JSON Schemas of the action contract
    Schema,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logger(cli.color, cli.verbose);

    let config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;
    debug!("Configuration loaded");

    match cli.command {
        Commands::Ask {
            document,
            query,
            top_k,
            user,
            json,
        } => {
            cmd_ask(&config, &document, &query, top_k, user, json).await?;
        }
        Commands::Search {
            document,
            query,
            top_k,
        } => {
            cmd_search(&config, &document, &query, top_k)?;
        }
        Commands::Chunk { document } => {
            cmd_chunk(&config, &document)?;
        }
        Commands::Transform {
            query,
            expand,
            no_expand,
            decompose,
            hyde,
            step_back,
            auto,
        } => {
            let overrides = TransformOverrides {
                expansion: match (expand, no_expand) {
                    (true, _) => Some(true),
                    (_, true) => Some(false),
                    _ => None,
                },
                decomposition: decompose.then_some(true),
                hyde: hyde.then_some(true),
                step_back: step_back.then_some(true),
            };
            cmd_transform(&config, &query, overrides, auto).await?;
        }
        Commands::Analyze { query } => {
            cmd_analyze(&query)?;
        }
        Commands::Citations { text, file } => {
            cmd_citations(text, file)?;
        }
        Commands::Action { input } => {
            cmd_action(&config, input).await?;
        }
        Commands::Batch {
            document,
            questions,
            output,
            pretty,
            user,
            concurrency,
        } => {
            cmd_batch(
                &config,
                &document,
                &questions,
                output,
                pretty,
                user.as_deref(),
                concurrency,
                cli.color,
            )
            .await?;
        }
        Commands::Audit { user, limit, id } => {
            cmd_audit(&config, user.as_deref(), limit, id).await?;
        }
        Commands::Schema => {
            println!("{}", serde_json::to_string_pretty(&contract_schemas())?);
        }
    }

    Ok(())
}

fn build_generator(config: &Config) -> Result<Arc<dyn Generator>> {
    if config.generation.api_key.is_none() {
        warn!("No generation API key configured (set RAGQUERY__GENERATION__API_KEY)");
    }
    let client =
        OpenAiCompatClient::new(&config.generation).context("Failed to create generation client")?;
    Ok(Arc::new(client))
}

async fn build_pipeline(config: &Config) -> Result<RagPipeline> {
    let generator = build_generator(config)?;
    let audit = AuditLogger::from_config_or_disabled(&config.audit).await;
    Ok(RagPipeline::new(config.clone(), generator, audit))
}

fn load_document(args: &DocumentArgs) -> Result<Document> {
    DocumentLoader::new()
        .load(&args.file, args.source_type)
        .with_context(|| format!("Failed to load document {}", args.file.display()))
}

fn read_file(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

async fn cmd_ask(
    config: &Config,
    args: &DocumentArgs,
    query: &str,
    top_k: Option<usize>,
    user: Option<String>,
    json: bool,
) -> Result<()> {
    let document = load_document(args)?;
    let pipeline = build_pipeline(config).await?;

    let mut request = RagRequest::new(query);
    if let Some(k) = top_k {
        request = request.with_top_k(k);
    }
    if let Some(user) = user {
        request = request.with_user(user);
    }

    let outcome = pipeline
        .answer(&document, &request)
        .await
        .context("Failed to answer query")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
        return Ok(());
    }

    if outcome.synthesis.degraded {
        println!(
            "\n{}",
            format_warning("Generation unavailable, showing the best passage instead")
        );
    }
    println!("\n{}\n", outcome.synthesis.answer);
    print_ranked(&outcome.synthesis.ranked_chunks);

    if !outcome.citations.is_empty() {
        println!("\nCitations:");
        for citation in &outcome.citations {
            println!("  {} at char {}", citation.matched_text, citation.position);
        }
    }

    if let Some(id) = outcome.audit_id {
        println!("\n{}", format_info(&format!("Audit record {}", id)));
    }
    info!("Answered in {}ms", outcome.latency_ms);

    Ok(())
}

fn cmd_search(
    config: &Config,
    args: &DocumentArgs,
    query: &str,
    top_k: Option<usize>,
) -> Result<()> {
    Validator::validate_query(query)?;
    let document = load_document(args)?;
    let chunks = Chunker::new(ChunkerConfig::from(&config.retrieval))
        .chunk(&document.content, &document.hints())
        .context("Failed to chunk document")?;

    let top_k = top_k.unwrap_or(config.retrieval.top_k);
    Validator::validate_top_k(top_k)?;
    let ranked = search(&chunks, query, top_k);

    println!("\nSearch results for: \"{}\"", query);
    println!("{} of {} passages\n", ranked.len(), chunks.len());
    print_ranked(&ranked);

    Ok(())
}

fn cmd_chunk(config: &Config, args: &DocumentArgs) -> Result<()> {
    let document = load_document(args)?;
    let chunks = Chunker::new(ChunkerConfig::from(&config.retrieval))
        .chunk(&document.content, &document.hints())
        .context("Failed to chunk document")?;

    println!("{}", "=".repeat(80));
    for chunk in &chunks {
        let page = chunk
            .page_number
            .map(|p| format!(" page {}", p))
            .unwrap_or_default();
        println!(
            "\n#{}{} [{}] chars {}..{}",
            chunk.index,
            page,
            chunk.section_id.as_deref().unwrap_or("-"),
            chunk.start_char,
            chunk.end_char
        );
        println!("   {}", Validator::truncate_text(&chunk.text, PREVIEW_CHARS));
    }
    println!("\n{}", "=".repeat(80));
    println!(
        "{}",
        format_success(&format!("{} chunks from {}", chunks.len(), document.source_ref))
    );

    Ok(())
}

async fn cmd_transform(
    config: &Config,
    query: &str,
    overrides: TransformOverrides,
    auto: bool,
) -> Result<()> {
    Validator::validate_query(query)?;
    let report = auto.then(|| analyze_complexity(query));
    let options = TransformOptions::resolve(&overrides, report.as_ref());
    debug!("Transform options: {:?}", options);

    let generator = Retrying::new(
        build_generator(config)?,
        RetryPolicy::from(&config.transform).with_timeout(config.generation.timeout()),
    );
    let transformed = transform(query, &generator, &options).await;

    println!("\nSearch queries for: \"{}\"\n", query);
    for (i, search_query) in transformed.search_queries.iter().enumerate() {
        println!(
            "{} {}",
            format_step(i + 1, transformed.search_queries.len(), search_query.origin.as_str()),
            search_query.text
        );
    }

    Ok(())
}

fn cmd_analyze(query: &str) -> Result<()> {
    Validator::validate_query(query)?;
    let report = analyze_complexity(query);
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn cmd_citations(text: Option<String>, file: Option<PathBuf>) -> Result<()> {
    let answer = match (text, file) {
        (Some(text), _) => text,
        (None, Some(path)) => read_file(&path)?,
        (None, None) => anyhow::bail!("Provide --text or --file"),
    };

    let citations = extract_citations(&answer);
    println!("{}", serde_json::to_string_pretty(&citations)?);
    Ok(())
}

async fn cmd_action(config: &Config, input: Option<PathBuf>) -> Result<()> {
    let body = match input {
        Some(path) => read_file(&path)?,
        None => {
            let mut buffer = String::new();
            std::io::stdin()
                .read_to_string(&mut buffer)
                .context("Failed to read request from stdin")?;
            buffer
        }
    };

    let handler = ActionHandler::new(Arc::new(build_pipeline(config).await?));
    let (status, response) = handler.handle_json(&body).await;

    if status == 200 {
        info!("Action completed");
    } else {
        eprintln!("{}", format_error(&format!("Action failed with status {}", status)));
    }
    println!("{}", serde_json::to_string_pretty(&response)?);

    Ok(())
}

#[allow(clippy::too_many_arguments)]
async fn cmd_batch(
    config: &Config,
    args: &DocumentArgs,
    questions_path: &Path,
    output: PathBuf,
    pretty: bool,
    user: Option<&str>,
    concurrency: usize,
    color: bool,
) -> Result<()> {
    let document = load_document(args)?;
    let questions = parse_questions(&read_file(questions_path)?);
    if questions.is_empty() {
        println!("{}", format_warning("No questions found"));
        return Ok(());
    }

    let exporter = JsonExporter::new(output, pretty).context("Failed to prepare output directory")?;
    let pipeline = build_pipeline(config).await?;

    info!("Answering {} questions", questions.len());
    let timer = OperationTimer::new("batch");
    let progress = ProgressTracker::with_color(questions.len(), color);
    progress.set_message(format!("{} questions", questions.len()));

    let answers = run_batch(
        &pipeline,
        &document,
        &questions,
        user,
        concurrency.max(1),
        &progress,
    )
    .await;

    progress.finish();
    let stats = progress.get_stats();
    let manifest = exporter
        .export_batch(&document.id, &answers, &stats)
        .context("Failed to export answers")?;

    let latencies: Vec<u64> = answers
        .iter()
        .filter(|a| a.error.is_none())
        .map(|a| a.latency_ms)
        .collect();
    let metrics = PerformanceMetrics::from_latencies("batch", &latencies, timer.finish());
    println!("\n{}", stats.summary());
    println!("{}", format_info(&metrics.format()));
    println!(
        "{}",
        format_success(&format!(
            "Exported {} files to {}",
            manifest.files.len() + 1,
            exporter.output_dir().display()
        ))
    );

    Ok(())
}

async fn cmd_audit(config: &Config, user: Option<&str>, limit: usize, id: Option<i64>) -> Result<()> {
    let audit = AuditLogger::from_config(&config.audit)
        .await
        .context("Failed to open audit log")?;
    if !audit.is_enabled() {
        println!("{}", format_warning("Audit logging is disabled in the configuration"));
        return Ok(());
    }

    if let Some(id) = id {
        match audit.find(id).await {
            Some(record) => print_audit_record(&record),
            None => println!("{}", format_warning(&format!("No audit record {}", id))),
        }
        return Ok(());
    }

    let Some(user) = user else {
        anyhow::bail!("Provide --user or --id");
    };

    let records = audit.recent(user, limit).await;
    if records.is_empty() {
        println!("\nNo audit records for user \"{}\"\n", user);
        return Ok(());
    }

    println!("\n{} audit record(s) for \"{}\"", records.len(), user);
    for record in &records {
        print_audit_record(record);
    }

    Ok(())
}

fn print_ranked(ranked: &RankedResult) {
    if ranked.is_empty() {
        println!("No passages");
        return;
    }

    println!("{}", "=".repeat(80));
    for (i, chunk) in ranked.iter().enumerate() {
        let page = chunk
            .page_number
            .map(|p| format!(" (Page {})", p))
            .unwrap_or_default();
        let section = chunk
            .section_id
            .as_deref()
            .map(|s| format!(" §{}", s))
            .unwrap_or_default();
        println!(
            "\n[Source {}]{}{} {}",
            i + 1,
            page,
            section,
            format_score(chunk.score)
        );
        for line in Validator::truncate_text(&chunk.text, PREVIEW_CHARS).lines().take(5) {
            println!("     {}", line);
        }
    }
    println!("\n{}", "=".repeat(80));
}

fn print_audit_record(stored: &StoredAuditRecord) {
    let record = &stored.record;
    println!(
        "\n#{} {} user={} latency={}ms",
        stored.id, stored.created_at, record.user_id, record.latency_ms
    );
    println!("   Query: {}", record.query_text);
    println!("   Retrieved: {:?}", record.retrieved_chunk_ids);
    println!("   Fed to model: {:?}", record.chunks_fed_to_model);
    println!("   Cited: {:?}", record.cited_chunk_ids);
    println!(
        "   Response: {}",
        Validator::truncate_text(&record.model_response, PREVIEW_CHARS)
    );
}
