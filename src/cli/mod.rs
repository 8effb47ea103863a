use crate::config::Config;
use crate::embeddings::create_embedder;
use crate::indexing::create_vector_db;
use crate::models::AppState;
use crate::preprocess::preprocess_complaints;
use crate::rag::{format_chat_reply, source_snippets, RagChain};
use crate::routes::create_router;
use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tokio::net::TcpListener;
use tracing::info;

/// CrediTrust complaint analysis: preprocessing, indexing and question answering
#[derive(Parser, Debug)]
#[command(name = "complaint-rag")]
#[command(version)]
#[command(about = "Retrieval-augmented Q&A over CFPB consumer complaints", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Filter and clean the raw complaints export
    Preprocess(PreprocessArgs),

    /// Sample, chunk and embed processed complaints into a vector index
    Index(IndexArgs),

    /// Answer a single question and print the reply
    Ask(AskArgs),

    /// Serve the HTTP API and browser chat page
    Serve(ServeArgs),

    /// Interactive terminal chat
    Chat,
}

#[derive(Args, Debug)]
pub struct PreprocessArgs {
    /// Raw CFPB complaints CSV
    #[arg(long)]
    pub input: Option<PathBuf>,

    /// Where to write the filtered CSV
    #[arg(long)]
    pub output: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct IndexArgs {
    /// Processed complaints CSV
    #[arg(long)]
    pub input: Option<PathBuf>,

    /// Vector index directory
    #[arg(long)]
    pub db: Option<PathBuf>,

    /// Number of complaints to sample across products
    #[arg(long)]
    pub sample_size: Option<usize>,
}

#[derive(Args, Debug)]
pub struct AskArgs {
    /// The question to answer
    pub question: String,

    /// Print the full response as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct ServeArgs {
    #[arg(long)]
    pub host: Option<String>,

    #[arg(long)]
    pub port: Option<u16>,
}

/// Whether the command takes over the terminal (logs must go to a file)
pub fn uses_terminal_ui(cli: &Cli) -> bool {
    matches!(cli.command, Commands::Chat)
}

/// Execute CLI command
pub async fn execute(cli: Cli, config: Config) -> Result<()> {
    match cli.command {
        Commands::Preprocess(args) => preprocess(args, config),
        Commands::Index(args) => index(args, config).await,
        Commands::Ask(args) => ask(args, config).await,
        Commands::Serve(args) => serve(args, config).await,
        Commands::Chat => crate::tui::run(config).await,
    }
}

fn preprocess(args: PreprocessArgs, config: Config) -> Result<()> {
    let input = args.input.unwrap_or(config.data.raw_data_path);
    let output = args.output.unwrap_or(config.data.processed_data_path);

    let report = preprocess_complaints(&input, &output)
        .with_context(|| format!("preprocessing {}", input.display()))?;
    println!(
        "Kept {} of {} complaints ({} without a narrative) -> {}",
        report.written,
        report.total_rows,
        report.empty_narratives_removed,
        output.display()
    );
    Ok(())
}

async fn index(args: IndexArgs, mut config: Config) -> Result<()> {
    let input = args.input.unwrap_or(config.data.processed_data_path.clone());
    let db = args.db.unwrap_or(config.data.vector_db_dir.clone());
    if let Some(sample_size) = args.sample_size {
        config.index.sample_size = sample_size;
    }

    let embedder = create_embedder(&config.embedding)?;
    info!(provider = embedder.name(), model = embedder.model(), "Embedding provider ready");

    let report = create_vector_db(
        &input,
        &db,
        &config.index,
        embedder.as_ref(),
        config.embedding.batch_size,
    )
    .await
    .with_context(|| format!("building index from {}", input.display()))?;

    println!(
        "Indexed {} chunks from {} complaints ({} dimensions) -> {}",
        report.chunks,
        report.sampled_complaints,
        report.dimensions,
        db.display()
    );
    Ok(())
}

async fn ask(args: AskArgs, config: Config) -> Result<()> {
    let chain = RagChain::load(&config).await?;
    let response = chain.invoke(&args.question).await?;

    if args.json {
        let body = serde_json::json!({
            "query": response.query,
            "answer": response.result,
            "sources": source_snippets(&response),
        });
        println!("{}", serde_json::to_string_pretty(&body)?);
    } else {
        println!("{}", format_chat_reply(&response));
    }
    Ok(())
}

async fn serve(args: ServeArgs, mut config: Config) -> Result<()> {
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }

    let listener = bind_listener(&config.server.host, config.server.port).await?;
    let state = AppState::new(config);
    let app = create_router(state);

    info!("Server listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;

    Ok(())
}

/// Bind the HTTP listener; `host` may be an IP address or a hostname.
async fn bind_listener(host: &str, port: u16) -> Result<TcpListener> {
    TcpListener::bind((host, port))
        .await
        .with_context(|| format!("binding {}:{}", host, port))
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutting down");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_subcommands() {
        let cli = Cli::try_parse_from(["complaint-rag", "ask", "Tell me about credit card fees.", "--json"]).unwrap();
        match cli.command {
            Commands::Ask(args) => {
                assert_eq!(args.question, "Tell me about credit card fees.");
                assert!(args.json);
            }
            other => panic!("unexpected command: {other:?}"),
        }

        let cli = Cli::try_parse_from(["complaint-rag", "index", "--sample-size", "500"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Index(IndexArgs { sample_size: Some(500), .. })
        ));

        let cli = Cli::try_parse_from(["complaint-rag", "chat"]).unwrap();
        assert!(uses_terminal_ui(&cli));
    }

    #[tokio::test]
    async fn test_bind_accepts_hostnames() {
        let listener = bind_listener("localhost", 0).await.unwrap();
        let addr = listener.local_addr().unwrap();
        assert!(addr.ip().is_loopback());
        assert_ne!(addr.port(), 0);

        assert!(bind_listener("127.0.0.1", 0).await.is_ok());
    }

    #[test]
    fn test_ask_requires_question() {
        assert!(Cli::try_parse_from(["complaint-rag", "ask"]).is_err());
    }

    #[test]
    fn test_preprocess_command_writes_output() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("raw.csv");
        std::fs::write(
            &input,
            "Complaint ID,Product,Consumer complaint narrative\n1,Credit card,Charged a $40 fee\n",
        )
        .unwrap();
        let output = dir.path().join("out.csv");

        preprocess(
            PreprocessArgs {
                input: Some(input),
                output: Some(output.clone()),
            },
            crate::config::test_config(),
        )
        .unwrap();

        let written = std::fs::read_to_string(output).unwrap();
        assert!(written.contains("charged a fee"));
    }
}
