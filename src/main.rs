//! bidrag - main CLI entry point

use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use bidrag::{
    bootstrap::{check_index, Bootstrap, BootstrapStatus, IndexStatus, EXIT_CODE_SETUP_NEEDED},
    cli::{Args, Commands, Verbosity},
    config::Config,
    context::RagContext,
    corpus::Corpus,
    embedding::Embedder,
    errors::RagError,
    index::IndexBuilder,
    rag::BidAssistant,
    repl::{with_loading, ChatSession, DisplayManager, InputHandler},
    streaming::OllamaClient,
};

fn init_tracing(verbosity: Verbosity) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(verbosity.log_filter()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(args: &Args) -> Result<Config> {
    let mut config = match &args.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    args.apply_overrides(&mut config);
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbosity());

    let config = load_config(&args)?;
    info!(ollama = %config.ollama.url(), qdrant = %config.qdrant.url, "configuration loaded");

    match args.command() {
        Commands::Build { .. } => run_build(&config, args.verbosity()).await,
        Commands::Chat => run_chat(&config).await,
        Commands::Doctor => run_doctor(&config).await,
    }
}

async fn run_build(config: &Config, verbosity: Verbosity) -> Result<()> {
    let display = DisplayManager::new();

    let corpus = match Corpus::load(&config.data.corpus_path) {
        Ok(corpus) => corpus,
        Err(e @ RagError::CorpusMissing(_)) => {
            display.show_error(&e);
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    let context = match with_loading("임베딩 모델을 불러오는 중...", RagContext::load(config)).await {
        Ok(context) => context,
        Err(e) => {
            display.show_error(&e);
            std::process::exit(EXIT_CODE_SETUP_NEEDED);
        }
    };

    let report = IndexBuilder::new(&context)
        .with_progress(verbosity.show_progress())
        .build(&corpus)
        .await;

    match report {
        Ok(report) => {
            display.show_build_report(&report);
            Ok(())
        }
        Err(e @ RagError::CorpusMissing(_)) => {
            display.show_error(&e);
            Ok(())
        }
        Err(e) => {
            display.show_error(&e);
            Err(e.into())
        }
    }
}

async fn run_chat(config: &Config) -> Result<()> {
    let display = DisplayManager::new();

    let startup = with_loading("모델과 인덱스를 불러오는 중...", async {
        let context = RagContext::load(config).await?;
        let entries = context.require_index().await?;
        Ok::<_, RagError>((context, entries))
    })
    .await;

    let (context, entries) = match startup {
        Ok(ready) => ready,
        Err(e) => {
            error!(error = %e, "startup failed");
            display.show_error(&e);
            std::process::exit(EXIT_CODE_SETUP_NEEDED);
        }
    };

    let generator = OllamaClient::with_config(&config.ollama.url(), &config.ollama.model)?;
    warn_if_generator_unavailable(&generator, &display).await;
    let assistant = BidAssistant::new(&context, &generator);

    let mut session = ChatSession::new(assistant, InputHandler::default_history_path())?;
    session
        .display()
        .show_banner(env!("CARGO_PKG_VERSION"), &config.ollama.model, entries);
    session.run().await
}

/// Print setup hints when Ollama or the model is missing; chat still starts
async fn warn_if_generator_unavailable(generator: &OllamaClient, display: &DisplayManager) {
    match Bootstrap::new(generator.clone()).check().await {
        Ok(BootstrapStatus::Ready) => {}
        Ok(BootstrapStatus::OllamaNotRunning) => {
            Bootstrap::show_ollama_install_instructions();
            display.show_warning("Ollama가 준비될 때까지 검색 결과만 표시되고 답변 생성은 실패합니다.");
        }
        Ok(BootstrapStatus::ModelNotAvailable(model)) => {
            Bootstrap::show_model_pull_instructions(&model);
            display.show_warning("Ollama가 준비될 때까지 검색 결과만 표시되고 답변 생성은 실패합니다.");
        }
        Err(e) => warn!(error = %e, "ollama check failed"),
    }
}

async fn run_doctor(config: &Config) -> Result<()> {
    println!("{}", "bidrag doctor".bold().cyan());
    let mut healthy = true;

    let bootstrap = Bootstrap::new(OllamaClient::with_config(
        &config.ollama.url(),
        &config.ollama.model,
    )?);
    match bootstrap.check().await {
        Ok(BootstrapStatus::Ready) => {
            println!("{} Ollama at {} with model {}", "✓".green(), config.ollama.url(), config.ollama.model);
        }
        Ok(BootstrapStatus::OllamaNotRunning) => {
            healthy = false;
            Bootstrap::show_ollama_install_instructions();
        }
        Ok(BootstrapStatus::ModelNotAvailable(model)) => {
            healthy = false;
            Bootstrap::show_model_pull_instructions(&model);
        }
        Err(e) => {
            healthy = false;
            println!("{} Ollama check failed: {}", "✗".red(), e);
        }
    }

    if config.data.corpus_path.exists() {
        println!("{} Corpus at {}", "✓".green(), config.data.corpus_path.display());
    } else {
        println!(
            "{} Corpus not found at {}",
            "!".yellow(),
            config.data.corpus_path.display()
        );
    }

    let context = with_loading("임베딩 모델을 불러오는 중...", RagContext::load(config)).await;
    match context {
        Ok(context) => {
            println!(
                "{} Embedding model {} ({} dims)",
                "✓".green(),
                config.embedding.model_id,
                context.embedder().dimension()
            );
            match check_index(&context).await {
                IndexStatus::Ready(count) => {
                    println!("{} Index '{}' with {} entries", "✓".green(), context.collection(), count);
                }
                IndexStatus::Missing => {
                    healthy = false;
                    println!("{} Index '{}' missing; run `bidrag build`", "✗".red(), context.collection());
                }
                IndexStatus::Unreachable(reason) => {
                    healthy = false;
                    println!("{} Qdrant at {} unreachable: {}", "✗".red(), config.qdrant.url, reason);
                }
            }
        }
        Err(e) => {
            healthy = false;
            println!("{} {}", "✗".red(), e);
        }
    }

    if !healthy {
        std::process::exit(EXIT_CODE_SETUP_NEEDED);
    }
    Ok(())
}
