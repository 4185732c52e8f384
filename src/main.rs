use bookrec::{
    train_and_save, ArtifactStore, RestApi, ServeConfig, SimilarityMetric, TrainConfig,
    UnknownBookPolicy,
};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

/// Item-based collaborative-filtering book recommender
#[derive(Parser, Debug)]
#[command(name = "bookrec")]
#[command(about = "Train and serve an item-based book recommender", long_about = None)]
struct Args {
    /// Log level
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Train from ratings.csv and books.csv and write the model artifact
    Train {
        /// Directory holding ratings.csv and books.csv
        #[arg(short, long, env = "DATA_DIR", default_value = "data")]
        data_dir: PathBuf,

        /// Directory the artifact is written to
        #[arg(short, long, env = "MODEL_DIR", default_value = "models")]
        model_dir: PathBuf,

        /// Similarity metric: cosine or adjusted
        #[arg(long, default_value_t = SimilarityMetric::Cosine)]
        metric: SimilarityMetric,

        /// Fail on ratings whose book_id is missing from books.csv instead of dropping them
        #[arg(long)]
        strict: bool,
    },

    /// Load the model artifact and serve the HTTP API
    Serve {
        /// Directory holding the trained artifact
        #[arg(short, long, env = "MODEL_DIR", default_value = "models")]
        model_dir: PathBuf,

        /// Address to bind
        #[arg(long, env = "HOST", default_value = "0.0.0.0")]
        host: String,

        /// HTTP API port
        #[arg(long, env = "PORT", default_value_t = 8000)]
        port: u16,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let log_level = match args.log_level.as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match args.command {
        Command::Train {
            data_dir,
            model_dir,
            metric,
            strict,
        } => {
            let config = TrainConfig {
                data_dir,
                model_dir,
                metric,
                unknown_books: if strict {
                    UnknownBookPolicy::Reject
                } else {
                    UnknownBookPolicy::Drop
                },
            };
            train(config)
        }
        Command::Serve {
            model_dir,
            host,
            port,
        } => serve(ServeConfig { model_dir, host, port }).await,
    }
}

fn train(config: TrainConfig) -> anyhow::Result<()> {
    info!("Starting bookrec trainer v{}", env!("CARGO_PKG_VERSION"));
    info!("Data directory: {:?}", config.data_dir);
    info!("Model directory: {:?}", config.model_dir);

    let manifest = train_and_save(&config)?;

    info!("Training complete. Artifacts saved to {:?}", config.model_dir);
    info!(
        "Users: {} Items: {} Pairs: {}",
        manifest.stats.users, manifest.stats.items, manifest.stats.similarity_pairs
    );
    Ok(())
}

async fn serve(config: ServeConfig) -> anyhow::Result<()> {
    info!("Starting bookrec server v{}", env!("CARGO_PKG_VERSION"));
    info!("Model directory: {:?}", config.model_dir);

    // The server never starts without a valid artifact.
    let artifact = ArtifactStore::new(&config.model_dir).load()?;
    info!(
        "Model loaded: {} metric, trained at {}, {} ratings",
        artifact.manifest.metric, artifact.manifest.trained_at, artifact.manifest.stats.ratings
    );
    let recommender = Arc::new(artifact.into_recommender());

    let host = config.host.clone();
    let port = config.port;
    let http_handle = std::thread::spawn(move || {
        info!("Starting HTTP server on {}:{}", host, port);
        let sys = actix_web::rt::System::new();
        sys.block_on(RestApi::start(recommender, &host, port))
    });

    info!("HTTP API: http://localhost:{}/", config.port);

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received");
        }
        joined = tokio::task::spawn_blocking(move || http_handle.join()) => {
            match joined {
                Ok(Ok(Ok(()))) => info!("HTTP server stopped"),
                Ok(Ok(Err(e))) => {
                    error!("HTTP server error: {}", e);
                    return Err(e.into());
                }
                _ => anyhow::bail!("HTTP server thread panicked"),
            }
        }
    }

    info!("Shutting down...");
    Ok(())
}
