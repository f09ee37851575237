use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use wingman::{
    create_router, list_input_devices, AppState, Config, HttpSolver, HttpTranscriber,
    SessionManager, SessionOverrides, StartOutcome, TranscriptStore,
};

#[derive(Parser)]
#[command(
    name = "wingman",
    version,
    about = "Live interview copilot: streaming transcription with on-demand LLM answers"
)]
struct Cli {
    /// Config file path (extension optional; TOML/YAML/JSON)
    #[arg(short, long, default_value = "config/wingman")]
    config: String,

    /// Override the HTTP port
    #[arg(short, long)]
    port: Option<u16>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List available audio input devices
    Devices,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    if let Some(Commands::Devices) = cli.command {
        for name in list_input_devices()? {
            println!("{}", name);
        }
        return Ok(());
    }

    let mut config = Config::load(&cli.config)?;
    if let Some(port) = cli.port {
        config.service.http.port = port;
    }

    info!("{} starting", config.service.name);

    // Fail fast on missing credentials before any session work starts.
    let transcriber = Arc::new(HttpTranscriber::new(&config.transcription)?);
    let solver = Arc::new(HttpSolver::new(&config.solution)?);

    let transcripts = Arc::new(TranscriptStore::new());
    let manager = Arc::new(SessionManager::new(
        config.clone(),
        transcriber,
        transcripts,
    ));

    let state = AppState::new(Arc::clone(&manager), solver, config.clone());
    let app = create_router(state);

    // Kick off recording shortly after boot if configured, so the interview
    // is covered even if nobody clicks start.
    if config.recording.autostart {
        let manager = Arc::clone(&manager);
        let delay = config.recording.autostart_delay_secs;
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(delay)).await;
            match manager.start(SessionOverrides::default()).await {
                Ok(StartOutcome::Started) => info!("Recording autostarted"),
                Ok(StartOutcome::AlreadyRecording) => {
                    info!("Autostart skipped; already recording")
                }
                Err(e) => error!("Autostart failed: {}", e),
            }
        });
    }

    let addr = format!("{}:{}", config.service.http.bind, config.service.http.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Shutting down; draining any active session");
    manager.shutdown().await;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
    }
}
