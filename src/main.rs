use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use swipebot_gateway::voice::TextToSpeech;
use swipebot_gateway::{ApiServerBuilder, ApiState, ChatRequest, Config, think};

/// SwipeBot - Real-time voice sales agent gateway
#[derive(Parser)]
#[command(name = "swipebot", version, about)]
struct Cli {
    /// Port to listen on (overrides config and SWIPEBOT_PORT)
    #[arg(long)]
    port: Option<u16>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP and WebSocket server (default)
    Serve,
    /// Print the reply the brain gives for some text
    Think {
        /// User text
        text: String,
    },
    /// Test TTS output
    TestTts {
        /// Text to speak
        #[arg(default_value = "Hello! This is a test of the text to speech system.")]
        text: String,
        /// Write the audio to this file
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // RUST_LOG wins over -v
    let filter = match cli.verbose {
        0 => "info,swipebot_gateway=info",
        1 => "info,swipebot_gateway=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(cli.port).await,
        Command::Think { text } => {
            let response = think(&ChatRequest::from_text(text));
            println!("{}", serde_json::to_string_pretty(&response)?);
            Ok(())
        }
        Command::TestTts { text, out } => test_tts(&text, out).await,
    }
}

async fn serve(port: Option<u16>) -> anyhow::Result<()> {
    let mut config = Config::load()?;
    if let Some(port) = port {
        config.api_server.port = port;
    }

    tracing::info!(
        port = config.api_server.port,
        provider = ?config.voice.tts_provider,
        model = %config.voice.tts_model,
        origin = %config.api_server.allowed_origin,
        "starting swipebot gateway"
    );
    tracing::debug!(?config, "loaded configuration");

    let server = ApiServerBuilder::from_config(&config)?.build()?;
    server.run().await?;

    Ok(())
}

/// Synthesize `text` once with the configured provider
async fn test_tts(text: &str, out: Option<PathBuf>) -> anyhow::Result<()> {
    println!("Testing TTS with text: \"{text}\"\n");

    let config = Config::load()?;
    let tts = TextToSpeech::new(config.voice.tts_provider, config.tts_api_key()?.to_string())?;
    let state = ApiState::new(Arc::new(tts), config.voice.clone());

    println!("Synthesizing speech...");
    let request = state.synthesis_request(text.to_string(), None, None);
    let audio = state
        .synthesize(&request)
        .await
        .map_err(|e| anyhow::anyhow!("TTS synthesis failed: {e}"))?;
    println!("Got {} bytes of {} audio", audio.bytes.len(), audio.format.label());

    if let Some(path) = out {
        tokio::fs::write(&path, &audio.bytes).await?;
        println!("Wrote {}", path.display());
    }

    println!("\nTTS test complete!");
    Ok(())
}
