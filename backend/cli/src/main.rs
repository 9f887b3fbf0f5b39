mod config;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use pagevoice_analysis::{AnalysisClient, GeminiProvider};
use pagevoice_core::{guess_mime_type, AnalysisOutcome, ImageCandidate, SpeechError};
use pagevoice_media::{is_allowed_mime, MAX_FILE_SIZE};
use pagevoice_session::RequestOrchestrator;
use pagevoice_speech::{OpenAiSynthesizer, PlaybackEngine, SpeechController, Synthesizer};

use config::Config;

#[derive(Parser)]
#[command(name = "pagevoice")]
#[command(about = "Pagevoice — scan a textbook page, get an AI explanation, hear it read aloud")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze one page image and print the explanation
    Analyze {
        /// Path to the page image (JPEG, PNG, WebP, or GIF)
        image: PathBuf,
        /// Narrate the explanation after printing it
        #[arg(long)]
        speak: bool,
        /// Output language for the explanation
        #[arg(long)]
        lang: Option<String>,
        /// Voice id for narration
        #[arg(long)]
        voice: Option<String>,
        /// Narration rate
        #[arg(long)]
        rate: Option<f32>,
    },
    /// List available narration voices
    Voices,
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env();

    // Logs go to stderr so stdout stays clean for the explanation text.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze {
            image,
            speak,
            lang,
            voice,
            rate,
        } => {
            let content = run_analysis(&config, &image, lang).await?;
            println!("{content}");
            if speak {
                narrate(&config, &content, voice, rate).await?;
            }
        }
        Commands::Voices => {
            let synthesizer =
                OpenAiSynthesizer::new(config.openai_api_key.clone().unwrap_or_default());
            for v in synthesizer.voices() {
                println!("{}\t{}\t{}", v.id, v.language, v.name);
            }
        }
    }

    Ok(())
}

async fn run_analysis(config: &Config, image: &PathBuf, lang: Option<String>) -> Result<String> {
    let api_key = config
        .gemini_api_key
        .clone()
        .context("GEMINI_API_KEY is not configured; set it in the environment")?;

    let metadata = tokio::fs::metadata(image)
        .await
        .with_context(|| format!("cannot read {}", image.display()))?;
    let candidate = ImageCandidate::new(image, guess_mime_type(image), metadata.len());

    // Pre-flight check against the shared policy constants; the validator
    // inside the pipeline enforces the same rules authoritatively.
    if !is_allowed_mime(&candidate.mime_type) {
        bail!(
            "{} does not look like a supported image (JPEG, PNG, WebP, GIF)",
            image.display()
        );
    }
    if candidate.byte_len > MAX_FILE_SIZE {
        bail!("{} exceeds the {} byte limit", image.display(), MAX_FILE_SIZE);
    }

    let provider = Arc::new(GeminiProvider::new(api_key));
    let client = AnalysisClient::new(provider)
        .with_output_language(lang.unwrap_or_else(|| config.output_language.clone()));
    let orchestrator = RequestOrchestrator::new(client);

    orchestrator.submit_image(candidate).await;
    orchestrator.trigger_analysis().await;

    let snapshot = orchestrator.snapshot().await;
    match snapshot.outcome {
        Some(AnalysisOutcome::Success { content, timestamp }) => {
            info!(timestamp = %timestamp.to_rfc3339(), "analysis complete");
            Ok(content)
        }
        Some(AnalysisOutcome::Failure { message, code }) => {
            bail!("analysis failed ({code:?}): {message}")
        }
        None => bail!("analysis produced no outcome"),
    }
}

async fn narrate(
    config: &Config,
    text: &str,
    voice_id: Option<String>,
    rate: Option<f32>,
) -> Result<()> {
    let api_key = config
        .openai_api_key
        .clone()
        .context("OPENAI_API_KEY is not configured; narration needs it")?;

    let synthesizer = Arc::new(OpenAiSynthesizer::new(api_key));
    let (events_tx, events_rx) = tokio::sync::mpsc::unbounded_channel();
    let engine = Arc::new(PlaybackEngine::new(synthesizer.clone(), events_tx));
    let mut controller = SpeechController::new(engine, events_rx);

    controller.set_rate(rate.unwrap_or(config.speech_rate));
    if let Some(id) = voice_id {
        match synthesizer.voices().into_iter().find(|v| v.id == id) {
            Some(v) => controller.set_voice(v),
            None => bail!("unknown voice: {id}"),
        }
    } else {
        controller.select_default_voice(&config.voice_language).await?;
    }

    match controller.speak(text).await {
        Ok(()) => {}
        Err(SpeechError::Unsupported) => {
            warn!("no audio output in this environment; skipping narration");
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    }

    eprintln!("narrating — p: pause, r: resume, s: stop");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;
    while controller.is_active() {
        tokio::select! {
            event = controller.next_event() => {
                match event {
                    Some(e) => controller.handle_event(e),
                    None => break,
                }
            }
            line = lines.next_line(), if stdin_open => {
                match line {
                    Ok(Some(cmd)) => match cmd.trim() {
                        "p" => controller.pause(),
                        "r" => controller.resume(),
                        "s" => controller.stop(),
                        _ => {}
                    },
                    _ => stdin_open = false,
                }
            }
        }
    }

    Ok(())
}
