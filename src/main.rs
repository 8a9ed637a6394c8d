use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use murmur_assistant::adapters::{self, Microphone, SpeechOutput, TtsSpeech};
use murmur_assistant::registry::{Capability, ServiceRegistry};
use murmur_assistant::{Config, Daemon};

/// Murmur - background voice-command assistant
#[derive(Parser)]
#[command(name = "murmur", version, about)]
struct Cli {
    /// Path to the config file (defaults to ~/.config/murmur/config.toml)
    #[arg(short, long, env = "MURMUR_CONFIG")]
    config: Option<PathBuf>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Test microphone input
    TestMic {
        /// Seconds to wait for speech
        #[arg(short, long, default_value = "5")]
        duration: u64,
    },
    /// Test speaker output
    TestSpeaker,
    /// Test TTS output
    TestTts {
        /// Text to speak
        #[arg(default_value = "Hello! This is a test of the text to speech system.")]
        text: String,
    },
    /// Show configuration and capability status
    Status,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 => "info,murmur_assistant=info",
        1 => "info,murmur_assistant=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}

#[allow(clippy::future_not_send)]
async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = load_config(cli.config.as_deref())?;

    if let Some(cmd) = cli.command {
        return match cmd {
            Command::TestMic { duration } => test_mic(duration).await,
            Command::TestSpeaker => test_speaker().await,
            Command::TestTts { text } => test_tts(&config, &text).await,
            Command::Status => cmd_status(&config),
        };
    }

    tracing::info!(
        wake_phrases = ?config.system.wake_phrases,
        background = config.system.background_mode,
        "starting murmur"
    );

    let daemon = Daemon::new(config);
    daemon.run().await?;

    Ok(())
}

fn load_config(path: Option<&std::path::Path>) -> anyhow::Result<Config> {
    let config = match path {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    Ok(config)
}

/// Test microphone input
async fn test_mic(duration: u64) -> anyhow::Result<()> {
    println!("Listening for up to {duration} seconds...");
    println!("Speak into your microphone!\n");

    let microphone = Microphone::new()?;
    match microphone.record_phrase(Duration::from_secs(duration)).await? {
        Some(samples) => {
            #[allow(clippy::cast_precision_loss)]
            let seconds = samples.len() as f32 / adapters::SAMPLE_RATE as f32;
            println!("Captured {} samples (~{seconds:.1}s of speech).", samples.len());
            println!("Your microphone is working!");
        }
        None => {
            println!("No speech detected.");
            println!("If you were speaking, check:");
            println!("  1. Is your mic plugged in?");
            println!("  2. Run: pactl info | grep 'Default Source'");
            println!("  3. Try: pavucontrol (to check levels)");
        }
    }

    Ok(())
}

/// Test speaker output with a sine wave
async fn test_speaker() -> anyhow::Result<()> {
    println!("Testing speaker output...");
    println!("You should hear a 440Hz tone for 2 seconds\n");

    let sample_rate = 24000_u32;
    let num_samples = sample_rate as usize * 2;

    #[allow(clippy::cast_precision_loss)]
    let samples: Vec<f32> = (0..num_samples)
        .map(|i| {
            let t = i as f32 / sample_rate as f32;
            (2.0 * std::f32::consts::PI * 440.0 * t).sin() * 0.3
        })
        .collect();

    adapters::play_samples(samples).await?;

    println!("\nIf you heard the tone, your speakers are working!");
    println!("If not, check:");
    println!("  1. Run: pactl info | grep 'Default Sink'");
    println!("  2. Try: pavucontrol (to check output levels)");

    Ok(())
}

/// Test TTS output
async fn test_tts(config: &Config, text: &str) -> anyhow::Result<()> {
    println!("Testing TTS with text: \"{text}\"\n");

    let mut output = TtsSpeech::new(
        config.api_keys.openai.clone(),
        config.voice_settings.tts_model.clone(),
        config.voice_settings.tts_voice.clone(),
        config.voice_settings.tts_speed,
    );
    output.speak(text, &config.system.default_language).await?;

    println!("\nIf you heard the speech, TTS is working!");
    Ok(())
}

/// Show configuration and capability status
fn cmd_status(config: &Config) -> anyhow::Result<()> {
    let registry = ServiceRegistry::from_config(config);

    println!("Murmur voice assistant");
    println!("Wake phrases: {}", config.system.wake_phrases.join(", "));
    println!("Default language: {}", config.system.default_language);
    println!();
    println!("Capabilities:");
    for capability in Capability::ALL {
        println!("  {:<28} {:?}", capability.name(), registry.state(capability));
    }

    Ok(())
}
