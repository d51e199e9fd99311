use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use soundboard::integration::{simulated_robot, Collaborators, Soundboard, SoundboardConfig};
use soundboard::objects::ObjectCatalog;
use soundboard::speech::SpeechPipeline;
use soundboard::tracking::{spawn_point_monitor, ChannelPublisher};
use std::io;
use std::path::PathBuf;
use std::thread::JoinHandle;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum LogFormat {
    Full,
    Compact,
}

/// Speak scripted questions and point the robot at the objects they mention
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// TOML configuration file
    #[arg(long, env = "SOUNDBOARD_CONFIG")]
    config: Option<PathBuf>,

    /// Object list with one `label,x,y,z` per line
    #[arg(long, env = "SOUNDBOARD_OBJECTS")]
    objects: Option<PathBuf>,

    #[arg(long, env = "SOUNDBOARD_VOICE")]
    voice: Option<String>,

    #[arg(long, env = "SOUNDBOARD_VOLUME")]
    volume: Option<f32>,

    /// External synthesizer program, e.g. espeak
    #[arg(long, env = "SOUNDBOARD_SPEECH_COMMAND")]
    speech_command: Option<String>,

    #[arg(long, env = "SOUNDBOARD_LOG_FORMAT", value_enum, default_value = "full")]
    log_format: LogFormat,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Logs go to stderr so they do not interleave with the menu
    let fmt_layer = match args.log_format {
        LogFormat::Full => tracing_subscriber::fmt::layer()
            .with_writer(io::stderr)
            .boxed(),
        LogFormat::Compact => tracing_subscriber::fmt::layer()
            .with_writer(io::stderr)
            .compact()
            .boxed(),
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "soundboard=debug,info".into()),
        )
        .with(fmt_layer)
        .init();

    info!("Starting soundboard");

    let config = load_config(&args)?;
    config.validate()?;

    let catalog = ObjectCatalog::load(&config.objects_path)
        .with_context(|| format!("loading objects from {}", config.objects_path.display()))?;
    let script = config.script();

    let (tree, base) = simulated_robot(&config)?;

    let pipeline = SpeechPipeline::new(&config.speech);
    let speech = pipeline.handle();
    let speech_worker = pipeline.start_worker(config.speech.backend())?;

    let (publisher, points) =
        ChannelPublisher::new(config.point_topic.as_str(), config.point_queue_size);
    let monitor = spawn_point_monitor(config.point_topic.as_str(), points)?;

    let collaborators = Collaborators {
        speaker: Box::new(speech.clone()),
        navigation: Box::new(base),
        transforms: Box::new(tree),
        publisher: Box::new(publisher),
    };

    // The session owns the publisher; dropping it lets the monitor finish
    let outcome = Soundboard::connect(config, script, catalog, collaborators)
        .and_then(|mut board| board.run(io::stdin().lock(), io::stdout().lock()));

    if let Err(e) = speech.shutdown() {
        warn!("Speech worker already stopped: {}", e);
    }
    join_worker("speech", speech_worker);
    join_worker("point monitor", monitor);

    if let Err(e) = outcome {
        error!("{}", e);
        eprintln!("{}", e.user_message());
        return Err(e.into());
    }

    info!("Soundboard stopped");
    Ok(())
}

fn load_config(args: &Args) -> Result<SoundboardConfig> {
    let mut config = match &args.config {
        Some(path) => SoundboardConfig::load(path)?,
        None => SoundboardConfig::default(),
    };

    if let Some(objects) = &args.objects {
        config.objects_path = objects.clone();
    }
    if let Some(voice) = &args.voice {
        config.speech.voice = voice.clone();
    }
    if let Some(volume) = args.volume {
        config.speech.volume = volume;
    }
    if let Some(program) = &args.speech_command {
        config.speech.command = Some(program.clone());
    }

    Ok(config)
}

/// Wait for a worker thread, reporting whether it finished without panicking
fn join_worker(name: &str, handle: JoinHandle<()>) -> bool {
    match handle.join() {
        Ok(()) => true,
        Err(_) => {
            warn!("{} thread panicked", name);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_join_worker_reports_panic() {
        let clean = thread::spawn(|| {});
        assert!(join_worker("clean", clean));

        let crashed = thread::spawn(|| panic!("backend blew up"));
        assert!(!join_worker("crashed", crashed));
    }

    #[test]
    fn test_cli_overrides_config() {
        let args = Args::parse_from([
            "soundboard",
            "--objects",
            "lab/objects.txt",
            "--voice",
            "en",
            "--volume",
            "0.5",
            "--speech-command",
            "espeak",
        ]);
        let config = load_config(&args).unwrap();

        assert_eq!(config.objects_path, PathBuf::from("lab/objects.txt"));
        assert_eq!(config.speech.voice, "en");
        assert_eq!(config.speech.volume, 0.5);
        assert_eq!(config.speech.command.as_deref(), Some("espeak"));
    }
}
