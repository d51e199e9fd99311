//! Text-to-speech pipeline
//!
//! Phrases are queued over a channel to a worker thread which hands them to a
//! synthesis backend one at a time, so the dialogue never blocks on playback.

use super::Speaker;
use crate::{Result, SoundboardError};
use crossbeam_channel::{bounded, Receiver, Sender};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::process::{Command, Stdio};
use std::thread;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Festival diphone voice used in the experiment
pub const DEFAULT_VOICE: &str = "voice_kal_diphone";

/// Configuration for speech output
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechConfig {
    /// Voice name passed to the backend
    pub voice: String,

    /// Playback volume in [0.0, 1.0]
    pub volume: f32,

    /// External synthesizer program; console output when unset
    pub command: Option<String>,

    /// Arguments for `command`; `{text}`, `{voice}` and `{volume}` are substituted.
    /// Without a `{text}` argument the phrase is written to the program's stdin.
    pub args: Vec<String>,

    /// Maximum number of phrases waiting to be spoken
    pub queue_size: usize,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            voice: DEFAULT_VOICE.to_string(),
            volume: 1.0,
            command: None,
            args: vec!["{text}".to_string()],
            queue_size: 32,
        }
    }
}

impl SpeechConfig {
    pub fn with_voice(mut self, voice: impl Into<String>) -> Self {
        self.voice = voice.into();
        self
    }

    pub fn with_volume(mut self, volume: f32) -> Self {
        self.volume = volume;
        self
    }

    /// Synthesize through an external program
    pub fn with_command(mut self, program: impl Into<String>, args: Vec<String>) -> Self {
        self.command = Some(program.into());
        self.args = args;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.voice.trim().is_empty() {
            return Err(SoundboardError::ConfigError("speech voice is empty".into()));
        }
        if !(0.0..=1.0).contains(&self.volume) {
            return Err(SoundboardError::ConfigError(format!(
                "speech volume {} is outside 0.0..=1.0",
                self.volume
            )));
        }
        if self.queue_size == 0 {
            return Err(SoundboardError::ConfigError(
                "speech queue size must be positive".into(),
            ));
        }
        if matches!(&self.command, Some(program) if program.trim().is_empty()) {
            return Err(SoundboardError::ConfigError(
                "speech command is empty".into(),
            ));
        }
        Ok(())
    }

    /// Build the backend this configuration describes
    pub fn backend(&self) -> Box<dyn SpeechBackend> {
        match &self.command {
            Some(program) => Box::new(CommandBackend::new(program.clone(), self.args.clone())),
            None => Box::new(ConsoleBackend),
        }
    }
}

/// A phrase waiting to be spoken
#[derive(Clone, Debug, PartialEq)]
pub struct Utterance {
    pub id: Uuid,
    pub text: String,
    pub voice: String,
    pub volume: f32,
}

impl Utterance {
    pub fn new(text: impl Into<String>, voice: impl Into<String>, volume: f32) -> Self {
        Self {
            id: Uuid::new_v4(),
            text: text.into(),
            voice: voice.into(),
            volume,
        }
    }
}

/// Command sent to the speech pipeline
#[derive(Clone, Debug)]
pub enum SpeechCommand {
    Say(Utterance),
    Shutdown,
}

/// Event emitted by the speech pipeline
#[derive(Clone, Debug)]
pub enum SpeechEvent {
    Spoken { id: Uuid, text: String },
    Error { id: Uuid, error: String },
    Shutdown,
}

/// Turns text into sound
pub trait SpeechBackend: Send {
    fn speak(&mut self, utterance: &Utterance) -> Result<()>;
}

/// Logs phrases instead of playing them
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleBackend;

impl SpeechBackend for ConsoleBackend {
    fn speak(&mut self, utterance: &Utterance) -> Result<()> {
        info!(
            voice = %utterance.voice,
            volume = utterance.volume,
            "Speaking: {}",
            utterance.text
        );
        Ok(())
    }
}

/// Runs an external synthesizer (festival, espeak, ...) per phrase
#[derive(Debug, Clone)]
pub struct CommandBackend {
    program: String,
    args: Vec<String>,
}

impl CommandBackend {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    fn expand_args(&self, utterance: &Utterance) -> Vec<String> {
        let volume = format!("{:.2}", utterance.volume);
        self.args
            .iter()
            .map(|arg| {
                arg.replace("{text}", &utterance.text)
                    .replace("{voice}", &utterance.voice)
                    .replace("{volume}", &volume)
            })
            .collect()
    }

    fn text_via_stdin(&self) -> bool {
        !self.args.iter().any(|arg| arg.contains("{text}"))
    }
}

impl SpeechBackend for CommandBackend {
    fn speak(&mut self, utterance: &Utterance) -> Result<()> {
        let args = self.expand_args(utterance);
        let via_stdin = self.text_via_stdin();

        debug!("Running {} {:?}", self.program, args);

        let mut child = Command::new(&self.program)
            .args(&args)
            .stdin(if via_stdin { Stdio::piped() } else { Stdio::null() })
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                SoundboardError::SpeechError(format!("failed to start {}: {}", self.program, e))
            })?;

        // Dropping stdin closes it so the synthesizer sees end of input
        let written = match child.stdin.take() {
            Some(mut stdin) if via_stdin => stdin.write_all(utterance.text.as_bytes()),
            _ => Ok(()),
        };

        // Always reap the child, even when it stopped reading early
        let output = child.wait_with_output().map_err(|e| {
            SoundboardError::SpeechError(format!("failed to wait for {}: {}", self.program, e))
        })?;
        if let Err(e) = written {
            return Err(SoundboardError::SpeechError(format!(
                "{} did not take the text ({}): {}",
                self.program,
                output.status,
                e
            )));
        }
        if !output.status.success() {
            return Err(SoundboardError::SpeechError(format!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        Ok(())
    }
}

/// Cloneable front end of a running speech pipeline
#[derive(Clone, Debug)]
pub struct SpeechHandle {
    command_tx: Sender<SpeechCommand>,
}

impl SpeechHandle {
    /// Ask the worker to stop after the phrases already queued
    pub fn shutdown(&self) -> Result<()> {
        self.command_tx
            .send(SpeechCommand::Shutdown)
            .map_err(|e| SoundboardError::ChannelError(format!("Failed to stop speech: {}", e)))
    }
}

impl Speaker for SpeechHandle {
    fn say(&self, text: &str, voice: &str, volume: f32) -> Result<()> {
        self.command_tx
            .send(SpeechCommand::Say(Utterance::new(text, voice, volume)))
            .map_err(|e| SoundboardError::ChannelError(format!("Failed to queue speech: {}", e)))
    }
}

/// Speech pipeline with channel-based communication
pub struct SpeechPipeline {
    command_tx: Sender<SpeechCommand>,
    command_rx: Receiver<SpeechCommand>,
    event_tx: Sender<SpeechEvent>,
    event_rx: Receiver<SpeechEvent>,
}

impl SpeechPipeline {
    pub fn new(config: &SpeechConfig) -> Self {
        let (command_tx, command_rx) = bounded(config.queue_size);
        let (event_tx, event_rx) = bounded(config.queue_size);

        Self {
            command_tx,
            command_rx,
            event_tx,
            event_rx,
        }
    }

    pub fn handle(&self) -> SpeechHandle {
        SpeechHandle {
            command_tx: self.command_tx.clone(),
        }
    }

    /// Events are dropped, not queued, once this receiver falls behind
    pub fn event_receiver(&self) -> Receiver<SpeechEvent> {
        self.event_rx.clone()
    }

    /// Start the pipeline worker thread
    pub fn start_worker(
        self,
        mut backend: Box<dyn SpeechBackend>,
    ) -> Result<thread::JoinHandle<()>> {
        let command_rx = self.command_rx;
        let event_tx = self.event_tx;

        thread::Builder::new()
            .name("speech".into())
            .spawn(move || {
                info!("Speech pipeline worker ready");

                loop {
                    match command_rx.recv() {
                        Ok(SpeechCommand::Say(utterance)) => {
                            let event = match backend.speak(&utterance) {
                                Ok(()) => SpeechEvent::Spoken {
                                    id: utterance.id,
                                    text: utterance.text,
                                },
                                Err(e) => {
                                    warn!("Speech failed for '{}': {}", utterance.text, e);
                                    SpeechEvent::Error {
                                        id: utterance.id,
                                        error: e.to_string(),
                                    }
                                }
                            };
                            let _ = event_tx.try_send(event);
                        }

                        Ok(SpeechCommand::Shutdown) => {
                            info!("Speech pipeline worker shutting down");
                            let _ = event_tx.try_send(SpeechEvent::Shutdown);
                            break;
                        }

                        Err(e) => {
                            error!("Speech command channel error: {}", e);
                            break;
                        }
                    }
                }

                info!("Speech pipeline worker stopped");
            })
            .map_err(|e| SoundboardError::SpeechError(format!("failed to start worker: {}", e)))
    }
}
