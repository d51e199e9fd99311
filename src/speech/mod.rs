//! Speech output for scripted phrases
//!
//! This module provides:
//! - The `Speaker` seam the dialogue talks to
//! - A worker-thread pipeline that synthesizes phrases in order
//! - Console and external-program synthesis backends

pub mod tts;

use crate::Result;

// Re-export commonly used types
pub use tts::{
    CommandBackend, ConsoleBackend, SpeechBackend, SpeechCommand, SpeechConfig, SpeechEvent,
    SpeechHandle, SpeechPipeline, Utterance,
};

/// Anything that can say a phrase out loud.
///
/// `say` queues the phrase and returns; it does not wait for playback.
pub trait Speaker: Send {
    fn say(&self, text: &str, voice: &str, volume: f32) -> Result<()>;
}
