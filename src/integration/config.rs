//! Configuration for the experiment harness
//!
//! Defaults reproduce the lab setup; a TOML file can override any section.

use crate::script::{Question, Script};
use crate::speech::SpeechConfig;
use crate::tracking::DEFAULT_QUEUE_SIZE;
use crate::{Result, SoundboardError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Names of the reference frames involved in facing and tracking
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameConfig {
    /// Frame the object coordinates are given in
    pub world: String,

    /// Frame of the mobile base, +x forward
    pub base: String,

    /// Frame of the pan-tilt unit
    pub pan_tilt: String,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            world: "map".to_string(),
            base: "base_link".to_string(),
            pan_tilt: "pantilt_link".to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavigationConfig {
    /// Action server name
    pub server: String,

    /// Simulated time to complete each goal
    pub travel_time_ms: u64,

    /// How long to wait for the server at startup; forever when unset
    pub server_timeout_ms: Option<u64>,
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            server: "move_base".to_string(),
            travel_time_ms: 0,
            server_timeout_ms: None,
        }
    }
}

/// Replacement questions or statements
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScriptConfig {
    pub questions: Option<Vec<Question>>,
    pub statements: Option<Vec<String>>,
}

/// Configuration for the complete harness
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SoundboardConfig {
    /// `label,x,y,z` object list
    pub objects_path: PathBuf,

    pub speech: SpeechConfig,

    pub frames: FrameConfig,

    pub navigation: NavigationConfig,

    /// Wait for the world -> base transform before facing an object
    pub base_transform_timeout_ms: u64,

    /// Wait for the world -> pan-tilt transform before publishing a point
    pub pan_tilt_transform_timeout_ms: u64,

    /// Channel the pan-tilt unit listens on
    pub point_topic: String,

    pub point_queue_size: usize,

    /// Mount position of the pan-tilt unit on the base
    pub pan_tilt_offset: [f64; 3],

    /// Log outgoing navigation goals in full
    pub debug: bool,

    pub script: ScriptConfig,
}

impl Default for SoundboardConfig {
    fn default() -> Self {
        Self {
            objects_path: PathBuf::from("objects.txt"),
            speech: SpeechConfig::default(),
            frames: FrameConfig::default(),
            navigation: NavigationConfig::default(),
            base_transform_timeout_ms: 5000,
            pan_tilt_transform_timeout_ms: 4000,
            point_topic: "clicked_point".to_string(),
            point_queue_size: DEFAULT_QUEUE_SIZE,
            pan_tilt_offset: [0.0, 0.0, 1.0],
            debug: true,
            script: ScriptConfig::default(),
        }
    }
}

impl SoundboardConfig {
    /// Load a configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            SoundboardError::ConfigError(format!("{}: {}", path.display(), e))
        })?;

        Self::from_toml(&content)
            .map_err(|e| SoundboardError::ConfigError(format!("{}: {}", path.display(), e)))
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| SoundboardError::ConfigError(e.to_string()))
    }

    /// Set the object list path
    pub fn with_objects_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.objects_path = path.into();
        self
    }

    /// Set the speech configuration
    pub fn with_speech(mut self, speech: SpeechConfig) -> Self {
        self.speech = speech;
        self
    }

    /// Disable full goal logging
    pub fn without_debug(mut self) -> Self {
        self.debug = false;
        self
    }

    pub fn base_transform_timeout(&self) -> Duration {
        Duration::from_millis(self.base_transform_timeout_ms)
    }

    pub fn pan_tilt_transform_timeout(&self) -> Duration {
        Duration::from_millis(self.pan_tilt_transform_timeout_ms)
    }

    pub fn travel_time(&self) -> Duration {
        Duration::from_millis(self.navigation.travel_time_ms)
    }

    pub fn server_timeout(&self) -> Option<Duration> {
        self.navigation.server_timeout_ms.map(Duration::from_millis)
    }

    /// Experiment script with any configured replacements applied
    pub fn script(&self) -> Script {
        let mut script = Script::experiment();
        if let Some(questions) = &self.script.questions {
            script.questions = questions.clone();
        }
        if let Some(statements) = &self.script.statements {
            script.statements = statements.clone();
        }
        script
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if !self.objects_path.is_file() {
            return Err(SoundboardError::ConfigError(format!(
                "Object list not found: {}",
                self.objects_path.display()
            )));
        }

        self.speech.validate()?;

        let frames = [&self.frames.world, &self.frames.base, &self.frames.pan_tilt];
        if frames.iter().any(|f| f.trim().is_empty()) {
            return Err(SoundboardError::ConfigError("frame names must not be empty".into()));
        }
        if frames[0] == frames[1] || frames[0] == frames[2] || frames[1] == frames[2] {
            return Err(SoundboardError::ConfigError(format!(
                "frame names must be distinct: {}, {}, {}",
                frames[0], frames[1], frames[2]
            )));
        }

        if self.point_topic.trim().is_empty() {
            return Err(SoundboardError::ConfigError("point topic is empty".into()));
        }
        if self.pan_tilt_offset.iter().any(|v| !v.is_finite()) {
            return Err(SoundboardError::ConfigError(
                "pan-tilt offset must be finite".into(),
            ));
        }

        if matches!(&self.script.questions, Some(q) if q.is_empty()) {
            return Err(SoundboardError::ConfigError(
                "script questions must not be empty".into(),
            ));
        }
        if matches!(&self.script.statements, Some(s) if s.is_empty()) {
            return Err(SoundboardError::ConfigError(
                "script statements must not be empty".into(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = SoundboardConfig::default();

        assert_eq!(config.frames.world, "map");
        assert_eq!(config.frames.base, "base_link");
        assert_eq!(config.frames.pan_tilt, "pantilt_link");
        assert_eq!(config.base_transform_timeout(), Duration::from_secs(5));
        assert_eq!(config.pan_tilt_transform_timeout(), Duration::from_secs(4));
        assert_eq!(config.navigation.server, "move_base");
        assert_eq!(config.point_topic, "clicked_point");
        assert_eq!(config.server_timeout(), None);
        assert!(config.debug);
    }

    #[test]
    fn test_config_builder() {
        let config = SoundboardConfig::default()
            .with_objects_path("/tmp/objects.txt")
            .with_speech(SpeechConfig::default().with_voice("en"))
            .without_debug();

        assert_eq!(config.objects_path, PathBuf::from("/tmp/objects.txt"));
        assert_eq!(config.speech.voice, "en");
        assert!(!config.debug);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = SoundboardConfig::from_toml(
            r#"
            objects_path = "lab/objects.txt"
            pan_tilt_offset = [0.1, 0.0, 1.2]

            [speech]
            command = "espeak"
            args = ["-v", "{voice}", "{text}"]
            voice = "en"

            [navigation]
            travel_time_ms = 250

            [script]
            statements = ["yes", "no", "maybe"]
            questions = [["Where is the ", "?"], ["Thank you!"]]
            "#,
        )
        .unwrap();

        assert_eq!(config.objects_path, PathBuf::from("lab/objects.txt"));
        assert_eq!(config.speech.command.as_deref(), Some("espeak"));
        assert_eq!(config.speech.volume, 1.0);
        assert_eq!(config.navigation.server, "move_base");
        assert_eq!(config.travel_time(), Duration::from_millis(250));
        assert_eq!(config.frames, FrameConfig::default());

        let script = config.script();
        assert_eq!(script.statements, vec!["yes", "no", "maybe"]);
        assert_eq!(script.questions.len(), 2);
        assert_eq!(script.questions[1].blanks(), 0);
    }

    #[test]
    fn test_bad_toml() {
        assert!(SoundboardConfig::from_toml("debug = \"sometimes\"").is_err());
        assert!(SoundboardConfig::from_toml("[script]\nquestions = [[]]").is_err());
        assert!(SoundboardConfig::load("/nonexistent/soundboard.toml").is_err());
    }

    #[test]
    fn test_validate() {
        let mut objects = tempfile::NamedTempFile::new().unwrap();
        writeln!(objects, "cup,1,0,0").unwrap();

        let config = SoundboardConfig::default().with_objects_path(objects.path());
        assert!(config.validate().is_ok());

        let missing = SoundboardConfig::default().with_objects_path("/nonexistent/objects.txt");
        assert!(missing.validate().is_err());

        let mut same_frames = config.clone();
        same_frames.frames.pan_tilt = "base_link".into();
        assert!(same_frames.validate().is_err());

        let mut loud = config.clone();
        loud.speech.volume = 2.0;
        assert!(loud.validate().is_err());

        let mut no_statements = config.clone();
        no_statements.script.statements = Some(vec![]);
        assert!(no_statements.validate().is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "point_topic = \"pan_tilt_target\"").unwrap();
        writeln!(file, "[frames]").unwrap();
        writeln!(file, "pan_tilt = \"ptu_link\"").unwrap();

        let config = SoundboardConfig::load(file.path()).unwrap();
        assert_eq!(config.point_topic, "pan_tilt_target");
        assert_eq!(config.frames.pan_tilt, "ptu_link");
        assert_eq!(config.frames.world, "map");
    }
}
