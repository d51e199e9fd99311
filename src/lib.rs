pub mod geometry;
pub mod integration;
pub mod navigation;
pub mod objects;
pub mod script;
pub mod speech;
pub mod tracking;

use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum SoundboardError {
    #[error("IO error: {0}")]
    IOError(String),

    #[error("Object file error: {0}")]
    ObjectFileError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Transform error: {0}")]
    TransformError(String),

    #[error("Navigation server not available: {0}")]
    NavigationUnavailable(String),

    #[error("Navigation error: {0}")]
    NavigationError(String),

    #[error("Speech error: {0}")]
    SpeechError(String),

    #[error("Channel error: {0}")]
    ChannelError(String),

    #[error("Bearing error: {0}")]
    BearingError(String),

    #[error("Input error: {0}")]
    InputError(String),
}

impl From<std::io::Error> for SoundboardError {
    fn from(e: std::io::Error) -> Self {
        SoundboardError::IOError(e.to_string())
    }
}

impl SoundboardError {
    /// Check if this error is recoverable
    pub fn is_recoverable(&self) -> bool {
        match self {
            // Console or file system is gone
            SoundboardError::IOError(_) => false,
            // Startup data errors require fixing the files
            SoundboardError::ObjectFileError(_) => false,
            SoundboardError::ConfigError(_) => false,
            // A missing transform only affects the current object
            SoundboardError::TransformError(_) => true,
            // Without the action server the robot cannot move at all
            SoundboardError::NavigationUnavailable(_) => false,
            SoundboardError::NavigationError(_) => true,
            SoundboardError::SpeechError(_) => true,
            SoundboardError::ChannelError(_) => false,
            SoundboardError::BearingError(_) => true,
            SoundboardError::InputError(_) => true,
        }
    }

    /// Get an operator-facing description
    pub fn user_message(&self) -> String {
        match self {
            SoundboardError::IOError(_) => "Console or file system error occurred.".to_string(),
            SoundboardError::ObjectFileError(_) => {
                "Object list could not be loaded. Please check the objects file.".to_string()
            }
            SoundboardError::ConfigError(_) => {
                "Configuration error. Please check settings.".to_string()
            }
            SoundboardError::TransformError(_) => {
                "Robot frames are not available yet. Skipping this object.".to_string()
            }
            SoundboardError::NavigationUnavailable(_) => {
                "Action server not available! Shutting down.".to_string()
            }
            SoundboardError::NavigationError(_) => {
                "The base could not turn to the object.".to_string()
            }
            SoundboardError::SpeechError(_) => {
                "Text-to-speech failed. The phrase was not spoken.".to_string()
            }
            SoundboardError::ChannelError(_) => {
                "Internal communication error. Please restart the experiment.".to_string()
            }
            SoundboardError::BearingError(_) => {
                "The object is directly above the robot; no heading to face.".to_string()
            }
            SoundboardError::InputError(_) => "Invalid selection. Please try again.".to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, SoundboardError>;
