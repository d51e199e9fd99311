//! Wiring of the dialogue to its collaborators
//!
//! Provides configuration, the interactive session and a simulated robot.

pub mod config;
pub mod robot;
pub mod session;

pub use config::{FrameConfig, NavigationConfig, ScriptConfig, SoundboardConfig};
pub use robot::simulated_robot;
pub use session::{Collaborators, Soundboard};
