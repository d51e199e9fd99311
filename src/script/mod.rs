//! Scripted questions and statements read to the participant

pub mod question;

pub use question::{Question, Script, BLANK};
