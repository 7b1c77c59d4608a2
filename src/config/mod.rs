//! Configuration management for Dubba.

mod settings;

pub use settings::{AudioSettings, DubbingSettings, GeneralSettings, Settings};
