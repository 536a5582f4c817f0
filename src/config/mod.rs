//! Configuration module for Slowed.
//!
//! Handles loading and managing application settings.

mod settings;

pub use settings::{
    DownloadSettings, EffectsSettings, GeneralSettings, HistorySettings, LoudnessMode,
    NotifySettings, PipelineSettings, Settings, YoutubeSettings,
};
