//! Slowed - trending tracks as "slowed + reverb" edits
//!
//! A CLI pipeline that picks a currently popular song, downloads its audio
//! and renders a slowed-down, reverb-drenched version of it.
//!
//! # Overview
//!
//! A run:
//! - selects a trending track that has not been used before (chart first,
//!   keyword search as fallback)
//! - downloads it with yt-dlp, trying several sources and client profiles
//! - time-stretches it without changing pitch, compresses, EQs and adds reverb
//! - normalizes loudness, applies fades and encodes a tagged MP3
//! - records the run and optionally posts a Discord notification
//!
//! # Architecture
//!
//! - `config` - Configuration management
//! - `source` - Trending track discovery and selection
//! - `history` - Seen set and run log
//! - `audio` - yt-dlp downloads and ffmpeg transcodes
//! - `effects` - The DSP chain
//! - `status` - Availability checks for uploaded videos
//! - `notify` - Discord webhook notifications
//! - `cleanup` - Temp file housekeeping
//! - `orchestrator` - Pipeline coordination
//!
//! # Example
//!
//! ```rust,no_run
//! use slowed::config::Settings;
//! use slowed::orchestrator::Pipeline;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load_from(None)?;
//!     let pipeline = Pipeline::new(settings).await?;
//!
//!     let result = pipeline.run_once().await?;
//!     println!("{} -> {}", result.track.title, result.output_path.display());
//!
//!     Ok(())
//! }
//! ```

pub mod audio;
pub mod cleanup;
pub mod cli;
pub mod config;
pub mod effects;
pub mod error;
pub mod history;
pub mod notify;
pub mod orchestrator;
pub mod source;
pub mod status;

pub use error::{Result, SlowedError};
