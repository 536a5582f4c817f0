//! MP3 export through ffmpeg.

use super::{run_tool, stderr_excerpt};
use crate::error::{Result, SlowedError};
use std::path::Path;
use tracing::{debug, instrument};

/// ID3 tags written to the exported file.
#[derive(Debug, Clone, Default)]
pub struct Mp3Tags {
    pub title: String,
    pub artist: String,
}

impl Mp3Tags {
    /// Tags for a "slowed + reverb" rendition of `title` by `artist`.
    pub fn slowed_reverb(title: &str, artist: &str) -> Self {
        Self {
            title: format!("{title} (Slowed + Reverb)"),
            artist: artist.to_string(),
        }
    }
}

fn encode_args(src: &Path, dst: &Path, bitrate_kbps: u32, tags: &Mp3Tags) -> Vec<String> {
    vec![
        "-i".into(),
        src.to_string_lossy().into_owned(),
        "-vn".into(),
        "-codec:a".into(),
        "libmp3lame".into(),
        "-b:a".into(),
        format!("{bitrate_kbps}k"),
        "-id3v2_version".into(),
        "3".into(),
        "-metadata".into(),
        format!("title={}", tags.title),
        "-metadata".into(),
        format!("artist={}", tags.artist),
        "-y".into(),
        "-loglevel".into(),
        "error".into(),
        dst.to_string_lossy().into_owned(),
    ]
}

/// Encode a WAV file to constant-bitrate MP3 with ID3 tags.
#[instrument(skip(tags))]
pub async fn encode_mp3(
    ffmpeg: &str,
    src: &Path,
    dst: &Path,
    bitrate_kbps: u32,
    tags: &Mp3Tags,
) -> Result<()> {
    if let Some(parent) = dst.parent() {
        std::fs::create_dir_all(parent)?;
    }

    debug!("Encoding {:?} at {} kbps", src, bitrate_kbps);
    let output = run_tool(ffmpeg, &encode_args(src, dst, bitrate_kbps, tags)).await?;

    if !output.status.success() {
        return Err(SlowedError::ToolFailed(format!(
            "ffmpeg mp3 encode failed: {}",
            stderr_excerpt(&output, 500)
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_args_carry_tags_and_bitrate() {
        let tags = Mp3Tags::slowed_reverb("Song", "Singer");
        assert_eq!(tags.title, "Song (Slowed + Reverb)");

        let args = encode_args(Path::new("in.wav"), Path::new("out.mp3"), 320, &tags);
        assert!(args.contains(&"320k".to_string()));
        assert!(args.contains(&"title=Song (Slowed + Reverb)".to_string()));
        assert!(args.contains(&"artist=Singer".to_string()));
        assert_eq!(args.last().unwrap(), "out.mp3");
    }
}
