//! Title, channel and duration normalization for API metadata.

use regex::Regex;
use std::sync::OnceLock;

fn title_noise() -> &'static [Regex] {
    static NOISE: OnceLock<Vec<Regex>> = OnceLock::new();
    NOISE.get_or_init(|| {
        [
            r"(?i)\(Official\s*(Music\s*)?Video\)",
            r"(?i)\(Official\s*Audio\)",
            r"(?i)\(Lyric\s*Video\)",
            r"(?i)\[Official.*?\]",
            r"(?i)\(HD\)",
            r"(?i)\(4K\)",
            r"(?i)ft\..*",
            r"(?i)feat\..*",
        ]
        .iter()
        .map(|p| Regex::new(p).expect("Invalid regex"))
        .collect()
    })
}

fn artist_noise() -> &'static Regex {
    static NOISE: OnceLock<Regex> = OnceLock::new();
    NOISE.get_or_init(|| Regex::new(r"(?i)(VEVO|Official|Music|Channel)").expect("Invalid regex"))
}

fn iso_duration() -> &'static Regex {
    static DURATION: OnceLock<Regex> = OnceLock::new();
    DURATION.get_or_init(|| {
        Regex::new(r"^PT(?:(\d+)H)?(?:(\d+)M)?(?:(\d+)S)?").expect("Invalid regex")
    })
}

/// Strip "(Official Video)"-style decorations and featured-artist tails from a title.
pub fn clean_title(title: &str) -> String {
    let mut cleaned = title.to_string();
    for pattern in title_noise() {
        cleaned = pattern.replace_all(&cleaned, "").into_owned();
    }
    cleaned
        .trim_matches(|c: char| c == ' ' || c == '-' || c == '|')
        .to_string()
}

/// Strip label-ish words ("VEVO", "Official", ...) from a channel name.
pub fn clean_artist(channel: &str) -> String {
    artist_noise().replace_all(channel, "").trim().to_string()
}

/// Parse an ISO-8601 duration of the form `PT#H#M#S` into seconds.
///
/// Returns 0 when the input doesn't match and saturates at `u32::MAX`.
pub fn parse_iso8601_duration(iso: &str) -> u32 {
    let Some(caps) = iso_duration().captures(iso) else {
        return 0;
    };

    // Groups only match digits, so a parse failure means overflow
    let part = |i: usize| -> u64 {
        caps.get(i)
            .map(|m| m.as_str().parse::<u64>().unwrap_or(u64::MAX))
            .unwrap_or(0)
    };

    let seconds = part(1)
        .saturating_mul(3600)
        .saturating_add(part(2).saturating_mul(60))
        .saturating_add(part(3));
    u32::try_from(seconds).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_title() {
        assert_eq!(clean_title("Song Name (Official Music Video)"), "Song Name");
        assert_eq!(clean_title("Song Name (official video)"), "Song Name");
        assert_eq!(clean_title("Song Name (Official Audio)"), "Song Name");
        assert_eq!(clean_title("Song [Official Visualizer] (4K)"), "Song");
        assert_eq!(clean_title("Song ft. Someone Else"), "Song");
        assert_eq!(clean_title("Artist - Song feat. Guest (HD)"), "Artist - Song");
        assert_eq!(clean_title("| Song (Lyric Video) -"), "Song");
        assert_eq!(clean_title("Plain"), "Plain");
    }

    #[test]
    fn test_clean_artist() {
        assert_eq!(clean_artist("ArtistVEVO"), "Artist");
        assert_eq!(clean_artist("Artist Official"), "Artist");
        assert_eq!(clean_artist("Someone Music Channel"), "Someone");
        assert_eq!(clean_artist("Band"), "Band");
    }

    #[test]
    fn test_parse_iso8601_duration() {
        assert_eq!(parse_iso8601_duration("PT3M33S"), 213);
        assert_eq!(parse_iso8601_duration("PT1H2M3S"), 3723);
        assert_eq!(parse_iso8601_duration("PT45S"), 45);
        assert_eq!(parse_iso8601_duration("PT4M"), 240);
        assert_eq!(parse_iso8601_duration("PT0S"), 0);
        assert_eq!(parse_iso8601_duration("P1D"), 0);
        assert_eq!(parse_iso8601_duration(""), 0);
    }

    #[test]
    fn test_parse_iso8601_duration_saturates() {
        assert_eq!(parse_iso8601_duration("PT5000000H"), u32::MAX);
        assert_eq!(parse_iso8601_duration("PT99999999999999999999S"), u32::MAX);
        assert_eq!(parse_iso8601_duration("PT1193046H28M15S"), u32::MAX);
    }
}
