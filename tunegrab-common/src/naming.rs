//! Filename sanitizing and output naming
//!
//! Every provider- or user-supplied label that ends up in a path, an
//! attachment name or an archive entry goes through [`sanitize_filename`].

/// Characters reserved by at least one supported filesystem
pub const RESERVED_CHARS: [char; 9] = ['\\', '/', ':', '*', '?', '"', '<', '>', '|'];

/// Remove filesystem-reserved characters from `name`
///
/// Total and idempotent; everything else (including whitespace) is kept.
pub fn sanitize_filename(name: &str) -> String {
    name.chars().filter(|c| !RESERVED_CHARS.contains(c)).collect()
}

/// Output file stem for a finished track
///
/// Collapses to the title alone when the artist already appears in it, so
/// uploads titled "Artist - Song" don't become "Artist - Artist - Song".
pub fn track_file_stem(title: &str, artist: &str) -> String {
    if title.contains(artist) {
        sanitize_filename(title)
    } else {
        sanitize_filename(&format!("{} - {}", artist, title))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_removes_reserved() {
        assert_eq!(sanitize_filename(r#"AC/DC: "Back" <In> Black?|*\"#), "ACDC Back In Black");
    }

    #[test]
    fn test_sanitize_keeps_clean_input() {
        let clean = "Daft Punk - One More Time (Radio Edit)";
        assert_eq!(sanitize_filename(clean), clean);
    }

    #[test]
    fn test_sanitize_is_idempotent() {
        let inputs = ["a/b\\c", "", "???", "Ünïcödé: 曲", "  spaced  ", "x<y>z|w"];
        for input in inputs {
            let once = sanitize_filename(input);
            assert_eq!(sanitize_filename(&once), once);
            assert!(!once.chars().any(|c| RESERVED_CHARS.contains(&c)));
        }
    }

    #[test]
    fn test_sanitize_every_char_class() {
        // Every ASCII code point, reserved or not
        let all: String = (0u8..128).map(char::from).collect();
        let cleaned = sanitize_filename(&all);
        assert_eq!(cleaned.chars().count(), 128 - RESERVED_CHARS.len());
        assert!(!cleaned.chars().any(|c| RESERVED_CHARS.contains(&c)));
    }

    #[test]
    fn test_stem_artist_in_title() {
        assert_eq!(track_file_stem("Queen - Bohemian Rhapsody", "Queen"), "Queen - Bohemian Rhapsody");
        assert_eq!(track_file_stem("Live: Queen at Wembley", "Queen"), "Live Queen at Wembley");
    }

    #[test]
    fn test_stem_artist_not_in_title() {
        assert_eq!(track_file_stem("Bohemian Rhapsody", "Queen"), "Queen - Bohemian Rhapsody");
        assert_eq!(track_file_stem("Thunderstruck", "AC/DC"), "ACDC - Thunderstruck");
    }

    #[test]
    fn test_stem_match_is_case_sensitive() {
        assert_eq!(track_file_stem("queen anthem", "Queen"), "Queen - queen anthem");
    }
}
