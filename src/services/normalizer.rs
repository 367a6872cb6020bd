use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::TrackId;

/// Length of a canonical catalog identifier
pub const CANONICAL_ID_LEN: usize = 22;

static CANONICAL_ID: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!("[A-Za-z0-9]{{{}}}", CANONICAL_ID_LEN)).expect("valid id pattern")
});

/// Extracts the canonical identifier from a raw id, URI or URL
///
/// Takes the first 22-character alphanumeric run, which covers
/// `4nRhbx8L4ifnMKaE5jSQGR`, `spotify:track:4nRhbx8L4ifnMKaE5jSQGR` and
/// `https://open.spotify.com/track/4nRhbx8L4ifnMKaE5jSQGR?si=...` alike.
/// Returns `None` when nothing matches; such inputs must never reach an
/// upstream call.
pub fn normalize(raw: &str) -> Option<TrackId> {
    CANONICAL_ID
        .find(raw)
        .map(|m| TrackId::from_canonical(m.as_str().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const ID: &str = "4nRhbx8L4ifnMKaE5jSQGR";

    #[test]
    fn test_bare_id() {
        assert_eq!(normalize(ID).unwrap().as_str(), ID);
    }

    #[test]
    fn test_uri() {
        let id = normalize("spotify:track:4nRhbx8L4ifnMKaE5jSQGR").unwrap();
        assert_eq!(id.as_str(), ID);
    }

    #[test]
    fn test_url_with_query() {
        let id =
            normalize("https://open.spotify.com/track/4nRhbx8L4ifnMKaE5jSQGR?si=abc123").unwrap();
        assert_eq!(id.as_str(), ID);
    }

    #[test]
    fn test_playlist_url() {
        let id = normalize("https://open.spotify.com/playlist/37i9dQZF1DXcBWIGoYBM5M").unwrap();
        assert_eq!(id.as_str(), "37i9dQZF1DXcBWIGoYBM5M");
    }

    #[test]
    fn test_surrounding_whitespace() {
        assert_eq!(normalize("  4nRhbx8L4ifnMKaE5jSQGR \n").unwrap().as_str(), ID);
    }

    #[test]
    fn test_unresolvable_inputs() {
        assert!(normalize("").is_none());
        assert!(normalize("not-an-id").is_none());
        assert!(normalize("4nRhbx8L4ifnMKaE5jSQG").is_none()); // 21 chars
        assert!(normalize("https://open.spotify.com/track/").is_none());
    }

    #[test]
    fn test_normalization_is_idempotent() {
        let inputs = [
            ID,
            "spotify:track:4nRhbx8L4ifnMKaE5jSQGR",
            "https://open.spotify.com/track/4nRhbx8L4ifnMKaE5jSQGR?si=x",
            "prefix 0j35X8cTq543QDYLOyqB8W suffix",
        ];

        for input in inputs {
            let once = normalize(input).unwrap();
            let twice = normalize(once.as_str()).unwrap();
            assert_eq!(once, twice, "input: {}", input);
        }
    }
}
