//! Transcript segments as returned by the transcription backends.

use serde::{Deserialize, Serialize};

/// Fallback label assigned to segments without speaker attribution
pub const DEFAULT_SPEAKER: &str = "SPEAKER_00";

/// A timed span of transcript text, optionally attributed to a speaker.
///
/// Matches the JSON shape both whisper backends emit; unknown fields are
/// ignored on parse, `speaker` is omitted from output when absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    #[serde(default)]
    pub start: f64,

    #[serde(default)]
    pub end: f64,

    #[serde(default)]
    pub text: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speaker: Option<String>,
}

/// Assign [`DEFAULT_SPEAKER`] to segments lacking attribution.
///
/// Order and count are preserved; already-labeled segments are untouched.
pub fn normalize_segments(segments: Vec<Segment>) -> Vec<Segment> {
    segments
        .into_iter()
        .map(|mut seg| {
            if seg.speaker.is_none() {
                seg.speaker = Some(DEFAULT_SPEAKER.to_string());
            }
            seg
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seg(text: &str, speaker: Option<&str>) -> Segment {
        Segment {
            start: 0.0,
            end: 1.0,
            text: text.to_string(),
            speaker: speaker.map(String::from),
        }
    }

    #[test]
    fn test_normalize_assigns_default_speaker() {
        let out = normalize_segments(vec![seg("hello", None)]);
        assert_eq!(out[0].speaker.as_deref(), Some(DEFAULT_SPEAKER));
    }

    #[test]
    fn test_normalize_keeps_existing_speaker() {
        let out = normalize_segments(vec![seg("hello", Some("SPEAKER_01"))]);
        assert_eq!(out[0].speaker.as_deref(), Some("SPEAKER_01"));
    }

    #[test]
    fn test_normalize_preserves_order_and_count() {
        let input = vec![seg("a", None), seg("b", Some("SPEAKER_01")), seg("c", None)];
        let out = normalize_segments(input);
        assert_eq!(out.len(), 3);
        let texts: Vec<&str> = out.iter().map(|s| s.text.as_str()).collect();
        assert_eq!(texts, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_segment_json_shape() {
        let parsed: Segment =
            serde_json::from_str(r#"{"start": 0.5, "end": 2.0, "text": "hi", "words": []}"#)
                .unwrap();
        assert_eq!(parsed.text, "hi");
        assert!(parsed.speaker.is_none());

        let rendered = serde_json::to_string(&parsed).unwrap();
        assert!(!rendered.contains("speaker"));
    }
}
