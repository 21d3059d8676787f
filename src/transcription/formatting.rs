//! Transcript rendering.
//!
//! One textual form is rendered per job and written out as both `.txt`
//! and `.md`; the `.json` artifact carries the normalized segment list.

use serde::Serialize;

use crate::domain::Segment;

/// `MM:SS.mmm` timestamp; minutes are not wrapped at the hour
pub fn sec_to_hms(sec: f64) -> String {
    let minutes = (sec / 60.0).floor() as u64;
    let seconds = sec % 60.0;
    format!("{minutes:02}:{seconds:06.3}")
}

/// Render segments as readable text.
///
/// Per segment: a `[start – end] SPEAKER:` header line, the text, and a
/// blank separator line. Segments with empty or whitespace-only text are
/// skipped. The output always ends with exactly one trailing newline.
pub fn segments_to_txt(segments: &[Segment]) -> String {
    let mut lines: Vec<String> = Vec::new();
    for seg in segments {
        let text = seg.text.trim();
        if text.is_empty() {
            continue;
        }
        let start = sec_to_hms(seg.start);
        let end = sec_to_hms(seg.end);
        let speaker = seg.speaker.as_deref().unwrap_or("SPEAKER");
        lines.push(format!("[{start} – {end}] {speaker}:"));
        lines.push(text.to_string());
        lines.push(String::new());
    }
    format!("{}\n", lines.join("\n").trim())
}

/// Machine-readable artifact shape: `{"segments": [...]}`
#[derive(Debug, Serialize)]
pub struct TranscriptDocument<'a> {
    pub segments: &'a [Segment],
}

/// Serialize the normalized segment list for the `.json` artifact
pub fn segments_to_json(segments: &[Segment]) -> serde_json::Result<String> {
    serde_json::to_string(&TranscriptDocument { segments })
}
