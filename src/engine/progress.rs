//! User-facing progress text.

use super::eta::Eta;

/// Render the status message edited as a job advances.
///
/// Always carries the stage line; queue position and ETA are appended when
/// known (they are only shown at submission time).
pub fn format_progress(stage: &str, position: Option<usize>, eta: Option<Eta>) -> String {
    let mut lines = vec![format!("Stage: {stage}")];
    if let Some(position) = position {
        lines.push(format!("Queue position: {position}"));
    }
    if let Some(eta) = eta {
        lines.push(format!("ETA: {eta}"));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_only() {
        assert_eq!(format_progress("downloading", None, None), "Stage: downloading");
    }

    #[test]
    fn test_full_status() {
        let text = format_progress("transcribing", Some(2), Some(Eta::Seconds(120)));
        assert_eq!(text, "Stage: transcribing\nQueue position: 2\nETA: 120 sec");
    }

    #[test]
    fn test_unknown_eta() {
        let text = format_progress("queued", Some(3), Some(Eta::Unknown));
        assert!(text.ends_with("ETA: unknown"));
    }
}
