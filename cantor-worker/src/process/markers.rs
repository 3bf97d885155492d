//! Output markers
//!
//! The renderer reports its outcome out-of-band from the exit code by
//! wrapping a payload in a fixed token, e.g. `xsynx completed xsynx` on
//! stdout or `xsynxerror Bad template xsynxerror` on stderr.

/// Payload the renderer prints once the artifact is fully written
pub const COMPLETED: &str = "completed";

/// Extracts the payload following `marker` on `line`
///
/// The payload runs up to the next occurrence of the marker, or to the end
/// of the line, and is trimmed.
pub fn payload<'a>(line: &'a str, marker: &str) -> Option<&'a str> {
    if marker.is_empty() {
        return None;
    }

    let start = line.find(marker)? + marker.len();
    let rest = &line[start..];
    let body = match rest.find(marker) {
        Some(end) => &rest[..end],
        None => rest,
    };

    Some(body.trim())
}

/// Joins every error payload found in `lines` with commas
pub fn error_reason(lines: &[String], marker: &str) -> Option<String> {
    let payloads: Vec<&str> = lines
        .iter()
        .filter_map(|line| payload(line, marker))
        .filter(|p| !p.is_empty())
        .collect();

    if payloads.is_empty() {
        None
    } else {
        Some(payloads.join(","))
    }
}

/// What the renderer's stdout says about completion
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    /// Every marker carried the completion payload
    Confirmed,
    /// No marker was printed
    Missing,
    /// A marker carried something else
    Unexpected(String),
}

/// Scans stdout for completion markers
pub fn completion(lines: &[String], marker: &str) -> Completion {
    let mut seen = false;

    for found in lines.iter().filter_map(|line| payload(line, marker)) {
        if found != COMPLETED {
            return Completion::Unexpected(found.to_string());
        }
        seen = true;
    }

    if seen {
        Completion::Confirmed
    } else {
        Completion::Missing
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_payload_between_markers() {
        assert_eq!(
            payload("xsynxerror Bad template xsynxerror", "xsynxerror"),
            Some("Bad template")
        );
        assert_eq!(
            payload("log: xsynx completed xsynx trailing", "xsynx"),
            Some("completed")
        );
    }

    #[test]
    fn test_payload_without_closing_marker() {
        assert_eq!(payload("xsynxerror disk full", "xsynxerror"), Some("disk full"));
    }

    #[test]
    fn test_payload_absent() {
        assert_eq!(payload("plain output", "xsynx"), None);
        assert_eq!(payload("anything", ""), None);
    }

    #[test]
    fn test_error_reason_joins_with_commas() {
        let stderr = lines(&[
            "warming up",
            "xsynxerror Bad template xsynxerror",
            "xsynxerror Missing sample xsynxerror",
        ]);
        assert_eq!(
            error_reason(&stderr, "xsynxerror"),
            Some("Bad template,Missing sample".to_string())
        );
        assert_eq!(error_reason(&lines(&["nothing"]), "xsynxerror"), None);
    }

    #[test]
    fn test_completion_confirmed() {
        let stdout = lines(&["rendering", "...xsynx completed xsynx..."]);
        assert_eq!(completion(&stdout, "xsynx"), Completion::Confirmed);
    }

    #[test]
    fn test_completion_missing() {
        let stdout = lines(&["rendering", "done"]);
        assert_eq!(completion(&stdout, "xsynx"), Completion::Missing);
    }

    #[test]
    fn test_completion_unexpected() {
        let stdout = lines(&["xsynx completed xsynx", "xsynx aborted xsynx"]);
        assert_eq!(
            completion(&stdout, "xsynx"),
            Completion::Unexpected("aborted".to_string())
        );
    }
}
