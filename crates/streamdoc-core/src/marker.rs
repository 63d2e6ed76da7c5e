//! Section marker lines.
//!
//! Each materialized section is framed by two HTML comment lines:
//!
//! ```text
//! <!-- SECTION_START: intro | hash:2cf24d... -->
//! ...content...
//! <!-- SECTION_END: intro | hash:2cf24d... -->
//! ```

use regex::Regex;
use serde::Serialize;
use std::sync::OnceLock;

pub const START_TAG: &str = "SECTION_START";
pub const END_TAG: &str = "SECTION_END";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkerKind {
    Start,
    End,
}

/// One parsed marker line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Marker {
    pub kind: MarkerKind,
    pub id: String,
    pub hash: String,
}

static MARKER_RE: OnceLock<Regex> = OnceLock::new();

fn marker_re() -> &'static Regex {
    MARKER_RE.get_or_init(|| {
        Regex::new(r"^<!--\s*(SECTION_START|SECTION_END):\s*(\S+)\s*\|\s*hash:([0-9A-Fa-f]*)\s*-->$")
            .unwrap()
    })
}

pub fn start_line(id: &str, hash: &str) -> String {
    format!("<!-- {START_TAG}: {id} | hash:{hash} -->")
}

pub fn end_line(id: &str, hash: &str) -> String {
    format!("<!-- {END_TAG}: {id} | hash:{hash} -->")
}

/// Parse a single line as a marker. Surrounding whitespace is ignored.
pub fn parse_line(line: &str) -> Option<Marker> {
    let caps = marker_re().captures(line.trim())?;
    let kind = match &caps[1] {
        START_TAG => MarkerKind::Start,
        _ => MarkerKind::End,
    };
    Some(Marker {
        kind,
        id: caps[2].to_string(),
        hash: caps[3].to_ascii_lowercase(),
    })
}

/// True if any line of `text` would be read back as a marker.
pub fn contains_marker(text: &str) -> bool {
    text.lines().any(|l| parse_line(l).is_some())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_and_parses_start() {
        let line = start_line("intro", "abc123");
        assert_eq!(line, "<!-- SECTION_START: intro | hash:abc123 -->");
        let m = parse_line(&line).unwrap();
        assert_eq!(m.kind, MarkerKind::Start);
        assert_eq!(m.id, "intro");
        assert_eq!(m.hash, "abc123");
    }

    #[test]
    fn parses_end_with_loose_whitespace() {
        let m = parse_line("  <!--SECTION_END:  body |hash:ABCDEF   -->  ").unwrap();
        assert_eq!(m.kind, MarkerKind::End);
        assert_eq!(m.id, "body");
        assert_eq!(m.hash, "abcdef");
    }

    #[test]
    fn empty_hash_is_still_a_marker() {
        let m = parse_line("<!-- SECTION_START: x | hash: -->").unwrap();
        assert_eq!(m.hash, "");
    }

    #[test]
    fn rejects_ordinary_lines() {
        for line in [
            "",
            "SECTION_START: intro",
            "<!-- a regular comment -->",
            "<!-- SECTION_START: intro -->",
            "text <!-- SECTION_END: intro | hash:ab -->",
        ] {
            assert!(parse_line(line).is_none(), "unexpected marker: {line}");
        }
    }

    #[test]
    fn contains_marker_scans_all_lines() {
        assert!(!contains_marker("one\ntwo"));
        assert!(contains_marker("one\n<!-- SECTION_END: a | hash:00 -->\ntwo"));
    }
}
