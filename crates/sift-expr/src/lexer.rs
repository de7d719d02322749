//! Segment scanner for criteria strings.
//!
//! A criteria string is a `;`-separated list of `key:value` segments. The
//! scanner splits the input, keeps every well-formed segment with its byte
//! position, and collects the malformed ones as errors instead of failing.

use serde::Serialize;

/// A segment that did not split into exactly one key and one value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanError {
    /// The raw segment text.
    pub segment: String,
    /// The byte position where the segment starts (0-indexed).
    pub position: usize,
}

impl std::fmt::Display for ScanError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "malformed segment '{}' at position {}",
            self.segment, self.position
        )
    }
}

impl std::error::Error for ScanError {}

/// Result of scanning a criteria string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanResult<'a> {
    /// The well-formed segments, in input order.
    pub segments: Vec<PositionedSegment<'a>>,
    /// Segments that were dropped.
    pub errors: Vec<ScanError>,
}

/// A `key:value` segment borrowed from the input, with its position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionedSegment<'a> {
    /// The key part, e.g. `a` or `a,g`.
    pub key: &'a str,
    /// The encoded value part, e.g. `!@2017-01-01`.
    pub value: &'a str,
    /// The byte position where the segment starts (0-indexed).
    pub position: usize,
}

/// Splits criteria strings into segments.
pub struct Lexer<'a> {
    input: &'a str,
}

impl<'a> Lexer<'a> {
    /// Creates a new scanner for the given input.
    pub fn new(input: &'a str) -> Self {
        Self { input }
    }

    /// Returns only the well-formed segments.
    pub fn tokenize(self) -> Vec<PositionedSegment<'a>> {
        self.tokenize_with_errors().segments
    }

    /// Returns the well-formed segments and the malformed ones.
    ///
    /// Empty segments (the empty input, `;;`, a trailing `;`) are skipped
    /// without being reported.
    pub fn tokenize_with_errors(self) -> ScanResult<'a> {
        let mut segments = Vec::new();
        let mut errors = Vec::new();
        let mut position = 0;

        for raw in self.input.split(';') {
            let start = position;
            position += raw.len() + 1;

            if raw.is_empty() {
                continue;
            }

            let mut parts = raw.split(':');
            match (parts.next(), parts.next(), parts.next()) {
                (Some(key), Some(value), None) => segments.push(PositionedSegment {
                    key,
                    value,
                    position: start,
                }),
                _ => errors.push(ScanError {
                    segment: raw.to_string(),
                    position: start,
                }),
            }
        }

        ScanResult { segments, errors }
    }
}

/// An owned `key:value` segment, used to assemble criteria strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Segment {
    /// The key part.
    pub key: String,
    /// The encoded value part.
    pub value: String,
}

impl Segment {
    /// Creates a new segment.
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Creates a multi-field search segment (`a,b:?value`).
    pub fn search<I, S>(keys: I, pattern: &str) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let key = keys
            .into_iter()
            .map(|k| k.as_ref().to_string())
            .collect::<Vec<_>>()
            .join(",");
        Self::new(key, format!("?{pattern}"))
    }
}

impl std::fmt::Display for Segment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.key, self.value)
    }
}

impl From<PositionedSegment<'_>> for Segment {
    fn from(segment: PositionedSegment<'_>) -> Self {
        Segment::new(segment.key, segment.value)
    }
}

/// Joins segments into a criteria string.
pub fn encode_segments(segments: &[Segment]) -> String {
    segments
        .iter()
        .map(Segment::to_string)
        .collect::<Vec<_>>()
        .join(";")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_single_segment() {
        let segments = Lexer::new("a:asdf").tokenize();
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].key, "a");
        assert_eq!(segments[0].value, "asdf");
        assert_eq!(segments[0].position, 0);
    }

    #[test]
    fn test_tokenize_positions() {
        let segments = Lexer::new("a:1;bb:22;c:3").tokenize();
        let positions: Vec<usize> = segments.iter().map(|s| s.position).collect();
        assert_eq!(positions, vec![0, 4, 10]);
    }

    #[test]
    fn test_tokenize_empty_input() {
        let result = Lexer::new("").tokenize_with_errors();
        assert!(result.segments.is_empty());
        assert!(result.errors.is_empty());
    }

    #[test]
    fn test_tokenize_skips_empty_segments() {
        let result = Lexer::new("a:1;;b:2;").tokenize_with_errors();
        assert_eq!(result.segments.len(), 2);
        assert!(result.errors.is_empty());
    }

    #[test]
    fn test_tokenize_missing_colon_is_error() {
        let result = Lexer::new("a:1;oops;b:2").tokenize_with_errors();
        assert_eq!(result.segments.len(), 2);
        assert_eq!(
            result.errors,
            vec![ScanError {
                segment: "oops".to_string(),
                position: 4,
            }]
        );
    }

    #[test]
    fn test_tokenize_extra_colon_is_error() {
        let result = Lexer::new("t:@2017-01-01T10:00").tokenize_with_errors();
        assert!(result.segments.is_empty());
        assert_eq!(result.errors.len(), 1);
    }

    #[test]
    fn test_tokenize_empty_value_is_kept() {
        let segments = Lexer::new("a:").tokenize();
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].value, "");
    }

    #[test]
    fn test_tokenize_compound_key() {
        let segments = Lexer::new("a,g:?adf").tokenize();
        assert_eq!(segments[0].key, "a,g");
        assert_eq!(segments[0].value, "?adf");
    }

    #[test]
    fn test_tokenize_multibyte_positions() {
        let segments = Lexer::new("é:1;b:2").tokenize();
        assert_eq!(segments[1].position, 5);
    }

    #[test]
    fn test_encode_segments() {
        let segments = vec![
            Segment::new("a", "asdf"),
            Segment::new("d", "1..10"),
            Segment::search(["a", "g"], "adf"),
        ];
        assert_eq!(encode_segments(&segments), "a:asdf;d:1..10;a,g:?adf");
    }

    #[test]
    fn test_encode_empty() {
        assert_eq!(encode_segments(&[]), "");
    }

    #[test]
    fn test_encode_then_scan_preserves_segments() {
        let segments = vec![Segment::new("b", "!1"), Segment::new("f", "~asdf")];
        let scanned: Vec<Segment> = Lexer::new(&encode_segments(&segments))
            .tokenize()
            .into_iter()
            .map(Segment::from)
            .collect();
        assert_eq!(scanned, segments);
    }
}
