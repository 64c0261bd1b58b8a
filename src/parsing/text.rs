//! Source text utilities shared by the parser and the hasher.
//!
//! Everything here is literal-aware: `//` inside `"http://host"` is not a
//! comment, and whitespace inside string, char and text-block literals is
//! never touched by the scanner.

/// Lexical class of a span of source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpanKind {
    Code,
    LineComment,
    BlockComment,
    /// String, char or text-block literal including its delimiters
    Literal,
}

impl SpanKind {
    pub fn is_comment(&self) -> bool {
        matches!(self, SpanKind::LineComment | SpanKind::BlockComment)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub kind: SpanKind,
    pub start: usize,
    pub end: usize,
}

/// Split `source` into code, comment and literal spans covering every byte.
///
/// Unterminated comments and literals run to the end of input (string and
/// char literals stop at the end of their line).
pub fn scan(source: &str) -> Vec<Span> {
    let bytes = source.as_bytes();
    let len = bytes.len();
    let mut spans = Vec::new();
    let mut code_start = 0;
    let mut i = 0;

    while i < len {
        let (kind, end) = match bytes[i] {
            b'/' if bytes.get(i + 1) == Some(&b'/') => {
                let end = find_byte(bytes, i, b'\n').unwrap_or(len);
                (SpanKind::LineComment, end)
            }
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                let end = find_seq(bytes, i + 2, b"*/").map_or(len, |p| p + 2);
                (SpanKind::BlockComment, end)
            }
            b'"' if bytes[i..].starts_with(b"\"\"\"") => (SpanKind::Literal, text_block_end(bytes, i + 3)),
            b'"' => (SpanKind::Literal, quoted_end(bytes, i + 1, b'"')),
            b'\'' => (SpanKind::Literal, quoted_end(bytes, i + 1, b'\'')),
            _ => {
                i += 1;
                continue;
            }
        };

        push_span(&mut spans, SpanKind::Code, code_start, i);
        push_span(&mut spans, kind, i, end);
        i = end;
        code_start = end;
    }
    push_span(&mut spans, SpanKind::Code, code_start, len);

    spans
}

fn push_span(spans: &mut Vec<Span>, kind: SpanKind, start: usize, end: usize) {
    if start < end {
        spans.push(Span { kind, start, end });
    }
}

fn find_byte(bytes: &[u8], from: usize, needle: u8) -> Option<usize> {
    bytes[from..].iter().position(|&b| b == needle).map(|p| p + from)
}

fn find_seq(bytes: &[u8], from: usize, needle: &[u8]) -> Option<usize> {
    if from >= bytes.len() {
        return None;
    }
    bytes[from..]
        .windows(needle.len())
        .position(|w| w == needle)
        .map(|p| p + from)
}

fn quoted_end(bytes: &[u8], mut j: usize, quote: u8) -> usize {
    while j < bytes.len() {
        match bytes[j] {
            b'\\' => j += 2,
            b'\n' => return j,
            b if b == quote => return j + 1,
            _ => j += 1,
        }
    }
    bytes.len()
}

fn text_block_end(bytes: &[u8], mut j: usize) -> usize {
    while j < bytes.len() {
        if bytes[j] == b'\\' {
            j += 2;
        } else if bytes[j..].starts_with(b"\"\"\"") {
            return j + 3;
        } else {
            j += 1;
        }
    }
    bytes.len()
}

/// Blank out every comment while keeping byte offsets and line breaks.
///
/// The result has the same length as `source`, so tree positions computed on
/// it are valid positions in the original file.
pub fn strip_comments(source: &str) -> String {
    let mut bytes = source.as_bytes().to_vec();
    for span in scan(source).into_iter().filter(|s| s.kind.is_comment()) {
        for b in &mut bytes[span.start..span.end] {
            if *b != b'\n' && *b != b'\r' {
                *b = b' ';
            }
        }
    }
    // Comment delimiters are ASCII, so whole characters were blanked
    String::from_utf8(bytes).unwrap_or_else(|_| source.to_string())
}

/// Collapse whitespace runs to one space and drop spaces just inside
/// parentheses and angle brackets.
///
/// Used for display text (chunk content, method bodies, signatures), not for
/// hashing.
pub fn normalize_whitespace(text: &str) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");

    let mut out = String::with_capacity(collapsed.len());
    let mut chars = collapsed.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch == ' ' {
            let prev_opens = out.ends_with('(') || out.ends_with('<');
            let next_closes = matches!(chars.peek(), Some(')') | Some('>'));
            if prev_opens || next_closes {
                continue;
            }
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strip_keeps_length_and_newlines() {
        let src = "int a; // trailing\n/* block\n spans */ int b;\n";
        let stripped = strip_comments(src);
        assert_eq!(stripped.len(), src.len());
        assert_eq!(stripped.matches('\n').count(), src.matches('\n').count());
        assert!(!stripped.contains("trailing"));
        assert!(!stripped.contains("block"));
        assert!(stripped.contains("int b;"));
    }

    #[test]
    fn strip_ignores_comment_markers_in_literals() {
        let src = r#"String url = "http://example.com/*x*/"; char c = '/'; // gone"#;
        let stripped = strip_comments(src);
        assert!(stripped.contains(r#""http://example.com/*x*/""#));
        assert!(stripped.contains("'/'"));
        assert!(!stripped.contains("gone"));
    }

    #[test]
    fn strip_respects_text_blocks_and_escapes() {
        let src = "String s = \"\"\"\n  // not a comment \\\"\"\"\n  \"\"\"; // real\nString t = \"a\\\"//b\";";
        let stripped = strip_comments(src);
        assert!(stripped.contains("// not a comment"));
        assert!(stripped.contains("\"a\\\"//b\""));
        assert!(!stripped.contains("real"));
    }

    #[test]
    fn strip_blanks_multibyte_comment_text() {
        let src = "/* é */ int x;";
        let stripped = strip_comments(src);
        assert_eq!(stripped.len(), src.len());
        assert!(stripped.ends_with("int x;"));
    }

    #[test]
    fn scan_covers_every_byte() {
        let src = "a /* b */ \"c\" // d\ne";
        let spans = scan(src);
        assert_eq!(spans.first().map(|s| s.start), Some(0));
        assert_eq!(spans.last().map(|s| s.end), Some(src.len()));
        for pair in spans.windows(2) {
            assert_eq!(pair[0].end, pair[1].start);
        }
    }

    #[test]
    fn normalize_whitespace_matches_signature_style() {
        assert_eq!(
            normalize_whitespace("process(  Map< String,\n   Integer >  input )"),
            "process(Map<String, Integer> input)"
        );
        assert_eq!(normalize_whitespace("  a\t\tb  "), "a b");
    }
}
