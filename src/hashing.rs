//! Content hashing for incremental re-analysis
//!
//! A digest is taken over canonical text: comments removed, whitespace kept
//! only where it separates two word characters or two operator characters
//! (`a + ++b` is not `a++ + b`). Literals are copied verbatim, so `"a  b"`
//! and `"a b"` hash differently.

use crate::parsing::text::{SpanKind, scan};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Lowercase hex SHA-256 of canonical source text (64 characters)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AstHash(String);

impl AstHash {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for AstHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

fn is_word(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_' || ch == '$'
}

fn is_operator(ch: char) -> bool {
    matches!(
        ch,
        '+' | '-' | '*' | '/' | '&' | '|' | '<' | '>' | '=' | '!' | '%' | '^' | '~'
    )
}

/// Whether dropping the whitespace between `prev` and `next` would merge tokens
fn separates(prev: char, next: char) -> bool {
    (is_word(prev) && is_word(next)) || (is_operator(prev) && is_operator(next))
}

/// Canonical form used for hashing
pub fn canonicalize(source: &str) -> String {
    let mut out = String::with_capacity(source.len());
    let mut pending_space = false;

    for span in scan(source) {
        let text = &source[span.start..span.end];
        match span.kind {
            // A comment separates tokens like whitespace does
            SpanKind::LineComment | SpanKind::BlockComment => pending_space = true,
            SpanKind::Literal => {
                out.push_str(text);
                pending_space = false;
            }
            SpanKind::Code => {
                for ch in text.chars() {
                    if ch.is_whitespace() {
                        pending_space = true;
                        continue;
                    }
                    if pending_space
                        && out.chars().next_back().is_some_and(|prev| separates(prev, ch))
                    {
                        out.push(' ');
                    }
                    out.push(ch);
                    pending_space = false;
                }
            }
        }
    }

    out
}

/// Digest of already canonical text
pub fn hash(canonical: &str) -> AstHash {
    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    let result = hasher.finalize();
    AstHash(format!("{result:x}"))
}

/// Canonicalize then digest
pub fn content_hash(source: &str) -> AstHash {
    hash(&canonicalize(source))
}
