//! Recovery of structured match records from free-text matcher output.
//!
//! Matchers interleave progress lines with ranked result lines of the form
//! `1. pic.0768.jpg (distance: 120.5)`. Lexing (recognizing a result line)
//! is kept separate from path resolution (finding the referenced file on
//! disk) so each half is testable in isolation. This module performs no I/O
//! beyond the existence checks resolution needs; it never decodes images.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

/// Extensions accepted for an image reference token.
const IMAGE_EXTENSIONS: [&str; 5] = ["jpg", "jpeg", "png", "bmp", "tif"];

/// One ranked match recovered from matcher output.
#[derive(Clone, Debug, PartialEq)]
pub struct MatchRecord {
    /// Resolved path to an existing image file.
    pub path: PathBuf,
    /// Distance reported by the matcher; lower is better by convention.
    pub distance: f64,
    /// True when the distance marker failed to parse and `0.0` was
    /// substituted. Rank-sensitive consumers should check this before
    /// trusting `distance`.
    pub distance_substituted: bool,
}

/// Parses matcher stdout into ranked match records.
///
/// All lines are parsed before truncating to `limit`, so truncation reflects
/// the matcher's true emitted order. Lines that are not result lines are
/// skipped; result lines whose image token resolves to no existing file are
/// dropped with a warning. Text with no result lines yields an empty vec,
/// not an error.
pub fn parse_matches(stdout: &str, corpus_root: &Path, limit: usize) -> Vec<MatchRecord> {
    let mut records = Vec::new();
    for line in stdout.lines() {
        let Some(lexed) = lex_result_line(line) else {
            debug!(line, "skipping non-result line");
            continue;
        };
        let Some(path) = resolve_match_path(lexed.token, corpus_root) else {
            warn!(token = lexed.token, "dropping match with unresolvable path");
            continue;
        };
        let (distance, distance_substituted) = match lexed.distance.parse::<f64>() {
            Ok(distance) => (distance, false),
            Err(_) => {
                warn!(
                    token = lexed.distance,
                    "substituting 0.0 for unparsable distance"
                );
                (0.0, true)
            }
        };
        records.push(MatchRecord {
            path,
            distance,
            distance_substituted,
        });
    }
    records.truncate(limit);
    records
}

/// Resolves an image token against the corpus root.
///
/// Candidate rules, in order, first existing file wins:
/// 1. the token as an absolute path,
/// 2. the corpus root joined with the token's base file name,
/// 3. the corpus root joined with the token verbatim.
pub fn resolve_match_path(token: &str, corpus_root: &Path) -> Option<PathBuf> {
    candidate_paths(token, corpus_root)
        .into_iter()
        .find(|candidate| candidate.is_file())
}

/// Ordered resolution candidates for a token; existence is checked lazily
/// by the caller so the policy stays auditable on its own.
fn candidate_paths(token: &str, corpus_root: &Path) -> Vec<PathBuf> {
    let token_path = Path::new(token);
    let mut candidates = Vec::with_capacity(3);
    if token_path.is_absolute() {
        candidates.push(token_path.to_path_buf());
    }
    if let Some(name) = token_path.file_name() {
        candidates.push(corpus_root.join(name));
    }
    candidates.push(corpus_root.join(token_path));
    candidates
}

/// Lexical pieces of one result line.
struct LexedLine<'a> {
    token: &'a str,
    distance: &'a str,
}

/// Recognizes a result line: a leading rank marker, an image filename token,
/// and a literal `(distance: <number>)` marker. Anything else is an
/// informational line from the matcher.
fn lex_result_line(line: &str) -> Option<LexedLine<'_>> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    if !is_rank_marker(parts.first()?) {
        return None;
    }
    let mut token = None;
    let mut distance = None;
    for (idx, part) in parts.iter().enumerate() {
        if token.is_none() && is_image_token(part) {
            token = Some(trim_punctuation(part));
        }
        if *part == "(distance:" {
            distance = parts.get(idx + 1).map(|raw| raw.trim_end_matches(')'));
        }
    }
    Some(LexedLine {
        token: token?,
        distance: distance?,
    })
}

/// A rank marker is one or more digits followed by a period, e.g. `3.`.
fn is_rank_marker(part: &str) -> bool {
    part.strip_suffix('.')
        .is_some_and(|digits| !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()))
}

fn is_image_token(part: &str) -> bool {
    Path::new(trim_punctuation(part))
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            IMAGE_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
}

/// Strips the `(),` punctuation matchers wrap tokens in.
fn trim_punctuation(part: &str) -> &str {
    part.trim_matches(|c| matches!(c, '(' | ')' | ','))
}
