//! One-shot search orchestration: invoke a matcher, parse its output, and
//! filter the records.
//!
//! Synchronous and blocking: one call, one external process.
//! Callers wanting several methods compared issue sequential calls and
//! collect the outcomes themselves.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::invoker::{CorpusSource, Invoker, MatcherMethod};
use crate::parser::{parse_matches, MatchRecord};
use crate::util::{MatchGridError, MatchGridResult};

/// Default number of matches returned when the caller does not say.
pub const DEFAULT_RESULT_LIMIT: usize = 5;

/// Where matchers look for candidates and where result paths resolve.
#[derive(Clone, Debug)]
pub struct CorpusConfig {
    /// Directory holding the candidate images. Result tokens resolve here
    /// regardless of method.
    pub root: PathBuf,
    /// Precomputed feature index handed to embedding-based methods instead
    /// of the directory.
    pub feature_index: Option<PathBuf>,
}

impl CorpusConfig {
    /// Corpus backed by a plain image directory.
    pub fn directory(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            feature_index: None,
        }
    }

    /// Corpus with a feature index for embedding-based methods.
    pub fn with_feature_index(root: impl Into<PathBuf>, index: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            feature_index: Some(index.into()),
        }
    }

    /// The corpus argument the given method's executable expects.
    fn argument_for(&self, method: MatcherMethod) -> MatchGridResult<&Path> {
        match method.corpus_source() {
            CorpusSource::Directory => Ok(&self.root),
            CorpusSource::FeatureIndex => self
                .feature_index
                .as_deref()
                .ok_or_else(|| MatchGridError::MissingFeatureIndex {
                    method: method.wire_name().to_owned(),
                }),
        }
    }
}

/// One incoming query, discarded after the outcome is produced.
#[derive(Clone, Debug)]
pub struct SearchRequest {
    pub target: PathBuf,
    pub method: MatcherMethod,
    pub limit: usize,
}

impl SearchRequest {
    /// Request with the default result limit.
    pub fn new(target: impl Into<PathBuf>, method: MatcherMethod) -> Self {
        Self {
            target: target.into(),
            method,
            limit: DEFAULT_RESULT_LIMIT,
        }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }
}

/// Ranked records plus the matcher's diagnostic stream.
#[derive(Debug)]
pub struct SearchOutcome {
    /// At most `limit` records, best first, never the target itself.
    pub records: Vec<MatchRecord>,
    /// Whatever the matcher printed to stderr, kept for diagnosis.
    pub stderr: String,
}

/// Runs one search: validates the target, invokes the matcher, parses the
/// full emitted ranking, drops the target itself, and truncates.
///
/// Invocation failures surface as structured errors carrying captured
/// output; a search never reports an empty success when the matcher failed.
pub fn search(
    invoker: &Invoker,
    request: &SearchRequest,
    corpus: &CorpusConfig,
) -> MatchGridResult<SearchOutcome> {
    if request.limit == 0 {
        return Err(MatchGridError::InvalidLimit);
    }
    let target_canonical =
        request
            .target
            .canonicalize()
            .map_err(|err| MatchGridError::TargetImageUnreadable {
                path: request.target.clone(),
                reason: err.to_string(),
            })?;
    if !target_canonical.is_file() {
        return Err(MatchGridError::TargetImageUnreadable {
            path: request.target.clone(),
            reason: "not a regular file".to_owned(),
        });
    }

    let corpus_arg = corpus.argument_for(request.method)?;
    let output = invoker.invoke(request.method, &target_canonical, corpus_arg, request.limit)?;

    // Parse everything first so exclusion and truncation preserve the
    // matcher's emitted order.
    let mut records = parse_matches(&output.stdout, &corpus.root, usize::MAX);
    records.retain(|record| {
        record
            .path
            .canonicalize()
            .map(|path| path != target_canonical)
            .unwrap_or(true)
    });
    records.truncate(request.limit);
    debug!(
        method = request.method.wire_name(),
        returned = records.len(),
        "search complete"
    );

    Ok(SearchOutcome {
        records,
        stderr: output.stderr,
    })
}
