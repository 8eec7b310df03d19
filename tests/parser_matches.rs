use matchgrid::parse_matches;
use std::fs;
use tempfile::TempDir;

/// Stdout of the baseline matcher for target pic.1072.jpg, limit 3.
const RANKED_OUTPUT: &str = "1. pic.0768.jpg (distance: 120.5)\n\
                             2. pic.0138.jpg (distance: 145.2)\n\
                             3. pic.0234.jpg (distance: 200.0)";

fn corpus_with(names: &[&str]) -> TempDir {
    let dir = TempDir::new().unwrap();
    for name in names {
        fs::write(dir.path().join(name), b"raster bytes").unwrap();
    }
    dir
}

#[test]
fn ranked_lines_parse_in_emitted_order() {
    let corpus = corpus_with(&["pic.0768.jpg", "pic.0138.jpg", "pic.0234.jpg"]);
    let records = parse_matches(RANKED_OUTPUT, corpus.path(), 3);

    assert_eq!(records.len(), 3);
    let distances: Vec<f64> = records.iter().map(|r| r.distance).collect();
    assert_eq!(distances, vec![120.5, 145.2, 200.0]);
    assert_eq!(records[0].path, corpus.path().join("pic.0768.jpg"));
    assert_eq!(records[1].path, corpus.path().join("pic.0138.jpg"));
    assert_eq!(records[2].path, corpus.path().join("pic.0234.jpg"));
    assert!(records.iter().all(|r| r.path.is_file()));
    assert!(records.iter().all(|r| !r.distance_substituted));
}

#[test]
fn truncation_happens_after_the_full_parse() {
    let corpus = corpus_with(&["pic.0768.jpg", "pic.0138.jpg", "pic.0234.jpg"]);
    let records = parse_matches(RANKED_OUTPUT, corpus.path(), 1);

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].path, corpus.path().join("pic.0768.jpg"));
    assert_eq!(records[0].distance, 120.5);
}

#[test]
fn text_without_result_lines_yields_empty_not_error() {
    let corpus = corpus_with(&[]);
    let stdout = "Target image: pic.1072.jpg\nComputing features for all database images...\n";
    assert!(parse_matches(stdout, corpus.path(), 5).is_empty());
    assert!(parse_matches("", corpus.path(), 5).is_empty());
}

#[test]
fn informational_lines_are_skipped_between_results() {
    let corpus = corpus_with(&["pic.0768.jpg", "pic.0138.jpg"]);
    let stdout = "Target image: /data/olympus/pic.1072.jpg\n\
                  Computing baseline matching (7x7 center square, SSD)...\n\
                  \n\
                  === Top 2 matches ===\n\
                  1. pic.0768.jpg (distance: 120.5)\n\
                  2. pic.0138.jpg (distance: 145.2)\n";
    let records = parse_matches(stdout, corpus.path(), 5);
    assert_eq!(records.len(), 2);
}

#[test]
fn unresolvable_paths_are_dropped_without_breaking_order() {
    // Only the middle-ranked file exists on disk.
    let corpus = corpus_with(&["pic.0138.jpg"]);
    let records = parse_matches(RANKED_OUTPUT, corpus.path(), 5);

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].path, corpus.path().join("pic.0138.jpg"));
    assert_eq!(records[0].distance, 145.2);
}

#[test]
fn unparsable_distance_is_substituted_and_flagged() {
    let corpus = corpus_with(&["pic.0768.jpg", "pic.0138.jpg"]);
    let stdout = "1. pic.0768.jpg (distance: N/A)\n2. pic.0138.jpg (distance: 145.2)";
    let records = parse_matches(stdout, corpus.path(), 5);

    assert_eq!(records.len(), 2);
    assert_eq!(records[0].distance, 0.0);
    assert!(records[0].distance_substituted);
    assert_eq!(records[1].distance, 145.2);
    assert!(!records[1].distance_substituted);
}

#[test]
fn absolute_tokens_resolve_directly() {
    let corpus = corpus_with(&["pic.0768.jpg"]);
    let absolute = corpus.path().join("pic.0768.jpg");
    let stdout = format!("1. {} (distance: 1.25)", absolute.display());
    // Resolution must not depend on the corpus root for absolute hits.
    let records = parse_matches(&stdout, std::path::Path::new("/nonexistent-root"), 5);

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].path, absolute);
}

#[test]
fn relative_tokens_fall_back_to_basename_under_the_corpus() {
    let corpus = corpus_with(&["pic.0768.jpg"]);
    let stdout = "1. some/build/dir/pic.0768.jpg (distance: 9.0)";
    let records = parse_matches(stdout, corpus.path(), 5);

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].path, corpus.path().join("pic.0768.jpg"));
}

#[test]
fn parenthesized_tokens_are_unwrapped() {
    let corpus = corpus_with(&["pic.0768.jpg"]);
    let stdout = "1. (pic.0768.jpg), (distance: 3.5)";
    let records = parse_matches(stdout, corpus.path(), 5);

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].path, corpus.path().join("pic.0768.jpg"));
    assert_eq!(records[0].distance, 3.5);
}
