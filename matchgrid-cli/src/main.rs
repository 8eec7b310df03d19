use clap::Parser;
use matchgrid::{
    compose, search, ComparisonGrid, ComparisonRow, CorpusConfig, GridStyle, Invoker,
    MatcherMethod, SearchRequest, DEFAULT_RESULT_LIMIT,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

const EXAMPLE_JSON: &str =
    include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config.example.json"));

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "MatchGrid CLI: run matchers and composite a comparison grid (JSON config driven)"
)]
struct Cli {
    /// Path to the JSON configuration file.
    #[arg(short, long, value_name = "FILE", default_value = "config.json")]
    config: PathBuf,
    /// Print an example config and exit.
    #[arg(long)]
    print_example: bool,
    /// Enable tracing output.
    #[arg(long)]
    trace: bool,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct Config {
    build_dir: String,
    corpus_root: String,
    embeddings_csv: Option<String>,
    target_image: String,
    methods: Vec<String>,
    num_results: usize,
    timeout_secs: u64,
    tile_size: u32,
    row_prefix: usize,
    output_path: String,
    /// Where to write the JSON report; stdout when absent.
    results_path: Option<String>,
    title: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        let style = GridStyle::default();
        Self {
            build_dir: String::new(),
            corpus_root: String::new(),
            embeddings_csv: None,
            target_image: String::new(),
            methods: MatcherMethod::ALL
                .iter()
                .map(|method| method.wire_name().to_owned())
                .collect(),
            num_results: DEFAULT_RESULT_LIMIT,
            timeout_secs: 60,
            tile_size: style.tile_size,
            row_prefix: style.row_prefix,
            output_path: "comparison.jpg".to_owned(),
            results_path: None,
            title: None,
        }
    }
}

#[derive(Debug, Serialize)]
struct RecordJson {
    path: String,
    distance: f64,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    distance_substituted: bool,
}

#[derive(Debug, Serialize)]
struct MethodReport {
    method: String,
    results: Vec<RecordJson>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[derive(Debug, Serialize)]
struct Report {
    target: String,
    methods: Vec<MethodReport>,
    grid: Option<String>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if cli.trace {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::from_default_env().add_directive("matchgrid=debug".parse()?),
            )
            .with_target(false)
            .init();
    }

    if cli.print_example {
        println!("{EXAMPLE_JSON}");
        return Ok(());
    }

    let config_text = fs::read_to_string(&cli.config)?;
    let config: Config = serde_json::from_str(&config_text)?;
    if config.build_dir.is_empty() || config.corpus_root.is_empty() {
        return Err("build_dir and corpus_root must be set in the config".into());
    }
    if config.target_image.is_empty() {
        return Err("target_image must be set in the config".into());
    }
    if config.methods.is_empty() {
        return Err("methods must list at least one matcher method".into());
    }

    let invoker = Invoker::new(&config.build_dir, Duration::from_secs(config.timeout_secs));
    let corpus = match &config.embeddings_csv {
        Some(csv) => CorpusConfig::with_feature_index(&config.corpus_root, csv),
        None => CorpusConfig::directory(&config.corpus_root),
    };

    // Methods run sequentially: one matcher process at a time.
    let mut grid = ComparisonGrid::new(&config.target_image);
    if let Some(title) = &config.title {
        grid = grid.with_title(title);
    }
    let mut reports = Vec::with_capacity(config.methods.len());
    for name in &config.methods {
        let method = MatcherMethod::from_str(name)?;
        let request = SearchRequest::new(&config.target_image, method)
            .with_limit(config.num_results);
        match search(&invoker, &request, &corpus) {
            Ok(outcome) => {
                grid.push_row(ComparisonRow::new(
                    method.label(),
                    outcome.records.iter().map(|r| r.path.clone()).collect(),
                ));
                reports.push(MethodReport {
                    method: name.clone(),
                    results: outcome
                        .records
                        .iter()
                        .map(|record| RecordJson {
                            path: record.path.display().to_string(),
                            distance: record.distance,
                            distance_substituted: record.distance_substituted,
                        })
                        .collect(),
                    error: None,
                });
            }
            Err(err) => {
                eprintln!("method {name} failed: {err}");
                reports.push(MethodReport {
                    method: name.clone(),
                    results: Vec::new(),
                    error: Some(err.to_string()),
                });
            }
        }
    }

    if reports.iter().all(|report| report.error.is_some()) {
        return Err("every configured method failed; no grid to compose".into());
    }

    let style = GridStyle {
        tile_size: config.tile_size,
        row_prefix: config.row_prefix,
        ..GridStyle::default()
    };
    compose(&grid, &style, config.output_path.as_ref())?;

    let report = Report {
        target: config.target_image.clone(),
        methods: reports,
        grid: Some(config.output_path.clone()),
    };
    let json = serde_json::to_string_pretty(&report)?;
    match &config.results_path {
        Some(path) => fs::write(path, json)?,
        None => println!("{json}"),
    }

    Ok(())
}
