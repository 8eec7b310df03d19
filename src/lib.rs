//! MatchGrid sits between a set of external content-based image-retrieval
//! matchers and a human consumer.
//!
//! It does not compute similarity itself. It invokes a matcher executable,
//! recovers a ranked list of `(image, distance)` records from the matcher's
//! free-text output, and composites one or more ranked result rows together
//! with the target image into a single aligned raster for inspection.

pub mod grid;
pub mod invoker;
pub mod parser;
pub mod search;
pub mod serve;
pub mod util;

pub use grid::{compose, ComparisonGrid, ComparisonRow, GridStyle};
pub use invoker::{CorpusSource, Invoker, MatcherMethod, MatcherOutput};
pub use parser::{parse_matches, resolve_match_path, MatchRecord};
pub use search::{search, CorpusConfig, SearchOutcome, SearchRequest, DEFAULT_RESULT_LIMIT};
pub use util::{MatchGridError, MatchGridResult};
