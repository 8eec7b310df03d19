//! External matcher invocation.
//!
//! Each [`MatcherMethod`] maps 1:1 to an executable name and an
//! argument-building strategy. Every matcher follows the same CLI contract:
//! `<exe> <target_path> <corpus_root_or_index> <N>`, printing ranked result
//! lines to stdout. The invoker spawns exactly one process per call, drains
//! both output streams on dedicated threads so the child can never block on
//! a full pipe, and enforces a hard deadline. No state is shared between
//! calls.

use std::fmt;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::str::FromStr;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::debug;

use crate::util::{MatchGridError, MatchGridResult};

/// Poll interval while waiting for the child to exit.
const WAIT_POLL: Duration = Duration::from_millis(10);

/// What kind of corpus argument a matcher expects.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CorpusSource {
    /// A directory of candidate images.
    Directory,
    /// A precomputed feature index file (e.g. an embeddings CSV).
    FeatureIndex,
}

/// Registered matcher methods.
///
/// Adding a method means adding one variant and extending the three lookup
/// tables below; there is no other conditional logic to touch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MatcherMethod {
    Baseline,
    Histogram,
    MultiHistogram,
    TextureColor,
    Dnn,
    Adaptive,
    Saliency,
}

impl MatcherMethod {
    /// Every registered method, in presentation order.
    pub const ALL: [MatcherMethod; 7] = [
        MatcherMethod::Baseline,
        MatcherMethod::Histogram,
        MatcherMethod::MultiHistogram,
        MatcherMethod::TextureColor,
        MatcherMethod::Dnn,
        MatcherMethod::Adaptive,
        MatcherMethod::Saliency,
    ];

    /// The identifier used in requests and configuration files.
    pub fn wire_name(&self) -> &'static str {
        match self {
            MatcherMethod::Baseline => "baseline",
            MatcherMethod::Histogram => "histogram",
            MatcherMethod::MultiHistogram => "multi_histogram",
            MatcherMethod::TextureColor => "texture_color",
            MatcherMethod::Dnn => "dnn",
            MatcherMethod::Adaptive => "adaptive",
            MatcherMethod::Saliency => "saliency",
        }
    }

    /// Name of the matcher executable inside the build directory.
    pub fn executable(&self) -> &'static str {
        match self {
            MatcherMethod::Baseline => "baseline_matching",
            MatcherMethod::Histogram => "histogram_matching",
            MatcherMethod::MultiHistogram => "multi_histogram",
            MatcherMethod::TextureColor => "texture_color",
            MatcherMethod::Dnn => "dnn_matching",
            MatcherMethod::Adaptive => "adaptive_matching",
            MatcherMethod::Saliency => "saliency_matching",
        }
    }

    /// Which corpus argument the method's executable expects.
    pub fn corpus_source(&self) -> CorpusSource {
        match self {
            MatcherMethod::Dnn => CorpusSource::FeatureIndex,
            _ => CorpusSource::Directory,
        }
    }

    /// Short human-readable label used for comparison grid rows.
    pub fn label(&self) -> &'static str {
        match self {
            MatcherMethod::Baseline => "Baseline",
            MatcherMethod::Histogram => "Histogram",
            MatcherMethod::MultiHistogram => "Multi-Hist",
            MatcherMethod::TextureColor => "Texture+Color",
            MatcherMethod::Dnn => "DNN",
            MatcherMethod::Adaptive => "Adaptive",
            MatcherMethod::Saliency => "Saliency",
        }
    }
}

impl fmt::Display for MatcherMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

impl FromStr for MatcherMethod {
    type Err = MatchGridError;

    fn from_str(name: &str) -> MatchGridResult<Self> {
        Self::ALL
            .into_iter()
            .find(|method| method.wire_name() == name)
            .ok_or_else(|| MatchGridError::UnknownMethod(name.to_owned()))
    }
}

/// Raw captured output of one matcher run that exited successfully.
#[derive(Debug)]
pub struct MatcherOutput {
    pub stdout: String,
    pub stderr: String,
    /// Raw exit status as reported by the OS (always zero here; non-zero
    /// exits surface as [`MatchGridError::MatcherNonZeroExit`]).
    pub status: i32,
}

/// Runs matcher executables out of a build directory with a hard deadline.
#[derive(Clone, Debug)]
pub struct Invoker {
    build_dir: PathBuf,
    timeout: Duration,
}

impl Invoker {
    /// Creates an invoker for executables under `build_dir`.
    pub fn new(build_dir: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            build_dir: build_dir.into(),
            timeout,
        }
    }

    /// Returns the deadline applied to every invocation.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Resolves the executable path for a method.
    pub fn executable_path(&self, method: MatcherMethod) -> PathBuf {
        self.build_dir.join(method.executable())
    }

    /// Invokes `method` against `target` and `corpus_arg`, waiting at most
    /// the configured timeout.
    ///
    /// `corpus_arg` is a corpus directory or a feature index file depending
    /// on [`MatcherMethod::corpus_source`]; both paths are made absolute
    /// before substitution into the argument template. On timeout the child
    /// is killed and reaped before the error is returned, so no matcher
    /// outlives its call.
    pub fn invoke(
        &self,
        method: MatcherMethod,
        target: &Path,
        corpus_arg: &Path,
        limit: usize,
    ) -> MatchGridResult<MatcherOutput> {
        if limit == 0 {
            return Err(MatchGridError::InvalidLimit);
        }
        let exe = self.executable_path(method);
        // The matcher contract takes absolute paths; the caller's cwd must
        // not leak into the child's interpretation of its arguments.
        let target = std::path::absolute(target)?;
        let corpus_arg = std::path::absolute(corpus_arg)?;
        debug!(
            method = method.wire_name(),
            exe = %exe.display(),
            target = %target.display(),
            corpus = %corpus_arg.display(),
            limit,
            "invoking matcher"
        );

        let child = Command::new(&exe)
            .arg(&target)
            .arg(&corpus_arg)
            .arg(limit.to_string())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|err| {
                if err.kind() == std::io::ErrorKind::NotFound {
                    MatchGridError::ExecutableNotFound { path: exe.clone() }
                } else {
                    MatchGridError::Io(err)
                }
            })?;
        let mut child = ChildGuard::new(child);

        // Pipes are taken before waiting; draining on threads prevents the
        // child from blocking once a pipe buffer fills.
        let stdout_drain = child.drain_stdout();
        let stderr_drain = child.drain_stderr();

        let deadline = Instant::now() + self.timeout;
        let status = loop {
            if let Some(status) = child.try_wait()? {
                break status;
            }
            if Instant::now() >= deadline {
                child.kill_and_reap();
                return Err(MatchGridError::MatcherTimeout {
                    timeout: self.timeout,
                    stdout: collect(stdout_drain),
                    stderr: collect(stderr_drain),
                });
            }
            thread::sleep(WAIT_POLL);
        };

        let stdout = collect(stdout_drain);
        let stderr = collect(stderr_drain);
        let code = status.code().unwrap_or(-1);
        if !status.success() {
            return Err(MatchGridError::MatcherNonZeroExit {
                status: code,
                stdout,
                stderr,
            });
        }
        Ok(MatcherOutput {
            stdout,
            stderr,
            status: code,
        })
    }
}

/// Scoped child process: killed and reaped on drop unless it already exited.
///
/// Reaping matters: a killed child that is never `wait()`ed stays in the
/// kernel process table as a zombie.
struct ChildGuard {
    child: Child,
    reaped: bool,
}

impl ChildGuard {
    fn new(child: Child) -> Self {
        Self {
            child,
            reaped: false,
        }
    }

    fn drain_stdout(&mut self) -> Option<JoinHandle<String>> {
        self.child.stdout.take().map(drain)
    }

    fn drain_stderr(&mut self) -> Option<JoinHandle<String>> {
        self.child.stderr.take().map(drain)
    }

    fn try_wait(&mut self) -> std::io::Result<Option<ExitStatus>> {
        let status = self.child.try_wait()?;
        if status.is_some() {
            self.reaped = true;
        }
        Ok(status)
    }

    fn kill_and_reap(&mut self) {
        if !self.reaped {
            let _ = self.child.kill();
            let _ = self.child.wait();
            self.reaped = true;
        }
    }
}

impl Drop for ChildGuard {
    fn drop(&mut self) {
        self.kill_and_reap();
    }
}

/// Reads a pipe to exhaustion on a background thread.
fn drain<R: Read + Send + 'static>(mut pipe: R) -> JoinHandle<String> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = pipe.read_to_end(&mut buf);
        String::from_utf8_lossy(&buf).into_owned()
    })
}

/// Joins a drain thread, tolerating a panicked or absent drain.
fn collect(handle: Option<JoinHandle<String>>) -> String {
    handle
        .and_then(|handle| handle.join().ok())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::{CorpusSource, MatcherMethod};
    use std::str::FromStr;

    #[test]
    fn wire_names_round_trip_for_every_method() {
        for method in MatcherMethod::ALL {
            let parsed = MatcherMethod::from_str(method.wire_name()).unwrap();
            assert_eq!(parsed, method);
        }
    }

    #[test]
    fn unknown_method_is_a_configuration_error() {
        let err = MatcherMethod::from_str("quantum").unwrap_err();
        assert!(err.to_string().contains("quantum"));
    }

    #[test]
    fn only_dnn_takes_a_feature_index() {
        for method in MatcherMethod::ALL {
            let expected = if method == MatcherMethod::Dnn {
                CorpusSource::FeatureIndex
            } else {
                CorpusSource::Directory
            };
            assert_eq!(method.corpus_source(), expected);
        }
    }

    #[test]
    fn executables_are_distinct() {
        let mut names: Vec<_> = MatcherMethod::ALL
            .iter()
            .map(|method| method.executable())
            .collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), MatcherMethod::ALL.len());
    }
}
