//! Facilities for discovering text sources and opening them as byte streams.
//!
//! A source identifier containing `://` is a URL and is fetched through an external program
//! (`curl` by default); anything else is a local file or directory.

use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdout, Command, Stdio};

use log::debug;
use walkdir::WalkDir;

use crate::config::BuildConfig;
use crate::error::{ChainError, Result};

/// Arguments passed to the fetch program ahead of the URL.
const FETCH_ARGS: [&str; 2] = ["-sSfL", "--"];

/// A single text source, read and flushed independently of the others.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextSource {
    /// Local file.
    File(PathBuf),
    /// Remote document fetched by the configured fetch program.
    Url(String),
}

impl TextSource {
    /// Human-readable identifier used in logs and errors.
    #[must_use]
    pub fn id(&self) -> String {
        match self {
            Self::File(path) => path.display().to_string(),
            Self::Url(url) => url.clone(),
        }
    }
}

/// Returns `true` when `input` names a remote resource rather than a local path.
#[must_use]
pub fn is_url(input: &str) -> bool {
    input
        .split_once("://")
        .is_some_and(|(scheme, _)| !scheme.is_empty() && scheme.chars().all(is_scheme_char))
}

fn is_scheme_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || matches!(ch, '+' | '-' | '.')
}

/// Expands source identifiers into the ordered list of sources to ingest.
///
/// URLs are kept in place; local paths go through [`collect_paths`].
pub fn expand_sources<S: AsRef<str>>(inputs: &[S], cfg: &BuildConfig) -> Result<Vec<TextSource>> {
    let mut sources = Vec::new();
    for input in inputs {
        let input = input.as_ref();
        if is_url(input) {
            sources.push(TextSource::Url(input.to_owned()));
        } else {
            let paths = collect_paths(&[Path::new(input)], cfg)?;
            sources.extend(paths.into_iter().map(TextSource::File));
        }
    }
    if sources.is_empty() {
        return Err(ChainError::InvalidConfig("no text sources provided".into()));
    }
    Ok(sources)
}

/// Discovers files rooted at the provided input paths according to the build configuration.
///
/// Directories are traversed recursively by default; set [`BuildConfig::recursive`] to `false`
/// to limit discovery to the first level.  Symlink traversal is controlled through
/// [`BuildConfig::follow_symlinks`].  Files found under a directory are returned sorted.
pub fn collect_paths<P: AsRef<Path>>(inputs: &[P], cfg: &BuildConfig) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for input in inputs {
        let path = input.as_ref();
        if !path.exists() {
            return Err(ChainError::InvalidConfig(format!(
                "input path {path:?} does not exist"
            )));
        }
        let metadata = path
            .metadata()
            .map_err(|err| ChainError::io(err, Some(path.to_path_buf())))?;
        if metadata.is_file() {
            files.push(path.to_path_buf());
            continue;
        }
        let mut found = Vec::new();
        if cfg.recursive {
            let walker = WalkDir::new(path).follow_links(cfg.follow_symlinks);
            for entry in walker {
                let entry = entry.map_err(|err| ChainError::Internal(err.to_string()))?;
                if entry.file_type().is_file() {
                    found.push(entry.into_path());
                }
            }
        } else {
            for entry in std::fs::read_dir(path)
                .map_err(|err| ChainError::io(err, Some(path.to_path_buf())))?
            {
                let entry = entry.map_err(|err| ChainError::io(err, Some(path.to_path_buf())))?;
                let entry_path = entry.path();
                if entry_path.is_file() {
                    found.push(entry_path);
                }
            }
        }
        found.sort();
        files.extend(found);
    }
    if files.is_empty() {
        return Err(ChainError::InvalidConfig(
            "no files discovered in provided inputs".into(),
        ));
    }
    Ok(files)
}

/// Byte stream over an opened source.
///
/// Call [`SourceReader::finish`] once the stream is exhausted: for fetched sources that is
/// where a failed download is reported. A stream abandoned midway is released with
/// [`SourceReader::abort`].
#[derive(Debug)]
pub struct SourceReader {
    id: String,
    inner: Inner,
}

#[derive(Debug)]
enum Inner {
    File(File),
    Fetch {
        program: String,
        child: Option<Child>,
        stdout: Option<ChildStdout>,
    },
}

impl SourceReader {
    /// Opens `source`, spawning the fetch program for URLs.
    pub fn open(source: &TextSource, cfg: &BuildConfig) -> Result<Self> {
        let id = source.id();
        let inner = match source {
            TextSource::File(path) => {
                let file = File::open(path).map_err(|err| ChainError::io(err, Some(path.clone())))?;
                Inner::File(file)
            }
            TextSource::Url(url) => {
                debug!("spawning {} for {url}", cfg.fetch_program);
                let mut child = Command::new(&cfg.fetch_program)
                    .args(FETCH_ARGS)
                    .arg(url)
                    .stdin(Stdio::null())
                    .stdout(Stdio::piped())
                    .stderr(Stdio::piped())
                    .spawn()
                    .map_err(|err| ChainError::Transport {
                        source_id: url.clone(),
                        message: format!("failed to launch {}: {err}", cfg.fetch_program),
                    })?;
                let stdout = child.stdout.take().ok_or_else(|| {
                    ChainError::Internal("fetch program stdout was not captured".into())
                })?;
                Inner::Fetch {
                    program: cfg.fetch_program.clone(),
                    child: Some(child),
                    stdout: Some(stdout),
                }
            }
        };
        Ok(Self { id, inner })
    }

    /// Identifier of the underlying source.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Releases the source, reporting a failed fetch as [`ChainError::Transport`].
    pub fn finish(mut self) -> Result<()> {
        let Inner::Fetch {
            program,
            child,
            stdout,
        } = &mut self.inner
        else {
            return Ok(());
        };
        // The pipe must be closed before waiting or a writer with unread output never exits.
        drop(stdout.take());
        let Some(child) = child.take() else {
            return Ok(());
        };
        let output = child.wait_with_output().map_err(|err| ChainError::Transport {
            source_id: self.id.clone(),
            message: format!("failed to wait for {program}: {err}"),
        })?;
        if output.status.success() {
            return Ok(());
        }
        let stderr = String::from_utf8_lossy(&output.stderr);
        let detail = stderr.trim();
        Err(ChainError::Transport {
            source_id: self.id.clone(),
            message: if detail.is_empty() {
                format!("{program} exited with {}", output.status)
            } else {
                format!("{program} exited with {}: {detail}", output.status)
            },
        })
    }

    /// Releases a source whose stream was not consumed to the end.
    ///
    /// A running fetch program is killed and reaped; its exit status is not reported.
    pub fn abort(mut self) {
        self.terminate();
    }

    fn terminate(&mut self) {
        if let Inner::Fetch { child, stdout, .. } = &mut self.inner {
            drop(stdout.take());
            if let Some(mut child) = child.take() {
                if let Err(err) = child.kill() {
                    debug!("{}: fetch program already exited: {err}", self.id);
                }
                let _ = child.wait();
            }
        }
    }
}

impl Read for SourceReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match &mut self.inner {
            Inner::File(file) => file.read(buf),
            Inner::Fetch {
                stdout: Some(stdout),
                ..
            } => stdout.read(buf),
            Inner::Fetch { stdout: None, .. } => Ok(0),
        }
    }
}

impl Drop for SourceReader {
    fn drop(&mut self) {
        self.terminate();
    }
}
