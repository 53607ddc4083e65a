//! Pipeline turning text sources into a trained chain.
//!
//! Every source is streamed in `chunk_size` pieces through a [`WordSplitter`], each raw
//! token is normalised, and surviving words are fed to the chain. The splitter and the
//! chain window are both flushed at the end of a source, so no state ever spans two
//! sources.

use std::io::{ErrorKind, Read};
use std::time::Instant;

use log::{debug, info};

use crate::chain::MarkovChain;
use crate::config::{BuildConfig, BuildConfigBuilder};
use crate::corpus::{expand_sources, SourceReader, TextSource};
use crate::error::{ChainError, Result};
use crate::metrics::{BuildMetrics, SourceMetrics};
use crate::normalize::normalize_word;
use crate::splitter::WordSplitter;

/// High-level façade configuring and executing chain builds.
#[derive(Debug, Clone)]
pub struct ChainBuilder {
    cfg: BuildConfig,
}

/// Artifacts returned after a build completes.
#[must_use]
#[derive(Debug)]
pub struct BuildArtifacts {
    /// Trained chain.
    pub chain: MarkovChain,
    /// Per-source accounting captured during the build.
    pub metrics: BuildMetrics,
}

impl ChainBuilder {
    /// Creates a builder for the supplied configuration.
    #[must_use]
    pub fn new(cfg: BuildConfig) -> Self {
        Self { cfg }
    }

    /// Returns a [`BuildConfigBuilder`] with default settings.
    #[must_use]
    pub fn builder() -> BuildConfigBuilder {
        BuildConfig::builder()
    }

    /// Returns an immutable reference to the underlying configuration.
    #[must_use]
    pub fn config(&self) -> &BuildConfig {
        &self.cfg
    }

    /// Creates an empty chain with the configured order.
    #[must_use]
    pub fn new_chain(&self) -> MarkovChain {
        MarkovChain::new(self.cfg.order)
    }

    /// Resolves source identifiers into the ordered list of sources to ingest.
    pub fn sources<S: AsRef<str>>(&self, inputs: &[S]) -> Result<Vec<TextSource>> {
        expand_sources(inputs, &self.cfg)
    }

    /// Builds a chain from every source named by `inputs`, in order.
    pub fn build_from_sources<S: AsRef<str>>(&self, inputs: &[S]) -> Result<BuildArtifacts> {
        self.cfg.validate()?;
        let sources = self.sources(inputs)?;
        let start = Instant::now();
        let mut chain = self.new_chain();
        let mut metrics = BuildMetrics::new(sources.len());
        for source in &sources {
            metrics.sources.push(self.ingest_source(&mut chain, source)?);
        }
        metrics.total_duration = start.elapsed();
        info!(
            "built chain from {} sources: {} words, {} states",
            metrics.sources.len(),
            metrics.words_ingested(),
            chain.state_count()
        );
        Ok(BuildArtifacts { chain, metrics })
    }

    /// Streams one source into `chain`.
    pub fn ingest_source(
        &self,
        chain: &mut MarkovChain,
        source: &TextSource,
    ) -> Result<SourceMetrics> {
        let id = source.id();
        info!("processing {id}");
        let mut reader = SourceReader::open(source, &self.cfg)?;
        let metrics = match self.ingest_reader(chain, &id, &mut reader) {
            Ok(metrics) => metrics,
            Err(err) => {
                reader.abort();
                return Err(attach_path(err, source));
            }
        };
        reader.finish().map_err(|err| attach_path(err, source))?;
        Ok(metrics)
    }

    /// Streams an arbitrary reader into `chain` as one independent source.
    pub fn ingest_reader<R: Read>(
        &self,
        chain: &mut MarkovChain,
        id: &str,
        mut reader: R,
    ) -> Result<SourceMetrics> {
        let start = Instant::now();
        let mut splitter = WordSplitter::new();
        let mut buffer = vec![0u8; self.cfg.chunk_size.max(1)];
        let mut bytes_read = 0u64;
        let mut tokens_read = 0usize;
        let mut words_ingested = 0usize;
        let mut ingest = |token: &[u8]| -> Result<()> {
            tokens_read += 1;
            if let Some(word) = normalize_word(token)? {
                chain.add_word(&word)?;
                words_ingested += 1;
            }
            Ok(())
        };
        loop {
            let read = match reader.read(&mut buffer) {
                Ok(0) => break,
                Ok(read) => read,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(err.into()),
            };
            bytes_read += read as u64;
            splitter.feed(&buffer[..read], &mut ingest)?;
        }
        if let Some(tail) = splitter.finish() {
            ingest(&tail)?;
        }
        chain.flush();

        let elapsed = start.elapsed();
        debug!(
            "{id}: {bytes_read} bytes, {tokens_read} tokens, {words_ingested} words in {elapsed:.2?}"
        );
        Ok(SourceMetrics {
            source: id.to_owned(),
            bytes_read,
            tokens_read,
            words_ingested,
            elapsed,
        })
    }
}

fn attach_path(err: ChainError, source: &TextSource) -> ChainError {
    match (err, source) {
        (ChainError::Io { source, path: None }, TextSource::File(path)) => {
            ChainError::io(source, Some(path.clone()))
        }
        (other, _) => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn builder(order: usize, chunk_size: usize) -> ChainBuilder {
        ChainBuilder::new(
            BuildConfig::builder()
                .order(order)
                .chunk_size(chunk_size)
                .build()
                .expect("valid config"),
        )
    }

    #[test]
    fn ingest_reader_normalises_and_records_words() {
        let builder = builder(1, 4096);
        let mut chain = builder.new_chain();
        let metrics = builder
            .ingest_reader(&mut chain, "memory", "The cat. THE dog! --".as_bytes())
            .expect("ingest");
        assert_eq!(metrics.tokens_read, 5);
        assert_eq!(metrics.words_ingested, 4);
        assert_eq!(chain.successors(&["the"]).unwrap(), vec!["cat", "dog"]);
        assert_eq!(chain.successors(&["cat"]).unwrap(), vec!["the"]);
    }

    #[test]
    fn tiny_chunks_produce_the_same_chain() {
        let text = "one two three two one two three four".as_bytes();
        let whole = builder(2, 4096);
        let mut expected = whole.new_chain();
        whole.ingest_reader(&mut expected, "whole", text).unwrap();

        let chunked = builder(2, 3);
        let mut actual = chunked.new_chain();
        chunked.ingest_reader(&mut actual, "chunked", text).unwrap();

        assert_eq!(actual.stats(), expected.stats());
        assert_eq!(
            actual.successors(&["two", "three"]).unwrap(),
            expected.successors(&["two", "three"]).unwrap()
        );
    }

    #[test]
    fn sources_do_not_share_states() {
        let dir = tempdir().expect("tempdir");
        fs::write(dir.path().join("a.txt"), "alpha beta").expect("write a");
        fs::write(dir.path().join("b.txt"), "gamma delta").expect("write b");

        let builder = builder(1, 4096);
        let artifacts = builder
            .build_from_sources(&[dir.path().display().to_string()])
            .expect("build");
        let chain = &artifacts.chain;
        assert_eq!(artifacts.metrics.sources.len(), 2);
        assert_eq!(artifacts.metrics.words_ingested(), 4);
        assert_eq!(chain.state_count(), 2);
        assert!(chain.successors(&["beta"]).is_err());
        assert_eq!(chain.successors(&["gamma"]).unwrap(), vec!["delta"]);
    }

    #[test]
    fn malformed_text_fails_the_build() {
        let builder = builder(1, 4096);
        let mut chain = builder.new_chain();
        let err = builder
            .ingest_reader(&mut chain, "bad", &[b'o', b'k', b' ', 0xFF, b' '][..])
            .unwrap_err();
        assert!(matches!(err, ChainError::Encoding(_)));
    }

    #[cfg(unix)]
    #[test]
    fn ingest_error_on_a_fetched_source_stops_the_fetch() {
        use std::os::unix::fs::PermissionsExt;
        use std::sync::mpsc;
        use std::thread;
        use std::time::Duration;

        let dir = tempdir().expect("tempdir");
        let script = dir.path().join("fetch.sh");
        fs::write(
            &script,
            "#!/bin/sh\nprintf 'ok \\377 '\ni=0\nwhile [ $i -lt 20000 ]; do\n  printf 'word word word word word word word word word word '\n  i=$((i + 1))\ndone\n",
        )
        .expect("write script");
        fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).expect("chmod script");

        let builder = ChainBuilder::new(
            BuildConfig::builder()
                .order(1)
                .fetch_program(script.display().to_string())
                .build()
                .expect("valid config"),
        );
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let mut chain = builder.new_chain();
            let source = TextSource::Url("https://example.org/cp1251.txt".into());
            let _ = tx.send(builder.ingest_source(&mut chain, &source));
        });
        let result = rx
            .recv_timeout(Duration::from_secs(20))
            .expect("ingest_source returned after the fetch was stopped");
        assert!(matches!(result, Err(ChainError::Encoding(_))));
    }

    #[test]
    fn missing_sources_are_rejected() {
        let dir = tempdir().expect("tempdir");
        let missing = dir.path().join("absent.txt").display().to_string();
        let err = builder(2, 4096).build_from_sources(&[missing]).unwrap_err();
        assert!(matches!(err, ChainError::InvalidConfig(_)));
    }
}
