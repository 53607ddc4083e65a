//! Word-level Markov chain text generation library and CLI.
//!
//! The crate exposes both a library API and a `markov` command line interface for
//! building Markov chains from plain-text sources and generating pseudo-random text
//! from them.  Typical usage streams local files or URLs through a [`ChainBuilder`],
//! persists the resulting [`MarkovChain`], and later walks it with
//! [`generator::generate_text`].
//!
//! ```no_run
//! use markov_text::{generator, BuildConfig, ChainBuilder, GenerateConfig};
//!
//! # fn main() -> markov_text::Result<()> {
//! let build_cfg = BuildConfig::builder().order(2).build()?;
//! let artifacts = ChainBuilder::new(build_cfg).build_from_sources(&["/path/to/books"])?;
//! artifacts.chain.save_to_path("chain.txt")?;
//!
//! let mut chain = markov_text::MarkovChain::default();
//! chain.load_from_path("chain.txt")?;
//! let generate_cfg = GenerateConfig::builder().word_count(50).build()?;
//! generator::generate_text(&mut chain, &["once", "upon"], &generate_cfg, std::io::stdout())?;
//! # Ok(())
//! # }
//! ```
//!
//! The CLI is enabled by default through the `cli` feature.  Users targeting the
//! library portion only can disable default features to avoid the CLI
//! dependencies: `markov-text = { version = "...", default-features = false }`.

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    clippy::all,
    rust_2018_idioms,
    future_incompatible,
    unused_lifetimes,
    unreachable_pub
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::missing_panics_doc,
    clippy::missing_errors_doc,
    clippy::doc_markdown,
    clippy::multiple_crate_versions
)]

pub mod builder;
pub mod chain;
pub mod config;
pub mod corpus;
pub mod error;
pub mod generator;
pub mod metrics;
pub mod normalize;
pub mod serialization;
pub mod splitter;

pub use builder::{BuildArtifacts, ChainBuilder};
pub use chain::MarkovChain;
pub use config::{BuildConfig, BuildConfigBuilder, GenerateConfig, GenerateConfigBuilder};
pub use error::{ChainError, Result};
pub use generator::TextGenerator;
pub use metrics::{BuildMetrics, ChainStats, SourceMetrics};
