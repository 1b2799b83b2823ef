//! # pindown
//!
//! Pull recent bookmarks down from Pinboard and write each one to a
//! Markdown file, ready for a static site generator.
//!
//! ## Architecture
//!
//! ```text
//! StateStore → Fetcher → Normalizer → Pipeline (slug + template) → StateStore
//! ```
//!
//! Only the delta since the last import is fetched. Each bookmark becomes
//! `<output>/<slug>.md`; existing files are never overwritten, and the
//! import marker only moves once the whole batch went through.
//!
//! ## Quick Start
//!
//! ```bash
//! # ~/.config/pindown/state.toml needs at least:
//! #   api_token = "user:TOKEN"
//! #   local_tz = "Australia/Adelaide"
//! pindown -v content/links
//!
//! # See what would be written
//! pindown --debug -vv content/links
//! ```

/// Application context and error handling.
///
/// [`AppContext`](app::AppContext) wires together the state store, fetcher
/// and pipeline, and picks defaults for optional resources.
pub mod app;

/// Command-line interface using clap, and the sync command itself.
pub mod cli;

/// Settings file and per-run configuration.
pub mod config;

/// Core domain models.
///
/// - [`Bookmark`](domain::Bookmark): one remote bookmark
/// - [`SyncState`](domain::SyncState): persisted import marker and credentials
pub mod domain;

/// Remote access and the "what to fetch" decision.
///
/// - [`Fetcher`](fetcher::Fetcher): trait for the remote collection
/// - [`PinboardFetcher`](fetcher::PinboardFetcher): blocking reqwest implementation
/// - [`plan`](fetcher::plan): compares the remote's last change to the last import
pub mod fetcher;

/// Pinboard JSON → [`Bookmark`](domain::Bookmark).
pub mod normalizer;

/// Rendering bookmarks and writing them without clobbering.
pub mod pipeline;

/// Filename slugs and stopwords.
pub mod slug;

/// Sync state persistence.
pub mod store;

/// Loading and compiling output templates.
pub mod template;
