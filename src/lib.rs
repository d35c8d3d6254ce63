//! # Quizsmith
//!
//! Content ingestion and structured-output repair for AI quiz generation.
//!
//! The pure pipeline lives in [`quizsmith_core`]; this crate adds the
//! pieces that touch the outside world: configuration, logging, PDF and
//! HTTP extraction, a `scraper`-based readability extractor, and an
//! OpenAI-compatible LLM client.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//! │   Sources    │──▶│  Normalizer  │──▶│  Summarizer  │──▶ JSON
//! │ page/url/pdf │   │ clean+chunk  │   │  per chunk   │
//! └──────────────┘   └──────────────┘   └──────────────┘
//!
//! completion ──▶ recover ──▶ transform ──▶ validate ──▶ quiz JSON
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`logging`] | `tracing` subscriber setup |
//! | [`extract`] | PDF text and page fetching |
//! | [`readability`] | Main-content extraction |
//! | [`llm`] | Chat-completions summarizer and JSON repairer |
//! | [`ingest`] | `qsmith ingest` orchestration |
//! | [`repair_cmd`] | `qsmith repair` orchestration |
//! | [`progress`] | Progress reporting on stderr |

pub mod config;
pub mod extract;
pub mod ingest;
pub mod llm;
pub mod logging;
pub mod progress;
pub mod readability;
pub mod repair_cmd;
