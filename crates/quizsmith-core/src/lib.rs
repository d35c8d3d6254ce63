//! # Quizsmith Core
//!
//! Pure ingestion and repair logic for Quizsmith: source normalization,
//! cleaning, chunking, sequential summarization, JSON recovery, and quiz
//! schema repair and validation.
//!
//! Network access, PDF parsing, and model backends live in the `quizsmith`
//! application crate and reach this crate through the
//! [`source::ReadabilityExtractor`], [`summarize::SummarizerSession`], and
//! [`recover::JsonRepairer`] traits.

pub mod chunk;
pub mod clean;
pub mod html;
pub mod models;
pub mod quiz;
pub mod recover;
pub mod repair;
pub mod source;
pub mod summarize;
