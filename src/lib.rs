//! # Clause Harness
//!
//! An LLM-driven pipeline for classifying, analyzing, and comparing legal
//! documents.
//!
//! Clause Harness chunks a document, classifies it into a top-level
//! category by per-chunk plurality vote, runs a category-specific clause
//! extraction workflow, and can compare two documents through a hybrid
//! pipeline that combines a holistic document-level view with granular
//! chunk-level matching.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌────────────┐   ┌─────────────────────────┐
//! │ Chunker  │──▶│ Classifier │──▶│ Category workflows (7)  │
//! └────┬─────┘   └────────────┘   └─────────────────────────┘
//!      │
//!      │         ┌──────────────────────────────────────────┐
//!      └────────▶│ Hybrid comparison                        │
//!                │ holistic → granular → synthesis → prose  │
//!                └──────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! clh classify notice.txt                 # top-level category
//! clh analyze contract.txt --json         # full clause extraction
//! clh compare lease_v1.txt lease_v2.txt   # hybrid comparison report
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types |
//! | [`chunker`] | Overlapping text chunking |
//! | [`gateway`] | LLM gateway abstraction (Gemini, disabled) |
//! | [`parse`] | Structured-output parsing of gateway replies |
//! | [`fanout`] | Bounded-concurrency fan-out |
//! | [`classify`] | Document classification by plurality vote |
//! | [`workflows`] | Per-category clause extraction workflows |
//! | [`metadata`] | Per-chunk metadata extraction |
//! | [`matcher`] | Cross-document chunk-pair scoring |
//! | [`detail`] | Detailed comparison of matched pairs |
//! | [`holistic`] | Document summaries and holistic comparison |
//! | [`hybrid`] | The four-stage comparison orchestrator |
//! | [`analyze`] | The classify/analyze commands |
//! | [`progress`] | Progress reporting on stderr |

pub mod analyze;
pub mod chunker;
pub mod classify;
pub mod config;
pub mod detail;
pub mod fanout;
pub mod gateway;
pub mod holistic;
pub mod hybrid;
pub mod matcher;
pub mod metadata;
pub mod models;
pub mod parse;
pub mod progress;
pub mod workflows;
