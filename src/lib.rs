//! # Sensiscan
//!
//! Weighted keyword sensitivity scoring for documents and web pages.
//!
//! Sensiscan ingests text from heterogeneous sources — uploaded PDF, Word,
//! spreadsheet, slide, and plain-text documents, or fetched web pages —
//! scans it against a weighted glossary of sensitive terms, and produces a
//! normalized sensitivity score per source and per section (page, sheet, or
//! slide). Callers can suppress known-benign verbatim phrases before
//! scoring.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌───────────────────────────┐   ┌─────────────┐
//! │   Sources    │──▶│        Engine              │──▶│ BatchResult │
//! │ files / URLs │   │ extract → mask → match     │   │ per-source, │
//! └──────────────┘   │        → aggregate         │   │ input order │
//!                    └───────────┬────────────────┘   └─────────────┘
//!                                │
//!                  ┌─────────────┤
//!                  ▼             ▼
//!             ┌─────────┐  ┌──────────┐
//!             │   CLI   │  │   HTTP   │
//!             │(senscan)│  │ (axum)   │
//!             └─────────┘  └──────────┘
//! ```
//!
//! Every source is scored in isolation: extraction and fetch failures are
//! captured into that source's result and never abort the batch.
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`glossary`] | Weighted keyword set, loaded once per process |
//! | [`mask`] | Verbatim ignore-phrase deletion before matching |
//! | [`matcher`] | Case-insensitive multi-pattern keyword matching |
//! | [`score`] | Section scoring and per-document aggregation |
//! | [`extract`] | PDF/DOCX/XLSX/PPTX/TXT section extraction |
//! | [`fetch`] | URL fetching, body text, social post metadata |
//! | [`batch`] | Bounded concurrent batch orchestration |
//! | [`config`] | TOML configuration parsing |
//! | [`server`] | HTTP analysis API |

pub mod batch;
pub mod config;
pub mod extract;
pub mod fetch;
pub mod glossary;
pub mod mask;
pub mod matcher;
pub mod score;
pub mod server;
