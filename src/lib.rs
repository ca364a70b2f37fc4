//! # DocQA
//!
//! A multi-tenant document Q&A service with keyword retrieval and LLM-backed
//! answers.
//!
//! Users are registered and approved by an admin, upload PDF/TXT documents
//! into optional workspaces, and ask natural-language questions. Each
//! question is answered by an external completion service over a retrieval
//! step: documents are split into overlapping word-window chunks, chunks are
//! scored by stop-word-filtered lexical overlap with the question, and the
//! top-K chunks across the scope become the prompt context and the citation
//! list.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌───────────────────┐   ┌───────────────┐
//! │ Upload   │──▶│ Extract (PDF/TXT) │──▶│    SQLite     │
//! └──────────┘   └───────────────────┘   │ users/docs/ws │
//!                                        └──────┬────────┘
//!                        ask ──────────────────▶│
//!                                               ▼
//!                              ┌───────────────────────────┐
//!                              │ chunk → score → top-K     │
//!                              └──────┬──────────┬─────────┘
//!                                     ▼          ▼
//!                              completion     citations
//!                              (fallback)
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! dqa init                                   # create database
//! dqa user add alice@example.com             # register (pending approval)
//! dqa user approve alice@example.com         # admin approval
//! dqa upload report.pdf --user alice@example.com
//! dqa ask "what were the Q3 findings?" --user alice@example.com
//! dqa serve                                  # start the JSON API
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types |
//! | [`chunk`] | Overlapping word-window chunking |
//! | [`score`] | Lexical relevance scoring |
//! | [`retrieve`] | Cross-document top-K selection |
//! | [`extract`] | PDF/TXT text extraction |
//! | [`ask`] | Question-answering pipeline |
//! | [`completion`] | Completion client with model fallback |
//! | [`websearch`] | Optional web search blending |
//! | [`server`] | JSON HTTP API |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema migrations |

pub mod ask;
pub mod chunk;
pub mod completion;
pub mod config;
pub mod db;
pub mod docs;
pub mod extract;
pub mod migrate;
pub mod models;
pub mod retrieve;
pub mod score;
pub mod server;
pub mod upload;
pub mod users;
pub mod websearch;
pub mod workspace;
