//! # netrag
//!
//! netrag answers natural-language questions about a network fleet by
//! fusing three sources of evidence: a vector-indexed knowledge corpus,
//! live structured device records with quality assessment, and an LLM for
//! the final prose.
//!
//! This crate is the assembly point: configuration, the LLM client, the
//! data source adapters, the schema-aware context builder, the query
//! orchestrator, and the MCP tool surface that external chat agents call.
//!
//! ## Usage
//!
//! ```bash
//! # Answer a single question
//! netrag query "How many FTTH OLTs are there?"
//!
//! # Serve the MCP tools over stdio
//! netrag serve
//! ```

pub mod commands;
pub mod config;
pub mod context;
pub mod corpus;
pub mod format;
pub mod llm;
pub mod mcp;
pub mod orchestrator;
pub mod source;

pub use config::AppConfig;
pub use orchestrator::{Orchestrator, QueryFlags};
