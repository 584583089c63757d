//! ```text
//! Front pages ──► discovery ──► article URLs
//!                                    │
//! Article pages ──► extract ──► raw text ──► fragment ──► TextFragment*
//!                                                             │
//! TextFragment* ──► embeddings (batch) ──► index::embed_and_upsert
//!                                                             │
//!                                               deterministic point ids
//!
//! Topic query ──► embeddings (instructed) ──► index::search ──► retrieval
//!                                                                  │
//! RetrievalContext ──► generation (boundary) ──► store (boundary)
//! ```
//!
//! The [`pipeline::Pipeline`] orchestrator sequences ingestion over every
//! configured source section, then drives topic discovery, retrieval, and
//! article generation with bounded retries and skip-on-failure semantics.

pub mod config;
pub mod discovery;
pub mod embeddings;
pub mod extract;
pub mod fragment;
pub mod generation;
pub mod index;
pub mod pipeline;
pub mod retrieval;
pub mod retry;
pub mod store;
pub mod types;

pub use embeddings::{EmbeddingProvider, HttpEmbeddingClient, MockEmbeddingProvider};
pub use index::{IndexOutcome, VectorIndex};
pub use pipeline::{Pipeline, RunReport};
pub use retrieval::retrieve_context;
pub use types::{Category, GeneratedArticle, PipelineError, TextFragment};
