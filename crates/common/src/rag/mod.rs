//! Retrieval-augmented question answering
//!
//! - `index`: flat cosine-similarity index over embedded passages, persisted
//!   as a single file and reloadable by path
//! - `qa`: retrieve top-k passages, build a source-labelled context, ask the
//!   model

mod index;
mod qa;

pub use index::{IndexManifest, Passage, Retriever, ScoredPassage, VectorIndex};
pub use qa::{build_prompt, format_context, QaAnswer, QaPipeline, QA_TEMPLATE};
