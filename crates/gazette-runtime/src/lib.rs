//! Runtime: the pipeline context and document processing.
//!
//! `PipelineContext` is built once at startup (engines, dictionary), shared
//! read-only by every request, and shut down explicitly. Each
//! `process_document` call runs its pages strictly in order and commits each
//! page's articles before moving to the next.

pub mod pipeline;

pub use pipeline::PipelineContext;
