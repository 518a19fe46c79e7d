//! Gazette Ingest: input checks, page assembly, article segmentation,
//! metadata extraction.

pub mod assemble;
pub mod extract;
pub mod file;
pub mod segment;
pub mod structure;

pub use assemble::{assemble, AssembledPage};
pub use extract::{ArticleMetadata, MetadataExtractor};
pub use file::{classify, Classification};
pub use segment::{ArticleDraft, ArticleSegmenter, WholePageSegmenter, UNKNOWN_TITLE};
