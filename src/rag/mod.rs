pub mod context_builder;
pub mod engine;
pub mod enhancer;
pub mod retriever;
pub mod sqlite;
pub mod store;

pub use context_builder::PromptAssembler;
pub use engine::RagEngine;
pub use enhancer::QueryEnhancer;
pub use retriever::{RetrievedDoc, Retriever};
pub use sqlite::SqliteCourseStore;
pub use store::{CourseStore, SearchHit};
