pub mod departments;
pub mod parser;
pub mod prereq;
pub mod source;
pub mod types;

pub use parser::CatalogParser;
pub use prereq::{PrerequisiteExtractor, PrerequisiteInfo};
pub use source::{CatalogSource, DepartmentPage, HttpCatalogSource};
pub use types::{College, ContentBlock, CourseRecord};
