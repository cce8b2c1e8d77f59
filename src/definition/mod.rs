pub mod conversion;
pub mod document;

pub use conversion::*;
pub use document::*;
