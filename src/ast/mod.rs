pub mod block;
pub mod function;
pub mod warning;

pub use block::*;
pub use function::*;
pub use warning::*;
