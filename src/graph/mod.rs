pub mod kinds;
pub mod model;
pub mod node;

pub use model::*;
pub use node::*;
