pub mod catalog;
pub mod query;
pub mod translation;

pub use catalog::*;
pub use query::*;
pub use translation::*;
