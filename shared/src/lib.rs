pub mod ordered_set;
pub mod protocol;
pub mod types;

pub use ordered_set::OrderedSet;
