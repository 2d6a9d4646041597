mod catalog;
mod index;

pub use catalog::{load_catalog, parse_catalog, PolicyRecord};
pub use index::{PolicyDetails, PolicyIndex, PolicyMatch};
