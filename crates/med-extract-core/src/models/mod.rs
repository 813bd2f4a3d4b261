//! Domain models for the med-extract system.

mod dictionary;
mod extraction;
mod record;

pub use dictionary::*;
pub use extraction::*;
pub use record::*;
