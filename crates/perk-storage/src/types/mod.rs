//! Type definitions for perk storage.

mod ids;
mod profile;

pub use ids::*;
pub use profile::*;
