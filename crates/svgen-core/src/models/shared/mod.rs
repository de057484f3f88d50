//! Shared infrastructure used by every head.
//!
//! Nothing here depends on a specific head.

pub mod device;
pub mod weights;
