//! Wire-level types shared by the quiz client crates.

pub mod domain;
pub mod error;
pub mod protocol;
