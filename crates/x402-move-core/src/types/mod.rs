//! Core types used across the X402 Move crates.

mod amount;
mod common;
mod type_tag;

pub use amount::*;
pub use common::*;
pub use type_tag::*;
