//! # TERRAFIELD Shared
//!
//! Common types used by the procedural core and its consumers.
//!
//! ## RULE
//!
//! This crate must NEVER depend on terrain, grid, or entity code.
//! If a type needs to know what a cell is, it belongs in
//! `terrafield_procedural`.

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]

pub mod math;

pub use math::{Rgb, Vec2};
