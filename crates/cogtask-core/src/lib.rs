//! cogtask-core — Assessment document model, decoding, and resource resolution.
//!
//! This crate defines the step-tree data model, the tagged-JSON decoder with
//! its step registry, the resource-resolution pass, and the result records
//! that the rest of the cogtask system builds on.

pub mod decode;
pub mod error;
pub mod model;
pub mod resolve;
pub mod results;
pub mod traits;
