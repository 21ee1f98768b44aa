//! Schema lookup: field types and title resolution.
//!
//! The unflattening core only depends on the [`SchemaLookup`] trait;
//! [`SchemaIndex`] is the bundled implementation, built by walking a
//! JSON-Schema-like document (`properties`/`items`/`type`/`title`).

pub mod index;

pub use index::{SchemaIndex, SchemaLookup};
