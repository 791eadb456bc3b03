//! Field arithmetic primitives for the commitment engine.
//! Contains the concrete prime-field implementation used by every tree node.

pub mod element;

pub use element::{FieldDeserializeError, FieldElement, FIELD_SIZE};
