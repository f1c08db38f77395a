//! Core domain types

pub mod campaign;

pub use campaign::*;
