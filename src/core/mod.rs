//! Core business logic module

pub mod capabilities;
pub mod channel;
pub mod coordinator;
pub mod error;
pub mod normalizer;
pub mod types;
