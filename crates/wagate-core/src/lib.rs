//! # wagate-core
//!
//! Core types, traits, configuration, and error handling for the wagate
//! HTTP send gateway.

pub mod config;
pub mod error;
pub mod message;
pub mod recipient;
pub mod session;
pub mod traits;
