//! CLI command implementations
//!
//! This module contains all CLI command implementations.

pub mod init;
pub mod resource;
pub mod terminology;
pub mod validate;
