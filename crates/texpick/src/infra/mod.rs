//! Infrastructure adapters for config, logging, terminal rendering, and external programs.

pub mod clipboard;
pub mod config;
pub mod highlight;
pub mod logging;
pub mod viewer;
