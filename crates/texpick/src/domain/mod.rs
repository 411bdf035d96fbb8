//! Core domain types shared by the application and UI layers.

pub mod errors;
pub mod labels;
pub mod model;
