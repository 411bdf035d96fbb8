//! Application layer orchestrating domain logic and infrastructure.

pub mod assemble;
pub mod compile;
pub mod extract;
pub mod naming;
pub mod rasterize;
pub mod selection;
pub mod session;
