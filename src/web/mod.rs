//! Browser bindings for the engine's seams.

pub mod exports;
pub mod fetch;
pub mod page;
pub mod storage;
pub mod timer;
