//! Task implementations

pub mod completions;

pub mod man;
