//! Core domain types
//!
//! These types describe a task reservation as it flows from the transport
//! layer, through a node scheduler, to the executor.

pub mod policy;
pub mod task;
