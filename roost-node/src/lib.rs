//! Roost Node
//!
//! Node-local admission and dispatch for a distributed task scheduler.
//!
//! Architecture:
//! - Configuration: node identity, slot count and policy from the environment
//! - Scheduler: decides which queued reservation gets the next free slot
//! - Launcher: non-blocking hand-off of runnable tasks to the executor
//! - Services: the node monitor facade the transport layer calls into

pub mod config;
pub mod launcher;
pub mod scheduler;
pub mod service;
