//! Service layer
//!
//! Services sit between the transport layer and the scheduler. They map
//! transport messages onto scheduler calls and add node-level context to
//! any fault.

mod node_monitor;

pub use node_monitor::NodeMonitor;
