//! Data Transfer Objects for the transport boundary
//!
//! The transport layer hands these to a node monitor and reads replies back.

pub mod reservation;
