//! Roost Core
//!
//! Core types shared by the Roost node-local task scheduler.
//!
//! This crate contains:
//! - Domain types: task reservations, tenant identity, scheduling policies
//! - DTOs: messages exchanged with the transport layer

pub mod domain;
pub mod dto;
