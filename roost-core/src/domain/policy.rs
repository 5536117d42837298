//! Scheduling policy selection

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

/// Dispatch policy a node scheduler runs with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchedulingPolicy {
    /// Lowest priority class first, FIFO within a class
    Priority,

    /// Rotating turns across tenants, FIFO within a tenant
    RoundRobin,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown scheduling policy: {0}")]
pub struct PolicyParseError(pub String);

impl FromStr for SchedulingPolicy {
    type Err = PolicyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "priority" => Ok(SchedulingPolicy::Priority),
            "round_robin" | "round-robin" | "roundrobin" => Ok(SchedulingPolicy::RoundRobin),
            _ => Err(PolicyParseError(s.to_string())),
        }
    }
}

impl std::fmt::Display for SchedulingPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SchedulingPolicy::Priority => write!(f, "priority"),
            SchedulingPolicy::RoundRobin => write!(f, "round_robin"),
        }
    }
}
