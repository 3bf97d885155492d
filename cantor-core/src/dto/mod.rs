//! Data Transfer Objects for inter-service communication
//!
//! This module contains DTOs used for communication between the worker, the
//! job store and the performance service. DTOs are lightweight request bodies
//! optimized for network transfer.

pub mod job;
pub mod performance;
pub mod recording;
