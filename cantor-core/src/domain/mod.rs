//! Core domain types
//!
//! This module contains the core domain structures used across Cantor services.
//! They mirror the records held by the job store and are shared between the
//! worker (which drives jobs to completion) and the CLI (which inspects them).

pub mod job;
pub mod recording;
pub mod task;
