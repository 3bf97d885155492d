//! Cantor Core
//!
//! Core types and abstractions for the Cantor render pipeline.
//!
//! This crate contains:
//! - Domain types: Core business entities (Job, RenderTask, Recording)
//! - DTOs: Data transfer objects exchanged with the job store and the performance service
//! - Score: The render input document and its boundary validator

pub mod domain;
pub mod dto;
pub mod score;
