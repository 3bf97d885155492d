//! Service layer
//!
//! Services contain the business logic of the worker. The render service
//! drives one job through the renderer and the transcoder and leaves the
//! filesystem clean afterwards.
//!
//! Services are trait-based so the scheduler can be tested without
//! spawning real processes.

mod artifacts;
mod render;

pub use render::{RenderResult, RenderService, StandardRenderService};
