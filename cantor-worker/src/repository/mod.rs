//! Repository layer
//!
//! Repositories abstract the worker's external collaborators: the job store
//! and the performance service. They provide small, focused interfaces
//! without any business logic.
//!
//! All repositories are trait-based to enable testing and mocking.

mod jobs;
mod performances;

// Re-export traits
pub use jobs::JobStore;
pub use performances::PerformanceNotifier;

// Re-export implementations
pub use jobs::HttpJobStore;
pub use performances::HttpPerformanceNotifier;
