pub mod profiles;
pub mod profiling;
pub mod records;
pub mod workspace;

// Re-export commonly used types for convenience.
pub use profiles::{ProfileError, ProfileResult, ProfileStore, StyleProfile};
pub use profiling::{StyleCluster, StyleProfiler};
pub use records::VltRecord;
pub use workspace::{AppConfig, ProfilingSettings};
