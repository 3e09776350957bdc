mod aggregate;
mod events;
mod matcher;
mod registry;
mod tracker;

pub use aggregate::{AggregateFlags, AggregateState};
pub use events::{EventBus, LifecycleEvent};
pub use matcher::{LineMatcher, MatchRule, MatchedEvent};
pub use registry::PackageRegistry;
pub use tracker::InstallTracker;

#[cfg(test)]
mod tests;
