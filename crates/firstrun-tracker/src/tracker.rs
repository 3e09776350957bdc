use firstrun_core::{PackageDescriptor, TrackedPackage};

use crate::aggregate::{AggregateFlags, AggregateState};
use crate::events::{EventBus, LifecycleEvent};
use crate::matcher::LineMatcher;
use crate::registry::PackageRegistry;

/// Owns one provisioning session: the seeded registry, the line matcher, the
/// latched aggregate flags and the subscriber bus. `apply_log_line` takes
/// `&mut self`, so the single-writer contract is enforced by the borrow
/// checker; callers with multiple producers serialize with their own lock
/// around the whole tracker.
#[derive(Debug)]
pub struct InstallTracker {
    matcher: LineMatcher,
    registry: PackageRegistry,
    aggregate: AggregateState,
    bus: EventBus,
}

impl InstallTracker {
    pub fn new(descriptors: &[PackageDescriptor], matcher: LineMatcher) -> Self {
        Self {
            matcher,
            registry: PackageRegistry::seed(descriptors),
            aggregate: AggregateState::new(),
            bus: EventBus::new(),
        }
    }

    pub fn subscribe(&mut self, observer: impl FnMut(LifecycleEvent) + Send + 'static) {
        self.bus.subscribe(observer);
    }

    pub fn subscribe_to(
        &mut self,
        event: LifecycleEvent,
        observer: impl FnMut(LifecycleEvent) + Send + 'static,
    ) {
        self.bus.subscribe_to(event, observer);
    }

    /// Runs match -> mutate -> recompute -> notify to completion for one log
    /// line. Unmatched lines are inert. The returned events are exactly what
    /// the bus dispatched, for callers that poll instead of subscribing.
    pub fn apply_log_line(&mut self, line: &str) -> Vec<LifecycleEvent> {
        let Some(event) = self.matcher.classify(line) else {
            return Vec::new();
        };
        self.registry.apply_event(&event);
        let fired = self.aggregate.observe(self.registry.packages());
        for event in &fired {
            self.bus.publish(*event);
        }
        fired
    }

    pub fn flags(&self) -> AggregateFlags {
        self.aggregate.flags()
    }

    pub fn get(&self, name: &str) -> Option<&TrackedPackage> {
        self.registry.get(name)
    }

    pub fn snapshot(&self) -> Vec<TrackedPackage> {
        self.registry.snapshot()
    }

    pub fn visible(&self) -> Vec<TrackedPackage> {
        self.registry.visible()
    }

    pub fn gating(&self) -> Vec<TrackedPackage> {
        self.registry.gating()
    }
}
