use firstrun_core::{InstallStatus, TrackedPackage};
use serde::Serialize;
use tracing::debug;

use crate::events::LifecycleEvent;

/// The four session-wide derived booleans. `compute` gives the instantaneous
/// view of a package set; `AggregateState` latches them so each one flips to
/// true at most once per session.
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
pub struct AggregateFlags {
    pub any_failure: bool,
    pub required_complete: bool,
    pub all_complete: bool,
    pub all_succeeded: bool,
}

impl AggregateFlags {
    pub fn compute(packages: &[TrackedPackage]) -> Self {
        if packages.is_empty() {
            return Self::default();
        }
        Self {
            any_failure: packages
                .iter()
                .any(|package| package.status == InstallStatus::Failed),
            required_complete: packages
                .iter()
                .filter(|package| package.required_for_continue)
                .all(|package| package.status.is_complete()),
            all_complete: packages.iter().all(|package| package.status.is_complete()),
            all_succeeded: packages
                .iter()
                .all(|package| package.status == InstallStatus::Success),
        }
    }
}

#[derive(Debug, Default)]
pub struct AggregateState {
    latched: AggregateFlags,
}

impl AggregateState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recomputes the flags over the full package set and returns the ones
    /// that flipped on this evaluation, in emission order. Latched flags
    /// never reset, so a flag flips here at most once per session even if
    /// the instantaneous condition later stops holding (a retry can take a
    /// completed package back to installing).
    pub fn observe(&mut self, packages: &[TrackedPackage]) -> Vec<LifecycleEvent> {
        let current = AggregateFlags::compute(packages);
        let mut fired = Vec::new();

        if current.any_failure && !self.latched.any_failure {
            self.latched.any_failure = true;
            fired.push(LifecycleEvent::ErrorWhileInstalling);
        }
        if current.required_complete && !self.latched.required_complete {
            self.latched.required_complete = true;
            fired.push(LifecycleEvent::CanContinue);
        }
        if current.all_complete && !self.latched.all_complete {
            self.latched.all_complete = true;
            fired.push(LifecycleEvent::DoneInstalling);
        }
        if current.all_succeeded && !self.latched.all_succeeded {
            self.latched.all_succeeded = true;
            fired.push(LifecycleEvent::AllSuccess);
        }

        for event in &fired {
            debug!(event = event.as_str(), "aggregate flag flipped");
        }
        fired
    }

    pub fn flags(&self) -> AggregateFlags {
        self.latched
    }
}
