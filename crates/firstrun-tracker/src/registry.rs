use firstrun_core::{PackageDescriptor, TrackedPackage};
use tracing::debug;

use crate::matcher::MatchedEvent;

/// The authoritative name-keyed collection of tracked packages. Order is
/// catalog declaration order, then log discovery order. At most one entry
/// exists per name; events mutate the existing entry rather than replacing
/// it.
#[derive(Debug, Clone, Default)]
pub struct PackageRegistry {
    packages: Vec<TrackedPackage>,
}

impl PackageRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed(descriptors: &[PackageDescriptor]) -> Self {
        let mut registry = Self::default();
        for descriptor in descriptors {
            if registry.get(&descriptor.name).is_some() {
                debug!(name = %descriptor.name, "skipping duplicate catalog descriptor");
                continue;
            }
            registry
                .packages
                .push(TrackedPackage::from_descriptor(descriptor));
        }
        registry
    }

    pub fn apply_event(&mut self, event: &MatchedEvent) {
        let version = (!event.version.is_empty()).then_some(event.version.as_str());
        match self
            .packages
            .iter_mut()
            .find(|package| package.name == event.name)
        {
            Some(package) => {
                debug!(
                    name = %event.name,
                    status = event.status.as_str(),
                    "applying log event to tracked package"
                );
                package.apply(event.status, version);
            }
            None => {
                debug!(
                    name = %event.name,
                    status = event.status.as_str(),
                    "log reported a package the catalog did not declare"
                );
                self.packages.push(TrackedPackage::discovered(
                    &event.name,
                    version.map(str::to_string),
                    event.status,
                ));
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&TrackedPackage> {
        self.packages.iter().find(|package| package.name == name)
    }

    pub fn packages(&self) -> &[TrackedPackage] {
        &self.packages
    }

    pub fn snapshot(&self) -> Vec<TrackedPackage> {
        self.packages.to_vec()
    }

    /// The entries the presentation layer lists.
    pub fn visible(&self) -> Vec<TrackedPackage> {
        self.packages
            .iter()
            .filter(|package| package.visible_in_ui)
            .cloned()
            .collect()
    }

    /// The entries whose completion gates the continue action.
    pub fn gating(&self) -> Vec<TrackedPackage> {
        self.packages
            .iter()
            .filter(|package| package.required_for_continue)
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }
}
