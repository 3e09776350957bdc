use std::collections::BTreeMap;

use serde::Serialize;

use crate::descriptor::{PackageDescriptor, DEFAULT_ICON};
use crate::status::InstallStatus;

/// Live record for one package over a provisioning session. Entries are
/// mutated in place, never replaced: observers may hold the name as a key
/// across updates.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct TrackedPackage {
    pub name: String,
    pub version: Option<String>,
    pub status: InstallStatus,
    pub display_name: String,
    pub description: String,
    pub icon: String,
    pub status_icons: BTreeMap<InstallStatus, String>,
    pub required_for_continue: bool,
    pub visible_in_ui: bool,
}

impl TrackedPackage {
    pub fn from_descriptor(descriptor: &PackageDescriptor) -> Self {
        Self {
            name: descriptor.name.clone(),
            version: None,
            status: InstallStatus::Pending,
            display_name: descriptor.display_name.clone(),
            description: descriptor.description.clone(),
            icon: descriptor.icon.clone(),
            status_icons: descriptor.status_icons.clone(),
            required_for_continue: descriptor.can_continue,
            visible_in_ui: true,
        }
    }

    /// A package the log reported but the catalog never declared. It still
    /// gates completion, but is not shown to the user.
    pub fn discovered(
        name: impl Into<String>,
        version: Option<String>,
        status: InstallStatus,
    ) -> Self {
        let name = name.into();
        Self {
            display_name: name.clone(),
            name,
            version,
            status,
            description: String::new(),
            icon: DEFAULT_ICON.to_string(),
            status_icons: BTreeMap::new(),
            required_for_continue: true,
            visible_in_ui: false,
        }
    }

    /// Applies one matched log event. The log is authoritative for status,
    /// including a later line moving a failed package back to installing.
    /// The version is set once from the first non-empty capture and never
    /// overwritten afterwards.
    pub fn apply(&mut self, status: InstallStatus, version: Option<&str>) {
        self.status = status;
        if self.version.is_none() {
            if let Some(version) = version.filter(|version| !version.is_empty()) {
                self.version = Some(version.to_string());
            }
        }
    }

    pub fn icon_for_status(&self) -> &str {
        self.status_icons
            .get(&self.status)
            .map(String::as_str)
            .unwrap_or(&self.icon)
    }

    pub fn is_complete(&self) -> bool {
        self.status.is_complete()
    }
}
