use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::status::InstallStatus;

pub const DEFAULT_ICON: &str = "folder.png";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageDescriptor {
    pub name: String,
    pub display_name: String,
    pub description: String,
    pub icon: String,
    pub status_icons: BTreeMap<InstallStatus, String>,
    pub can_continue: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogWarning {
    MissingName { index: usize },
    DuplicateName { name: String },
    MissingField { package: String, field: &'static str },
    UnknownStatusIcon { package: String, key: String },
}

impl fmt::Display for CatalogWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingName { index } => {
                write!(f, "catalog entry #{index} has no name and was dropped")
            }
            Self::DuplicateName { name } => {
                write!(f, "catalog declares '{name}' more than once; later entries dropped")
            }
            Self::MissingField { package, field } => {
                write!(f, "package '{package}' has no '{field}'; using default")
            }
            Self::UnknownStatusIcon { package, key } => {
                write!(f, "package '{package}' maps status icon for unknown status '{key}'")
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawCatalog {
    #[serde(default)]
    packages: Vec<RawPackageEntry>,
}

#[derive(Debug, Deserialize)]
struct RawPackageEntry {
    name: Option<String>,
    display_name: Option<String>,
    description: Option<String>,
    icon: Option<String>,
    #[serde(default)]
    status_icons: BTreeMap<String, String>,
    can_continue: Option<bool>,
}

#[derive(Debug, Clone, Default)]
pub struct Catalog {
    pub packages: Vec<PackageDescriptor>,
    pub warnings: Vec<CatalogWarning>,
}

impl Catalog {
    pub fn from_path(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read catalog file: {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("failed to load catalog file: {}", path.display()))
    }

    pub fn from_toml_str(input: &str) -> Result<Self> {
        let raw: RawCatalog = toml::from_str(input).context("failed to parse catalog")?;

        let mut catalog = Self::default();
        for (index, entry) in raw.packages.into_iter().enumerate() {
            let Some(name) = entry.name.clone().filter(|name| !name.is_empty()) else {
                warn!(index, "dropping catalog entry without a name");
                catalog.warnings.push(CatalogWarning::MissingName { index });
                continue;
            };
            if catalog.packages.iter().any(|existing| existing.name == name) {
                warn!(name = %name, "dropping duplicate catalog entry");
                catalog.warnings.push(CatalogWarning::DuplicateName { name });
                continue;
            }
            let descriptor = catalog.fill_defaults(&name, entry);
            catalog.packages.push(descriptor);
        }
        Ok(catalog)
    }

    fn fill_defaults(&mut self, name: &str, entry: RawPackageEntry) -> PackageDescriptor {
        let display_name = self.field_or_default(name, "display_name", entry.display_name, || {
            name.to_string()
        });
        let description =
            self.field_or_default(name, "description", entry.description, String::new);
        let icon = self.field_or_default(name, "icon", entry.icon, || DEFAULT_ICON.to_string());

        let mut status_icons = BTreeMap::new();
        for (key, path) in entry.status_icons {
            match InstallStatus::parse(&key) {
                Some(status) => {
                    status_icons.insert(status, path);
                }
                None => {
                    debug!(package = name, key = %key, "ignoring status icon for unknown status");
                    self.warnings.push(CatalogWarning::UnknownStatusIcon {
                        package: name.to_string(),
                        key,
                    });
                }
            }
        }

        let can_continue = match entry.can_continue {
            Some(value) => value,
            None => {
                debug!(package = name, "catalog entry has no can_continue; defaulting to true");
                self.warnings.push(CatalogWarning::MissingField {
                    package: name.to_string(),
                    field: "can_continue",
                });
                true
            }
        };

        PackageDescriptor {
            name: name.to_string(),
            display_name,
            description,
            icon,
            status_icons,
            can_continue,
        }
    }

    fn field_or_default(
        &mut self,
        package: &str,
        field: &'static str,
        value: Option<String>,
        default: impl FnOnce() -> String,
    ) -> String {
        match value {
            Some(value) => value,
            None => {
                debug!(package, field, "catalog field absent; using default");
                self.warnings.push(CatalogWarning::MissingField {
                    package: package.to_string(),
                    field,
                });
                default()
            }
        }
    }
}
