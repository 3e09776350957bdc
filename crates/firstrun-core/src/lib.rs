mod descriptor;
mod package;
mod status;

pub use descriptor::{Catalog, CatalogWarning, PackageDescriptor, DEFAULT_ICON};
pub use package::TrackedPackage;
pub use status::InstallStatus;
