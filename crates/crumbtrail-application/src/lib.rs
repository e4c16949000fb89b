//! Breadcrumb use cases: catalog resolution, trail reconciliation and the
//! panel that displays the result.

pub mod directory;
pub mod presentation;
pub mod reconciler;

pub use directory::{Catalog, DirectoryResolver};
pub use presentation::{BreadcrumbLink, BreadcrumbPanel};
pub use reconciler::{BreadcrumbReconciler, NavigationTarget, ReconcilerState};
