//! Breadcrumb trail domain.

pub mod model;

pub use model::{BreadcrumbEntry, BreadcrumbList};
