//! HTTP handlers, grouped by concern: read-only pages, mutating photo
//! flows, and health probes.

pub mod gallery_handlers;
pub mod health_handlers;
pub mod photo_handlers;
