//! Long-lived collaborators behind the HTTP handlers: blob storage, the
//! picture catalog, and the vision gateway. Each is constructed once at
//! startup and shared through the application state.

pub mod catalog_service;
pub mod storage_service;
pub mod vision_service;
