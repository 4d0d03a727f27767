//! Route table assembly.

pub mod routes;
