//! Observability for the Feather client.
//!
//! The library only records through the `metrics` and `tracing` facades; the
//! host application installs whatever exporter and subscriber it wants.

pub mod metrics;
