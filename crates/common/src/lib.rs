//! Common utilities and types shared across Feather crates.

#![warn(clippy::pedantic)]

/// Module for logging configuration
pub mod config;

/// Module for secret types that prevent accidental logging
pub mod secret;

/// Module for compact token and PEM utilities
pub mod jwt;
