//! HTTP handlers for the web UI

pub mod dashboard;
