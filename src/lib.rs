//! Fault location, isolation and service restoration (FLISR) for radial
//! distribution feeders.
//!
//! A fault event recorded by telemetry carries the arrival times of the fault
//! transient at both ends of the faulted line. [`flisr::FlisrWorkflow`] turns it
//! into a distance estimate, isolates the segment, backfeeds downstream zones
//! through a normally-open tie where one exists, and persists the result
//! atomically through a [`repo::GridStore`].

pub mod api;
pub mod auth;
pub mod commands;
pub mod config;
pub mod controller;
pub mod domain;
pub mod flisr;
pub mod repo;
pub mod telemetry;
