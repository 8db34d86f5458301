//! Demo Fixtures - deterministic synthetic training data for demo mode
//!
//! Generates a year of plausible activities, daily wellness metrics and sensor
//! streams from a reference date. Every value is derived from seeded random streams,
//! so the same reference date always yields byte-identical data:
//! rest day → template → effort → route → zones/skyline → load fold → wellness.
//!
//! ## Modules
//!
//! - **Repository**: [`FixtureRepository`] builds the dataset once and serves queries
//! - **Generators**: load simulation, template selection, routes, streams, intervals
//! - **Codec**: zone breakdowns packed into the base64 skyline payload

pub mod config;
pub mod error;
pub mod intervals;
pub mod load;
pub mod prefs;
pub mod random;
pub mod repository;
pub mod routes;
pub mod skyline;
pub mod streams;
pub mod templates;
pub mod types;
pub mod wire;
pub mod zones;

// FFI bindings for C interop (always available for cdylib/staticlib builds)
pub mod ffi;

pub use config::{AthleteProfile, FixtureConfig};
pub use error::FixtureError;
pub use load::{LoadState, TrainingLoadSimulator};
pub use random::RandomStream;
pub use repository::FixtureRepository;
pub use routes::{RouteAssigner, RouteTemplate};
pub use templates::{ActivityTemplate, TemplateSelector};
pub use types::{
    Activity, ActivityType, ApiStream, DateRange, Interval, IntervalGroup, IntervalsReport,
    StreamSet, Wellness, ZoneTime,
};

/// Library version
pub const FIXTURES_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name reported by the CLI
pub const PRODUCER_NAME: &str = "demo-fixtures";
