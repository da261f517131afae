//! Segment Studio - library crate.
//!
//! Provides the form model, job lifecycle, and segmentation-service client
//! for use by the desktop application and tests.

pub mod client;
pub mod image_io;
pub mod job;
pub mod params;
pub mod view;
