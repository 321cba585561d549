//! Helios core - shared contracts between the dispatcher and renderers.
//!
//! This crate provides:
//!
//! - **Raster types**: `Rgb8`, `RasterBuffer` with disjoint row hand-out
//! - **Render options**: the capability flags a renderer honors
//! - **Counters**: per-worker statistics contributions
//! - **Trait seams**: `ImageFunction`, `RowRenderer`, `WorkerFactory`
//!
//! The dispatcher never sees a concrete renderer; it drives any
//! `RowRenderer` a `WorkerFactory` hands it.

pub mod color;
pub mod counters;
pub mod options;
pub mod raster;
pub mod sample;
pub mod traits;

pub use color::{color_to_rgb8, linear_to_gamma, Color, Rgb8};
pub use counters::WorkerCounters;
pub use options::RenderOptions;
pub use raster::RasterBuffer;
pub use sample::PointSample;
pub use traits::{ImageFunction, RenderFault, RowRenderer, WorkerFactory};
