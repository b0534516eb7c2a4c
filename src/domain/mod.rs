//! Domain layer - pure logic independent of infrastructure
//!
//! This module contains the reading entities and the humidity correction
//! service. Nothing here does I/O or touches shared state.

pub mod calibration;
pub mod reading;

pub use calibration::{HumidityCorrection, EULER_APPROX};
pub use reading::{RawReading, Reading};
