//! Reading domain entities
//!
//! This module defines the two shapes a measurement takes on its way through
//! the pipeline. It has no knowledge of how readings are framed, stored or
//! served.

/// A measurement exactly as the sensor reported it.
///
/// Produced by the frame decoder and consumed immediately by the humidity
/// correction. The temperature is still in the sensor's uncorrected scale.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RawReading {
    /// CO2 concentration in ppm
    pub co2: i32,
    /// Relative humidity in percent, relative to the uncorrected temperature
    pub humidity_percent: i32,
    /// Temperature before the calibration offset is applied
    pub raw_temperature_units: i32,
}

impl RawReading {
    /// Create a raw reading from the three reported integers
    pub const fn new(co2: i32, humidity_percent: i32, raw_temperature_units: i32) -> Self {
        Self {
            co2,
            humidity_percent,
            raw_temperature_units,
        }
    }
}

/// A corrected measurement, the unit kept in history.
///
/// Immutable once constructed: fields are private and only readable.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Reading {
    timestamp_ms: i64,
    co2_ppm: i32,
    temperature_c: f64,
    humidity_percent: f64,
}

impl Reading {
    /// Create a new reading
    pub const fn new(
        timestamp_ms: i64,
        co2_ppm: i32,
        temperature_c: f64,
        humidity_percent: f64,
    ) -> Self {
        Self {
            timestamp_ms,
            co2_ppm,
            temperature_c,
            humidity_percent,
        }
    }

    /// Wall-clock time of ingestion, milliseconds since the Unix epoch
    pub const fn timestamp_ms(&self) -> i64 {
        self.timestamp_ms
    }

    /// CO2 concentration in ppm
    pub const fn co2_ppm(&self) -> i32 {
        self.co2_ppm
    }

    /// Corrected temperature in Celsius
    pub const fn temperature_c(&self) -> f64 {
        self.temperature_c
    }

    /// Corrected relative humidity in percent (not clamped)
    pub const fn humidity_percent(&self) -> f64 {
        self.humidity_percent
    }
}
