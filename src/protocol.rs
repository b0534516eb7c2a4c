//! Wire formats at both edges of the pipeline
//!
//! Inbound, the sensor emits one text frame per line:
//!
//! ```text
//! CO2=800,HUM=45,TMP=22
//! ```
//!
//! Outbound, readings are served as JSON objects with the field names
//! dashboards already consume (`date`, `co2ppm`, `temperature`, `humidity`).

use std::borrow::Cow;

use serde::Serialize;

use crate::domain::{RawReading, Reading};

/// Literal prefix of a CO2 telemetry frame
pub const FRAME_PREFIX: &str = "CO2";

/// Fields past this many are ignored
pub const MAX_FRAME_FIELDS: usize = 3;

// ============================================================================
// Inbound frames
// ============================================================================

/// Keys carried by a telemetry frame
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameKey {
    /// CO2 concentration (ppm)
    Co2,
    /// Relative humidity (%)
    Hum,
    /// Raw temperature
    Tmp,
}

impl FrameKey {
    /// Map a key as it appears on the wire
    pub fn from_wire(key: &str) -> Option<Self> {
        match key {
            "CO2" => Some(FrameKey::Co2),
            "HUM" => Some(FrameKey::Hum),
            "TMP" => Some(FrameKey::Tmp),
            _ => None,
        }
    }

    fn slot(self) -> usize {
        match self {
            FrameKey::Co2 => 0,
            FrameKey::Hum => 1,
            FrameKey::Tmp => 2,
        }
    }
}

/// Decode one frame into a raw reading.
///
/// Returns `None` for frames of another message class (no `CO2` prefix) and
/// for frames missing a required field or carrying a non-integer value.
/// A partially populated reading is never produced.
pub fn decode_frame(bytes: &[u8]) -> Option<RawReading> {
    let text: Cow<'_, str> = String::from_utf8_lossy(bytes);
    let message = text.trim();

    if !message.starts_with(FRAME_PREFIX) {
        return None;
    }

    let mut values: [Option<&str>; 3] = [None; 3];

    for field in message.split(',').take(MAX_FRAME_FIELDS) {
        let Some((key, value)) = field.split_once('=') else {
            continue;
        };
        if let Some(key) = FrameKey::from_wire(key) {
            let slot = &mut values[key.slot()];
            // First occurrence wins
            if slot.is_none() {
                *slot = Some(value);
            }
        }
    }

    let [co2, hum, tmp] = values;
    Some(RawReading::new(
        parse_int(co2?)?,
        parse_int(hum?)?,
        parse_int(tmp?)?,
    ))
}

fn parse_int(value: &str) -> Option<i32> {
    value.trim().parse::<i32>().ok()
}

// ============================================================================
// Outbound JSON
// ============================================================================

/// A reading as served to query clients
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ReadingJson {
    /// Milliseconds since the Unix epoch
    pub date: i64,
    /// CO2 concentration in ppm
    pub co2ppm: i32,
    /// Corrected temperature in Celsius (`null` if not finite)
    pub temperature: Option<f64>,
    /// Corrected relative humidity in percent (`null` if not finite)
    pub humidity: Option<f64>,
}

impl From<&Reading> for ReadingJson {
    fn from(reading: &Reading) -> Self {
        Self {
            date: reading.timestamp_ms(),
            co2ppm: reading.co2_ppm(),
            temperature: finite(reading.temperature_c()),
            humidity: finite(reading.humidity_percent()),
        }
    }
}

fn finite(value: f64) -> Option<f64> {
    value.is_finite().then_some(value)
}

/// Body of every 404 response
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct NotFound {
    pub status: u16,
}

impl NotFound {
    pub const BODY: Self = Self { status: 404 };
}
