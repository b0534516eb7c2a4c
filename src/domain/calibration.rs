//! Humidity correction domain service
//!
//! The sensor's temperature channel reads high by a fixed offset, and its
//! humidity channel is relative to that biased temperature. Correcting the
//! temperature alone would leave the relative humidity wrong, so the
//! correction holds absolute humidity constant and re-derives relative
//! humidity at the corrected temperature.

/// Euler's number truncated to the value deployed sensors were calibrated
/// against. Must stay `2.71828`, not `core::f64::consts::E`.
pub const EULER_APPROX: f64 = 2.71828;

/// Humidity correction parameters
///
/// ```text
/// T_c  = T_raw - offset
/// AH   = 216.7 * (RH_raw/100 * 6.112 * e^(17.62*T_raw/(243.12+T_raw))) / (273.15+T_raw)
/// RH_c = AH * (273.15+T_c) / (216.7 * 6.112 * e^(17.62*T_c/(243.12+T_c))) * 100
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HumidityCorrection {
    /// Subtracted from the raw temperature to get degrees Celsius
    pub temperature_offset: f64,
}

impl HumidityCorrection {
    /// UD-CO2S calibration: the temperature channel reads 4.5 degrees high
    pub const UD_CO2S: Self = Self {
        temperature_offset: 4.5,
    };

    // Magnus formula coefficients over water
    const MAGNUS_A: f64 = 6.112;
    const MAGNUS_B: f64 = 17.62;
    const MAGNUS_C: f64 = 243.12;

    const WATER_VAPOUR_CONSTANT: f64 = 216.7;
    const ZERO_CELSIUS_K: f64 = 273.15;

    /// Create a correction with a custom temperature offset
    pub const fn new(temperature_offset: f64) -> Self {
        Self { temperature_offset }
    }

    /// Correct a raw (humidity, temperature) pair.
    ///
    /// Returns `(temperature_c, humidity_percent)`. Nothing is clamped:
    /// humidity may leave `[0, 100]` and degenerate inputs (a corrected
    /// temperature of -243.12) yield non-finite values.
    pub fn correct(&self, raw_humidity_percent: i32, raw_temperature_units: i32) -> (f64, f64) {
        let t_raw = f64::from(raw_temperature_units);
        let t_corrected = t_raw - self.temperature_offset;
        let rh_raw = f64::from(raw_humidity_percent);

        // Operation order is fixed; reordering changes the low bits.
        let absolute = Self::WATER_VAPOUR_CONSTANT
            * (rh_raw / 100.0 * Self::MAGNUS_A * Self::magnus_exp(t_raw))
            / (Self::ZERO_CELSIUS_K + t_raw);

        let humidity = absolute * (Self::ZERO_CELSIUS_K + t_corrected)
            / (Self::WATER_VAPOUR_CONSTANT * Self::MAGNUS_A * Self::magnus_exp(t_corrected))
            * 100.0;

        (t_corrected, humidity)
    }

    #[inline]
    fn magnus_exp(t: f64) -> f64 {
        EULER_APPROX.powf((Self::MAGNUS_B * t) / (Self::MAGNUS_C + t))
    }
}

impl Default for HumidityCorrection {
    fn default() -> Self {
        Self::UD_CO2S
    }
}
