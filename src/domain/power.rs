// Power gauge domain models and display formatting
use serde::Serialize;

/// Grid flows at or below this magnitude (watts) are shown as zero.
pub const GRID_DISPLAY_THRESHOLD_W: f64 = 80.0;

/// Instantaneous meter values in watts.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MeterReading {
    pub solar: f64,
    pub house: f64,
    pub battery: f64,
    pub grid: f64,
    pub wallbox: f64,
}

/// Colour hint for a signed flow: `Good` is export/charging, `Bad` is
/// import/discharging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Neutral,
    Good,
    Bad,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PowerGauges {
    pub solar: String,
    pub house: String,
    pub battery: String,
    pub battery_trend: Trend,
    pub grid: String,
    pub grid_trend: Trend,
    pub wallbox: String,
    pub battery_level: String,
}

impl PowerGauges {
    pub fn unknown(label: &str) -> Self {
        Self {
            solar: label.to_string(),
            house: label.to_string(),
            battery: label.to_string(),
            battery_trend: Trend::Neutral,
            grid: label.to_string(),
            grid_trend: Trend::Neutral,
            wallbox: label.to_string(),
            battery_level: label.to_string(),
        }
    }

    /// Overwrites the meter fields, leaving the battery level untouched.
    pub fn apply_reading(&mut self, reading: &MeterReading) {
        self.solar = format_kw(reading.solar);
        self.house = format_kw(reading.house);
        self.battery = format_kw(reading.battery);
        self.battery_trend = if reading.battery < 0.0 {
            Trend::Good
        } else {
            Trend::Bad
        };
        let (grid, grid_trend) = grid_display(reading.grid);
        self.grid = grid;
        self.grid_trend = grid_trend;
        self.wallbox = format_kw(reading.wallbox);
    }

    pub fn clear_reading(&mut self, label: &str) {
        let battery_level = std::mem::take(&mut self.battery_level);
        *self = Self::unknown(label);
        self.battery_level = battery_level;
    }
}

pub fn grid_display(watts: f64) -> (String, Trend) {
    if watts.abs() > GRID_DISPLAY_THRESHOLD_W {
        let trend = if watts < 0.0 { Trend::Good } else { Trend::Bad };
        (format_kw(watts), trend)
    } else {
        ("0.0".to_string(), Trend::Neutral)
    }
}

/// Battery state of energy, rounded to a whole percent.
pub fn format_percentage(percentage: f64) -> String {
    format!("{}", percentage.round() as i64)
}

/// Watts as kilowatts with two significant digits.
pub fn format_kw(watts: f64) -> String {
    to_precision(watts / 1000.0, 2)
}

/// Formats `value` with `precision` significant digits, switching to
/// exponential notation for exponents below -6 or at least `precision`
/// (e.g. `1.5`, `0.050`, `12`, `1.2e+2`). Ties round away from zero.
pub fn to_precision(value: f64, precision: usize) -> String {
    let precision = precision.clamp(1, 17);
    if !value.is_finite() {
        return value.to_string();
    }
    if value == 0.0 {
        return format!("{:.*}", precision - 1, 0.0);
    }

    let (digits, exponent) = significant_digits(value.abs(), precision);
    let sign = if value < 0.0 { "-" } else { "" };

    if exponent < -6 || exponent >= precision as i32 {
        let (head, tail) = digits.split_at(1);
        let exp_sign = if exponent < 0 { '-' } else { '+' };
        if tail.is_empty() {
            format!("{}{}e{}{}", sign, head, exp_sign, exponent.abs())
        } else {
            format!("{}{}.{}e{}{}", sign, head, tail, exp_sign, exponent.abs())
        }
    } else if exponent >= 0 {
        let (int_part, frac_part) = digits.split_at(exponent as usize + 1);
        if frac_part.is_empty() {
            format!("{}{}", sign, int_part)
        } else {
            format!("{}{}.{}", sign, int_part, frac_part)
        }
    } else {
        let zeros = "0".repeat((-exponent - 1) as usize);
        format!("{}0.{}{}", sign, zeros, digits)
    }
}

/// The `precision` leading decimal digits of a positive `magnitude` and the
/// decimal exponent of the first one.
fn significant_digits(magnitude: f64, precision: usize) -> (String, i32) {
    let mut exponent = magnitude.log10().floor() as i32;
    let lower = 10f64.powi(precision as i32 - 1);
    let upper = 10f64.powi(precision as i32);

    let mut mantissa = scale(magnitude, precision as i32 - 1 - exponent);
    // log10 can be off by one right at powers of ten
    if mantissa >= upper {
        exponent += 1;
        mantissa = scale(magnitude, precision as i32 - 1 - exponent);
    } else if mantissa < lower {
        exponent -= 1;
        mantissa = scale(magnitude, precision as i32 - 1 - exponent);
    }

    let mut rounded = mantissa.round();
    if rounded >= upper {
        rounded /= 10.0;
        exponent += 1;
    }
    (format!("{}", rounded as u64), exponent)
}

/// `magnitude * 10^power`, multiplying or dividing by an exact power of ten
/// so halves stay exact.
fn scale(magnitude: f64, power: i32) -> f64 {
    if power >= 0 {
        magnitude * 10f64.powi(power)
    } else {
        magnitude / 10f64.powi(-power)
    }
}
