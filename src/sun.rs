//! Pluggable astronomical-event substitution for Schedule Execution
//! (§4.8): schedules may name *sunrise*/*sunset* instead of a fixed
//! minutes-since-midnight value. `SunCalculator` is the seam; the
//! default implementation is a hand-rolled NOAA approximation (no
//! external crate in the corpus's dependency stack covers this).

use chrono::{Datelike, NaiveDate};

/// Minutes-since-midnight for sunrise and sunset on a given date, at a
/// fixed latitude/longitude. Implementations may ignore elevation and
/// atmospheric refraction nuances; schedule timing only needs
/// minute-level accuracy.
pub trait SunCalculator: Send + Sync {
    fn sunrise_minutes(&self, date: NaiveDate) -> u16;
    fn sunset_minutes(&self, date: NaiveDate) -> u16;
}

/// NOAA solar-position approximation, evaluated at local civil time
/// (ignores the equation-of-time's sub-minute wobble and DST transition
/// seams, both below the scheduler's 1-minute resolution).
pub struct NoaaApproxCalculator {
    pub latitude_deg: f64,
    pub longitude_deg: f64,
    pub utc_offset_hours: f64,
}

impl NoaaApproxCalculator {
    pub fn new(latitude_deg: f64, longitude_deg: f64, utc_offset_hours: f64) -> Self {
        Self {
            latitude_deg,
            longitude_deg,
            utc_offset_hours,
        }
    }

    /// Hour-angle based sunrise/sunset time, in minutes-since-midnight
    /// local time. `sign` is `-1.0` for sunrise, `+1.0` for sunset.
    fn event_minutes(&self, date: NaiveDate, sign: f64) -> u16 {
        use std::f64::consts::PI;

        let day_of_year = f64::from(date.ordinal());
        let lat_rad = self.latitude_deg.to_radians();

        // Fractional year, in radians (NOAA General Solar Position Calculations).
        let gamma = 2.0 * PI / 365.0 * (day_of_year - 1.0);

        let declination = 0.006_918 - 0.399_912 * gamma.cos() + 0.070_257 * gamma.sin()
            - 0.006_758 * (2.0 * gamma).cos()
            + 0.000_907 * (2.0 * gamma).sin()
            - 0.002_697 * (3.0 * gamma).cos()
            + 0.001_480 * (3.0 * gamma).sin();

        let eq_of_time_min = 229.18
            * (0.000_075 + 0.001_868 * gamma.cos()
                - 0.032_077 * gamma.sin()
                - 0.014_615 * (2.0 * gamma).cos()
                - 0.040_849 * (2.0 * gamma).sin());

        let cos_hour_angle = (90.833_f64.to_radians().cos() / (lat_rad.cos() * declination.cos()))
            - lat_rad.tan() * declination.tan();
        let cos_hour_angle = cos_hour_angle.clamp(-1.0, 1.0);
        let hour_angle_deg = cos_hour_angle.acos().to_degrees();

        let solar_noon_min =
            720.0 - 4.0 * self.longitude_deg - eq_of_time_min + self.utc_offset_hours * 60.0;
        let event_min = solar_noon_min + sign * 4.0 * hour_angle_deg;

        event_min.rem_euclid(1440.0) as u16
    }
}

impl SunCalculator for NoaaApproxCalculator {
    fn sunrise_minutes(&self, date: NaiveDate) -> u16 {
        self.event_minutes(date, -1.0)
    }

    fn sunset_minutes(&self, date: NaiveDate) -> u16 {
        self.event_minutes(date, 1.0)
    }
}

/// A fixed lookup table, for tests that need deterministic sunrise/sunset
/// independent of the NOAA approximation's floating-point arithmetic.
pub struct FixedCalculator {
    pub sunrise: u16,
    pub sunset: u16,
}

impl SunCalculator for FixedCalculator {
    fn sunrise_minutes(&self, _date: NaiveDate) -> u16 {
        self.sunrise
    }

    fn sunset_minutes(&self, _date: NaiveDate) -> u16 {
        self.sunset
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summer_sunrise_precedes_sunset() {
        let calc = NoaaApproxCalculator::new(33.0, -117.0, -8.0);
        let date = NaiveDate::from_ymd_opt(2026, 6, 21).unwrap();
        let sunrise = calc.sunrise_minutes(date);
        let sunset = calc.sunset_minutes(date);
        assert!(sunrise < 420, "expected a summer sunrise before 7am, got {sunrise}");
        assert!(sunset > 1140, "expected a summer sunset after 7pm, got {sunset}");
    }

    #[test]
    fn fixed_calculator_ignores_the_date() {
        let calc = FixedCalculator {
            sunrise: 360,
            sunset: 1140,
        };
        let d1 = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        let d2 = NaiveDate::from_ymd_opt(2026, 7, 1).unwrap();
        assert_eq!(calc.sunrise_minutes(d1), calc.sunrise_minutes(d2));
    }
}
