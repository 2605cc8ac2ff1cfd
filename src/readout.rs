use chrono::{DateTime, Local};
use nalgebra::Vector3;

use crate::data_provider::LocationFix;
use crate::orientation;

pub const UNABLE_TO_LOCATE: &str = "Unable to locate.";

// Text shown on the main screen: whatever arrived last wins, there is no
// history and no filtering.
pub struct LatestReadings {
    gravity: Vector3<f64>,
    geomagnetic: Vector3<f64>,

    accel: String,
    accel_updated: String,
    location: String,
    provider: String,
    location_updated: String,
    orientation: String,
    orientation_updated: String,
}

impl LatestReadings {
    pub fn new(provider: Option<&str>) -> Self {
        Self {
            gravity: Vector3::zeros(),
            geomagnetic: Vector3::zeros(),
            accel: String::new(),
            accel_updated: String::new(),
            location: UNABLE_TO_LOCATE.to_string(),
            provider: format!("Provider: {}", provider.unwrap_or("none")),
            location_updated: String::new(),
            orientation: String::new(),
            orientation_updated: String::new(),
        }
    }

    pub fn apply_accel(&mut self, lin_acc: Vector3<f64>, now: DateTime<Local>) {
        self.gravity = lin_acc;
        self.accel = format_accel(&lin_acc);
        self.accel_updated = format_last_updated(now);
        self.update_orientation(now);
    }

    pub fn apply_mag(&mut self, field: Vector3<f64>, now: DateTime<Local>) {
        self.geomagnetic = field;
        self.update_orientation(now);
    }

    pub fn apply_fix(&mut self, fix: Option<LocationFix>, now: DateTime<Local>) {
        match fix {
            Some(fix) => {
                self.location = format_location(&fix);
                self.location_updated = format_last_updated(now);
            }
            // the timestamp is not touched, it still names the last real fix
            None => self.location = UNABLE_TO_LOCATE.to_string(),
        }
    }

    fn update_orientation(&mut self, now: DateTime<Local>) {
        // an unusable vector pair (free fall, nothing received yet) keeps
        // the previous angles on screen
        if let Some(o) = orientation::from_vectors(self.gravity, self.geomagnetic) {
            self.orientation = format_orientation(&o);
            self.orientation_updated = format_last_updated(now);
        }
    }

    pub fn accel_text(&self) -> &str {
        &self.accel
    }

    pub fn accel_last_updated(&self) -> &str {
        &self.accel_updated
    }

    pub fn location_text(&self) -> &str {
        &self.location
    }

    pub fn provider_text(&self) -> &str {
        &self.provider
    }

    pub fn location_last_updated(&self) -> &str {
        &self.location_updated
    }

    pub fn orientation_text(&self) -> &str {
        &self.orientation
    }

    pub fn orientation_last_updated(&self) -> &str {
        &self.orientation_updated
    }
}

pub fn format_accel(v: &Vector3<f64>) -> String {
    format!("X: {:.2}\nY: {:.2}\nZ: {:.2}", v.x, v.y, v.z)
}

pub fn format_location(fix: &LocationFix) -> String {
    format!("Latitude: {:.2}\nLongitude: {:.2}", fix.latitude, fix.longitude)
}

pub fn format_orientation(o: &orientation::Orientation) -> String {
    // + 0.0 keeps an exact -0.0 from rendering as "-0.00"
    format!(
        "Azimuth (-Z): {:.2} rad\nPitch (-X): {:.2} rad\nRoll (Y): {:.2} rad",
        o.azimuth + 0.0,
        o.pitch + 0.0,
        o.roll + 0.0
    )
}

pub fn format_last_updated(now: DateTime<Local>) -> String {
    format!("Last updated: {}", now.format("%Y-%m-%d %H:%M:%S"))
}
