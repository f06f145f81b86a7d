/*
    SMD, a space mission design toolkit
    Copyright (C) 2023 Christopher Rabotin <christopher.rabotin@gmail.com>

    This program is free software: you can redistribute it and/or modify
    it under the terms of the GNU Affero General Public License as published
    by the Free Software Foundation, either version 3 of the License, or
    (at your option) any later version.

    This program is distributed in the hope that it will be useful,
    but WITHOUT ANY WARRANTY; without even the implied warranty of
    MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
    GNU Affero General Public License for more details.

    You should have received a copy of the GNU Affero General Public License
    along with this program.  If not, see <https://www.gnu.org/licenses/>.
*/

use crate::cosmic::Orbit;
use crate::linalg::Vector3;
use crate::time::Epoch;
use crate::utils::{between_0_360, r2, r3};
use serde_derive::{Deserialize, Serialize};
use std::f64::consts::FRAC_PI_2;
use std::fmt;

/// GroundStation defines a two-way ranging and doppler station.
///
/// Only the measurement geometry is computed here: the noise variances are
/// carried for the orbit determination filters consuming the observations.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct GroundStation {
    pub name: String,
    /// in degrees
    pub elevation_mask_deg: f64,
    /// in degrees
    pub latitude_deg: f64,
    /// in degrees
    pub longitude_deg: f64,
    /// in km
    pub height_km: f64,
    /// Range measurement noise variance σ_ρ², in km²
    pub range_noise_km2: f64,
    /// Range-rate measurement noise variance σ_ρ̇², in km²/s²
    pub range_rate_noise_km2_s2: f64,
}

/// A topocentric observation of the vehicle from a ground station.
#[derive(Clone, Debug, PartialEq)]
pub struct Measurement {
    /// Whether the vehicle is above the station's elevation mask.
    pub visible: bool,
    pub range_km: f64,
    pub range_rate_km_s: f64,
    pub station: String,
    pub dt: Epoch,
}

impl GroundStation {
    pub fn new(
        name: &str,
        elevation_mask_deg: f64,
        latitude_deg: f64,
        longitude_deg: f64,
        height_km: f64,
        range_noise_km2: f64,
        range_rate_noise_km2_s2: f64,
    ) -> Self {
        Self {
            name: name.to_string(),
            elevation_mask_deg,
            latitude_deg,
            longitude_deg,
            height_km,
            range_noise_km2,
            range_rate_noise_km2_s2,
        }
    }

    pub fn dss65_madrid(elevation_mask_deg: f64) -> Self {
        Self::new(
            "Madrid",
            elevation_mask_deg,
            40.427_222,
            4.250_556,
            0.834_939,
            5e-7,
            5e-11,
        )
    }

    pub fn dss34_canberra(elevation_mask_deg: f64) -> Self {
        Self::new(
            "Canberra",
            elevation_mask_deg,
            -35.398_333,
            148.981_944,
            0.691_750,
            5e-7,
            5e-11,
        )
    }

    pub fn dss13_goldstone(elevation_mask_deg: f64) -> Self {
        Self::new(
            "Goldstone",
            elevation_mask_deg,
            35.247_164,
            243.205,
            1.071_149_04,
            5e-7,
            5e-11,
        )
    }

    /// Performs a range and range-rate measurement of the provided orbit at the
    /// provided Greenwich sidereal time, in radians. The measurement is flagged
    /// visible only if the elevation exceeds the station mask.
    pub fn perform_measurement(&self, theta_gst_rad: f64, orbit: &Orbit, dt: Epoch) -> Measurement {
        let body = orbit.origin;
        let (sin_lat, cos_lat) = self.latitude_deg.to_radians().sin_cos();
        let theta_lst = theta_gst_rad + self.longitude_deg.to_radians();
        let (sin_lst, cos_lst) = theta_lst.sin_cos();
        let site_radius = body.radius + self.height_km;
        let site = Vector3::new(
            site_radius * cos_lat * cos_lst,
            site_radius * cos_lat * sin_lst,
            site_radius * sin_lat,
        );
        let omega = Vector3::new(0.0, 0.0, body.rotation_rate);
        let site_velocity = omega.cross(&site);

        let (radius, velocity) = orbit.rv();
        let rho = radius - site;
        let rho_dot = velocity - site_velocity;
        let range_km = rho.norm();
        let range_rate_km_s = rho.dot(&rho_dot) / range_km;

        // Elevation from the topocentric SEZ frame, cf. Vallado section 4.4.3.
        let rho_sez = r2(FRAC_PI_2 - self.latitude_deg.to_radians()) * r3(theta_lst) * rho;
        let elevation_deg = (rho_sez[2] / range_km).clamp(-1.0, 1.0).asin().to_degrees();

        Measurement {
            visible: elevation_deg >= self.elevation_mask_deg,
            range_km,
            range_rate_km_s,
            station: self.name.clone(),
            dt,
        }
    }
}

impl fmt::Display for GroundStation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} (lat.: {:.4} deg, long.: {:.4} deg, alt.: {:.3} km)",
            self.name, self.latitude_deg, self.longitude_deg, self.height_km
        )
    }
}

/// Returns the Greenwich sidereal time, in radians, at the provided epoch,
/// from the IAU-82 GMST polynomial truncated to its linear term.
pub fn theta_gst(dt: Epoch) -> f64 {
    let jd_ut1 = dt.to_jde_utc_days();
    let t = (jd_ut1 - 2_451_545.0) / 36_525.0;
    let gmst_deg = 280.460_618_37 + 360.985_647_366_29 * (jd_ut1 - 2_451_545.0)
        + 3.87933e-4 * t * t;
    between_0_360(gmst_deg).to_radians()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cosmic::EARTH;

    #[test]
    fn overhead_station_sees_the_vehicle() {
        // A vehicle on the prime meridian equator at zero GST, station below it.
        let station = GroundStation::new("eq", 10.0, 0.0, 0.0, 0.0, 5e-7, 5e-11);
        let dt = Epoch::from_gregorian_utc_at_midnight(2017, 1, 1);
        let orbit = Orbit::cartesian(
            Vector3::new(7000.0, 0.0, 0.0),
            Vector3::new(0.0, 7.546, 0.0),
            EARTH,
        );
        let measurement = station.perform_measurement(0.0, &orbit, dt);
        assert!(measurement.visible);
        assert!((measurement.range_km - (7000.0 - EARTH.radius)).abs() < 1e-9);
        // Overhead pass: the radial rate is the station's rotation lag only.
        assert!(measurement.range_rate_km_s.abs() < 1e-9);
    }

    #[test]
    fn station_on_far_side_sees_nothing() {
        let station = GroundStation::new("far", 10.0, 0.0, 180.0, 0.0, 5e-7, 5e-11);
        let dt = Epoch::from_gregorian_utc_at_midnight(2017, 1, 1);
        let orbit = Orbit::cartesian(
            Vector3::new(7000.0, 0.0, 0.0),
            Vector3::new(0.0, 7.546, 0.0),
            EARTH,
        );
        let measurement = station.perform_measurement(0.0, &orbit, dt);
        assert!(!measurement.visible);
    }

    #[test]
    fn receding_vehicle_has_positive_range_rate() {
        let station = GroundStation::new("eq", 10.0, 0.0, 0.0, 0.0, 5e-7, 5e-11);
        let dt = Epoch::from_gregorian_utc_at_midnight(2017, 1, 1);
        let orbit = Orbit::cartesian(
            Vector3::new(7000.0, 0.0, 0.0),
            Vector3::new(3.0, 7.0, 0.0),
            EARTH,
        );
        let measurement = station.perform_measurement(0.0, &orbit, dt);
        assert!(measurement.range_rate_km_s > 2.9);
    }

    #[test]
    fn gst_is_bounded() {
        let dt = Epoch::from_gregorian_utc_at_midnight(2017, 1, 1);
        let theta = theta_gst(dt);
        assert!((0.0..std::f64::consts::TAU).contains(&theta));
    }
}
