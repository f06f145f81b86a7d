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

use super::{Orbit, AU};
use crate::linalg::Vector3;
use crate::time::Epoch;
use crate::utils::r1;
use crate::SmdError;
use std::fmt;

/// Defines a celestial object around which a vehicle may orbit.
///
/// All instances are immutable catalog entries: distances in km, gravitational
/// parameter in km^3/s^2, tilts and inclinations in degrees.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct CelestialObject {
    pub name: &'static str,
    /// Equatorial radius, in km
    pub radius: f64,
    /// Semi-major axis of the heliocentric orbit, in km (zero for the Sun)
    pub a: f64,
    /// Gravitational parameter μ, in km^3/s^2
    pub gm: f64,
    /// Axial tilt, in degrees
    pub tilt: f64,
    /// Inclination to the ecliptic, in degrees
    pub incl: f64,
    /// Sphere of influence with respect to the Sun, in km
    pub soi: f64,
    pub j2: f64,
    pub j3: f64,
    pub j4: f64,
    /// Rotation rate about the spin axis, in rad/s
    pub rotation_rate: f64,
}

impl CelestialObject {
    /// Returns the perturbing J_n factor for the provided n, or zero if unknown.
    pub fn j(&self, n: u8) -> f64 {
        match n {
            2 => self.j2,
            3 => self.j3,
            4 => self.j4,
            _ => 0.0,
        }
    }

    /// Returns the heliocentric orbit of this planet at the provided Julian date,
    /// in the Sun's equatorial frame.
    ///
    /// The ecliptic spherical coordinates (L, B, R) come from the VSOP-87 theory;
    /// the speed is derived from the vis-viva equation and directed prograde, then
    /// the state is rotated out of the ecliptic by the axial tilt and back in by
    /// the orbital inclination.
    pub fn helio_orbit_at_jde(&self, jde: f64) -> Result<Orbit, SmdError> {
        if self.name == "Sun" {
            return Ok(Orbit::zero(SUN));
        }
        let coords = match self.name {
            "Venus" => vsop87::vsop87d::venus(jde),
            "Earth" => vsop87::vsop87d::earth(jde),
            "Mars" => vsop87::vsop87d::mars(jde),
            "Jupiter" => vsop87::vsop87d::jupiter(jde),
            _ => return Err(SmdError::ObjectNotFound(self.name.to_string())),
        };
        let r = coords.distance() * AU;
        let (sin_b, cos_b) = coords.latitude().sin_cos();
        let (sin_l, cos_l) = coords.longitude().sin_cos();
        let radius = Vector3::new(r * cos_b * cos_l, r * cos_b * sin_l, r * sin_b);
        // Vis-viva with the catalog semi-major axis, directed prograde in the ecliptic.
        let speed = (2.0 * SUN.gm / r - SUN.gm / self.a).sqrt();
        let v_dir = radius.cross(&Vector3::new(0.0, 0.0, -1.0));
        let velocity = v_dir * (speed / v_dir.norm());
        // Out of the ecliptic by the axial tilt, back by the orbital inclination.
        let dcm = r1(self.incl.to_radians()) * r1(-self.tilt.to_radians());
        Ok(Orbit::cartesian(dcm * radius, dcm * velocity, SUN))
    }

    /// Returns the heliocentric orbit of this planet at the provided epoch.
    pub fn helio_orbit(&self, dt: Epoch) -> Result<Orbit, SmdError> {
        self.helio_orbit_at_jde(dt.to_jde_utc_days())
    }
}

impl fmt::Display for CelestialObject {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} body", self.name)
    }
}

/// Sun is our closest star.
pub const SUN: CelestialObject = CelestialObject {
    name: "Sun",
    radius: 695_700.0,
    a: 0.0,
    gm: 1.327_124_400_18e11,
    tilt: 0.0,
    incl: 0.0,
    soi: f64::INFINITY,
    j2: 0.0,
    j3: 0.0,
    j4: 0.0,
    rotation_rate: 0.0,
};

/// Earth is home.
pub const EARTH: CelestialObject = CelestialObject {
    name: "Earth",
    radius: 6378.136_3,
    a: 149_598_023.0,
    gm: 3.986_004_415e5,
    tilt: 23.4,
    incl: 0.000_05,
    soi: 924_645.0,
    j2: 1.082_626_9e-3,
    j3: -2.5324e-6,
    j4: -1.6204e-6,
    rotation_rate: 7.292_115_855_3e-5,
};

/// Venus, almost a twin of home.
pub const VENUS: CelestialObject = CelestialObject {
    name: "Venus",
    radius: 6051.8,
    a: 108_208_601.0,
    gm: 3.257e5,
    tilt: 177.36,
    incl: 3.394_71,
    soi: 616_000.0,
    j2: 4.458e-6,
    j3: 0.0,
    j4: 0.0,
    rotation_rate: 0.0,
};

/// Mars is the vacation place.
pub const MARS: CelestialObject = CelestialObject {
    name: "Mars",
    radius: 3397.2,
    a: 227_939_282.561_6,
    gm: 4.305e4,
    tilt: 25.19,
    incl: 1.85,
    soi: 576_000.0,
    j2: 1.964e-3,
    j3: 3.6e-5,
    j4: -1.8e-5,
    rotation_rate: 7.088_218e-5,
};

/// Jupiter is big.
pub const JUPITER: CelestialObject = CelestialObject {
    name: "Jupiter",
    radius: 71_492.0,
    a: 778_298_361.0,
    gm: 1.268e8,
    tilt: 3.13,
    incl: 1.303_269_66,
    soi: 48.2e6,
    j2: 0.014_75,
    j3: 0.0,
    j4: -0.000_58,
    rotation_rate: 1.758_53e-4,
};
