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

use super::CelestialObject;
use crate::linalg::{Matrix3, Vector3};
use crate::time::{Duration, Epoch, Unit};
use crate::utils::{between_0_tau, r1, r3};
use crate::SmdError;
use std::cell::Cell;
use std::f64::consts::{PI, TAU};
use std::f64::EPSILON;
use std::fmt;

/// Below this eccentricity the orbit is handled as circular: the argument of
/// periapsis is zero and the true anomaly absorbs the argument of latitude.
pub const ECC_EPSILON: f64 = 1e-5;

/// Distance comparison tolerance, in km.
pub const DISTANCE_EPSILON_KM: f64 = 1e-6;

/// Angle comparison tolerance, in radians. Inclinations below it are handled
/// as equatorial: the RAAN is zero and the longitude of periapsis absorbs it.
pub const ANGLE_EPSILON_RAD: f64 = 1e-6;

#[derive(Copy, Clone, Debug)]
struct RvState {
    radius: Vector3<f64>,
    velocity: Vector3<f64>,
}

/// Orbit defines an osculating orbital state around a celestial object.
///
/// The Keplerian elements (a, e, i, Ω, ω, ν) are the single source of truth:
/// the propagator integrates them directly, so with zero perturbing force the
/// constant elements stay bit-for-bit constant. The Cartesian representation
/// is recomputed lazily and cached; any write through the elements invalidates
/// it. Angles are stored in radians in [0, 2π); constructors and the default
/// accessors speak degrees.
#[derive(Clone, Debug)]
pub struct Orbit {
    a: f64,
    ecc: f64,
    inc: f64,
    raan: f64,
    aop: f64,
    ta: f64,
    /// The celestial object at the center of this orbit
    pub origin: CelestialObject,
    rv: Cell<Option<RvState>>,
}

impl Orbit {
    /// Creates a new Orbit around the provided celestial object from the Keplerian
    /// orbital elements.
    ///
    /// **Units:** km, none, degrees, degrees, degrees, degrees
    pub fn keplerian(
        sma: f64,
        ecc: f64,
        inc: f64,
        raan: f64,
        aop: f64,
        ta: f64,
        origin: CelestialObject,
    ) -> Self {
        let ecc = if ecc < 0.0 {
            warn!("eccentricity cannot be negative: sign of eccentricity changed");
            -ecc
        } else {
            ecc
        };
        let sma = if ecc > 1.0 && sma > 0.0 {
            warn!("eccentricity > 1 (hyperbolic) BUT SMA > 0 (elliptical): sign of SMA changed");
            -sma
        } else if ecc < 1.0 && sma < 0.0 {
            warn!("eccentricity < 1 (elliptical) BUT SMA < 0 (hyperbolic): sign of SMA changed");
            -sma
        } else {
            sma
        };
        if (1.0 - ecc).abs() < EPSILON {
            panic!("parabolic orbits have ill-defined Keplerian orbital elements");
        }
        let mut inc = between_0_tau(inc.to_radians());
        let mut raan = between_0_tau(raan.to_radians());
        let mut aop = between_0_tau(aop.to_radians());
        let mut ta = between_0_tau(ta.to_radians());
        // Degenerate geometries: fold the ill-defined angles into the well defined ones.
        if inc.sin().abs() < ANGLE_EPSILON_RAD {
            aop = between_0_tau(aop + raan);
            raan = 0.0;
            inc = if inc > PI / 2.0 { PI } else { 0.0 };
        }
        if ecc < ECC_EPSILON {
            ta = between_0_tau(ta + aop);
            aop = 0.0;
        }
        Self {
            a: sma,
            ecc,
            inc,
            raan,
            aop,
            ta,
            origin,
            rv: Cell::new(None),
        }
    }

    /// Creates a new Orbit from the position and velocity vectors, in km and km/s,
    /// expressed in the inertial frame of the provided celestial object.
    pub fn cartesian(radius: Vector3<f64>, velocity: Vector3<f64>, origin: CelestialObject) -> Self {
        let rmag = radius.norm();
        if rmag < DISTANCE_EPSILON_KM {
            let mut zero = Self::zero(origin);
            zero.rv.set(Some(RvState { radius, velocity }));
            return zero;
        }
        let gm = origin.gm;
        let h_vec = radius.cross(&velocity);
        let h = h_vec.norm();
        let n_vec = Vector3::new(0.0, 0.0, 1.0).cross(&h_vec);
        let n = n_vec.norm();
        let e_vec =
            ((velocity.norm_squared() - gm / rmag) * radius - radius.dot(&velocity) * velocity)
                / gm;
        let ecc = e_vec.norm();
        let energy = velocity.norm_squared() / 2.0 - gm / rmag;
        let a = -gm / (2.0 * energy);
        let inc = (h_vec[2] / h).clamp(-1.0, 1.0).acos();

        let circular = ecc < ECC_EPSILON;
        // sin(i) = |ẑ × ĥ|, so this covers both the prograde and retrograde equatorial cases.
        let equatorial = n / h < ANGLE_EPSILON_RAD;

        let (raan, aop, ta) = if !circular && !equatorial {
            (
                quadrant_acos(n_vec[0] / n, n_vec[1] < 0.0),
                quadrant_acos(n_vec.dot(&e_vec) / (n * ecc), e_vec[2] < 0.0),
                quadrant_acos(
                    e_vec.dot(&radius) / (ecc * rmag),
                    radius.dot(&velocity) < 0.0,
                ),
            )
        } else if !circular && equatorial {
            // The longitude of periapsis absorbs the RAAN.
            (
                0.0,
                quadrant_acos(e_vec[0] / ecc, e_vec[1] < 0.0),
                quadrant_acos(
                    e_vec.dot(&radius) / (ecc * rmag),
                    radius.dot(&velocity) < 0.0,
                ),
            )
        } else if circular && !equatorial {
            // The true anomaly absorbs the argument of latitude.
            (
                quadrant_acos(n_vec[0] / n, n_vec[1] < 0.0),
                0.0,
                quadrant_acos(n_vec.dot(&radius) / (n * rmag), radius[2] < 0.0),
            )
        } else {
            // Circular equatorial: only the true longitude is defined.
            (
                0.0,
                0.0,
                quadrant_acos(radius[0] / rmag, radius[1] < 0.0),
            )
        };

        Self {
            a,
            ecc,
            inc,
            raan,
            aop,
            ta,
            origin,
            rv: Cell::new(Some(RvState { radius, velocity })),
        }
    }

    /// Returns the zero orbit around the provided object, used for the center itself.
    pub fn zero(origin: CelestialObject) -> Self {
        Self {
            a: 0.0,
            ecc: 0.0,
            inc: 0.0,
            raan: 0.0,
            aop: 0.0,
            ta: 0.0,
            origin,
            rv: Cell::new(Some(RvState {
                radius: Vector3::zeros(),
                velocity: Vector3::zeros(),
            })),
        }
    }

    fn rv_state(&self) -> RvState {
        if let Some(state) = self.rv.get() {
            return state;
        }
        // Perifocal state, then the 3-1-3 rotation Ω, i, ω back to inertial.
        let p = self.semi_parameter();
        let (sin_ta, cos_ta) = self.ta.sin_cos();
        let rmag = p / (1.0 + self.ecc * cos_ta);
        let r_pqw = Vector3::new(rmag * cos_ta, rmag * sin_ta, 0.0);
        let sqrt_gm_p = (self.origin.gm / p).sqrt();
        let v_pqw = Vector3::new(-sqrt_gm_p * sin_ta, sqrt_gm_p * (self.ecc + cos_ta), 0.0);
        let dcm = r3(-self.raan) * r1(-self.inc) * r3(-self.aop);
        let state = RvState {
            radius: dcm * r_pqw,
            velocity: dcm * v_pqw,
        };
        self.rv.set(Some(state));
        state
    }

    /// Returns the radius and velocity vectors, in km and km/s.
    pub fn rv(&self) -> (Vector3<f64>, Vector3<f64>) {
        let state = self.rv_state();
        (state.radius, state.velocity)
    }

    /// Returns the radius vector of this Orbit in [km, km, km]
    pub fn radius(&self) -> Vector3<f64> {
        self.rv_state().radius
    }

    /// Returns the velocity vector of this Orbit in [km/s, km/s, km/s]
    pub fn velocity(&self) -> Vector3<f64> {
        self.rv_state().velocity
    }

    /// Returns the magnitude of the radius vector in km
    pub fn rmag(&self) -> f64 {
        if self.a.abs() < EPSILON {
            return self.rv_state().radius.norm();
        }
        self.semi_parameter() / (1.0 + self.ecc * self.ta.cos())
    }

    /// Returns the magnitude of the velocity vector in km/s
    pub fn vmag(&self) -> f64 {
        if self.a.abs() < EPSILON {
            return self.rv_state().velocity.norm();
        }
        (self.origin.gm * (2.0 / self.rmag() - 1.0 / self.a)).sqrt()
    }

    /// Returns the semi-major axis in km
    pub fn sma(&self) -> f64 {
        self.a
    }

    /// Returns the eccentricity (no unit)
    pub fn ecc(&self) -> f64 {
        self.ecc
    }

    /// Returns the inclination in degrees
    pub fn inc(&self) -> f64 {
        self.inc.to_degrees()
    }

    /// Returns the right ascension of the ascending node in degrees
    pub fn raan(&self) -> f64 {
        self.raan.to_degrees()
    }

    /// Returns the argument of periapsis in degrees
    pub fn aop(&self) -> f64 {
        self.aop.to_degrees()
    }

    /// Returns the true anomaly in degrees
    pub fn ta(&self) -> f64 {
        self.ta.to_degrees()
    }

    pub fn inc_rad(&self) -> f64 {
        self.inc
    }

    pub fn raan_rad(&self) -> f64 {
        self.raan
    }

    pub fn aop_rad(&self) -> f64 {
        self.aop
    }

    pub fn ta_rad(&self) -> f64 {
        self.ta
    }

    /// Returns the semi parameter (or semilatus rectum) in km
    pub fn semi_parameter(&self) -> f64 {
        self.a * (1.0 - self.ecc.powi(2))
    }

    /// Returns the specific mechanical energy in km^2/s^2
    pub fn energy(&self) -> f64 {
        -self.origin.gm / (2.0 * self.a)
    }

    /// Returns the period of this orbit
    pub fn period(&self) -> Duration {
        2.0 * PI * (self.a.powi(3) / self.origin.gm).sqrt() * Unit::Second
    }

    /// Returns the orbital momentum vector in km^2/s
    pub fn hvec(&self) -> Vector3<f64> {
        let state = self.rv_state();
        state.radius.cross(&state.velocity)
    }

    /// Returns the norm of the orbital momentum in km^2/s
    pub fn hmag(&self) -> f64 {
        (self.origin.gm * self.semi_parameter()).sqrt()
    }

    /// Returns the sine and cosine of the eccentric anomaly.
    pub fn sin_cos_ea(&self) -> (f64, f64) {
        let (sin_ta, cos_ta) = self.ta.sin_cos();
        let denom = 1.0 + self.ecc * cos_ta;
        (
            ((1.0 - self.ecc.powi(2)).sqrt() * sin_ta) / denom,
            (self.ecc + cos_ta) / denom,
        )
    }

    /// Returns the eccentric anomaly in degrees
    pub fn ea(&self) -> f64 {
        let (sin_ea, cos_ea) = self.sin_cos_ea();
        between_0_tau(sin_ea.atan2(cos_ea)).to_degrees()
    }

    /// Returns the mean anomaly in degrees
    pub fn ma(&self) -> f64 {
        let ea = self.ea().to_radians();
        between_0_tau(ea - self.ecc * ea.sin()).to_degrees()
    }

    /// Returns the direction cosine matrix rotating an inertial vector into the
    /// RSW frame (radial outward, along-track, cross-track).
    pub fn dcm_inertial_to_rsw(&self) -> Matrix3<f64> {
        let state = self.rv_state();
        let r_hat = state.radius / state.radius.norm();
        let h_vec = state.radius.cross(&state.velocity);
        let w_hat = h_vec / h_vec.norm();
        let s_hat = w_hat.cross(&r_hat);
        Matrix3::new(
            r_hat[0], r_hat[1], r_hat[2], s_hat[0], s_hat[1], s_hat[2], w_hat[0], w_hat[1],
            w_hat[2],
        )
    }

    /// Overwrites the Keplerian elements of this orbit. Angles in radians.
    /// The cached Cartesian representation is invalidated.
    pub(crate) fn set_elements(&mut self, a: f64, ecc: f64, inc: f64, raan: f64, aop: f64, ta: f64) {
        self.a = a;
        self.ecc = ecc;
        self.inc = inc;
        self.raan = raan;
        self.aop = aop;
        self.ta = ta;
        self.rv.set(None);
    }

    /// Rebuilds this orbit around the new celestial object at the provided epoch.
    ///
    /// The Cartesian state of the current and new origins with respect to the Sun
    /// are composed so that transfers work between any two catalog bodies; the
    /// usual cases are a planet to the Sun when crossing the sphere of influence
    /// outward, and the Sun to a planet when being captured.
    pub fn to_centric(&mut self, new_origin: CelestialObject, dt: Epoch) -> Result<(), SmdError> {
        if new_origin == self.origin {
            return Ok(());
        }
        let (radius, velocity) = self.rv();
        let (cur_r, cur_v) = self.origin.helio_orbit(dt)?.rv();
        let (new_r, new_v) = new_origin.helio_orbit(dt)?.rv();
        *self = Self::cartesian(
            radius + cur_r - new_r,
            velocity + cur_v - new_v,
            new_origin,
        );
        Ok(())
    }

    /// Returns whether this orbit matches the other in shape: same origin, and
    /// semi-major axis, eccentricity and inclination within the physical tolerances.
    pub fn equals(&self, other: &Orbit) -> bool {
        self.origin == other.origin
            && (self.a - other.a).abs() < DISTANCE_EPSILON_KM
            && (self.ecc - other.ecc).abs() < ECC_EPSILON
            && angles_match(self.inc, other.inc)
    }

    /// Returns whether this orbit matches the other in shape and in phase: `equals`
    /// plus RAAN, argument of periapsis and true anomaly modulo 2π.
    pub fn strictly_equals(&self, other: &Orbit) -> bool {
        self.equals(other)
            && angles_match(self.raan, other.raan)
            && angles_match(self.aop, other.aop)
            && angles_match(self.ta, other.ta)
    }
}

fn quadrant_acos(cos_value: f64, other_half: bool) -> f64 {
    let angle = cos_value.clamp(-1.0, 1.0).acos();
    if other_half {
        between_0_tau(TAU - angle)
    } else {
        angle
    }
}

fn angles_match(alpha: f64, beta: f64) -> bool {
    let diff = (alpha - beta).rem_euclid(TAU);
    diff < ANGLE_EPSILON_RAD || (TAU - diff) < ANGLE_EPSILON_RAD
}

impl fmt::Display for Orbit {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "[{}] a: {:.6} km, e: {:.6}, i: {:.6} deg, Ω: {:.6} deg, ω: {:.6} deg, ν: {:.6} deg",
            self.origin.name,
            self.sma(),
            self.ecc(),
            self.inc(),
            self.raan(),
            self.aop(),
            self.ta()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cosmic::{EARTH, SUN};

    #[test]
    fn oe_to_rv_to_oe_roundtrip() {
        let orbit = Orbit::keplerian(8191.93, 0.024_54, 12.85, 306.614, 314.19, 99.887, EARTH);
        let (radius, velocity) = orbit.rv();
        let back = Orbit::cartesian(radius, velocity, EARTH);
        assert!(
            orbit.strictly_equals(&back),
            "roundtrip failed:\n{orbit}\n{back}"
        );
    }

    #[test]
    fn rv_to_oe_vallado() {
        // Vallado 4th edition, example 2-5.
        let radius = Vector3::new(6524.834, 6862.875, 6448.296);
        let velocity = Vector3::new(4.901_327, 5.533_756, -1.976_341);
        let orbit = Orbit::cartesian(radius, velocity, EARTH);
        assert!((orbit.sma() - 36127.343).abs() < 2.0, "sma = {}", orbit.sma());
        assert!((orbit.ecc() - 0.832_853).abs() < 1e-4, "ecc = {}", orbit.ecc());
        assert!((orbit.inc() - 87.870).abs() < 1e-2, "inc = {}", orbit.inc());
        assert!((orbit.raan() - 227.898).abs() < 1e-2, "raan = {}", orbit.raan());
        assert!((orbit.aop() - 53.38).abs() < 1e-1, "aop = {}", orbit.aop());
        assert!((orbit.ta() - 92.335).abs() < 1e-2, "ta = {}", orbit.ta());
    }

    #[test]
    fn circular_orbit_folds_aop() {
        let orbit = Orbit::keplerian(7000.0, 1e-7, 30.0, 45.0, 60.0, 10.0, EARTH);
        assert_eq!(orbit.aop(), 0.0);
        assert!((orbit.ta() - 70.0).abs() < 1e-10);
        // The state vector still describes the same physical position.
        let (radius, velocity) = orbit.rv();
        let back = Orbit::cartesian(radius, velocity, EARTH);
        assert!(orbit.equals(&back));
    }

    #[test]
    fn equatorial_orbit_folds_raan() {
        let orbit = Orbit::keplerian(7000.0, 0.1, 0.0, 45.0, 60.0, 10.0, EARTH);
        assert_eq!(orbit.raan(), 0.0);
        assert!((orbit.aop() - 105.0).abs() < 1e-10);
    }

    #[test]
    fn accessors() {
        let orbit = Orbit::keplerian(42164.0, 0.01, 5.0, 10.0, 20.0, 30.0, EARTH);
        assert!((orbit.semi_parameter() - 42164.0 * (1.0 - 0.01f64.powi(2))).abs() < 1e-9);
        assert!((orbit.energy() + EARTH.gm / (2.0 * 42164.0)).abs() < 1e-9);
        let period_s = orbit.period().to_seconds();
        assert!((period_s - 86_164.5).abs() < 10.0, "T = {period_s}");
        // h from the momentum vector and from √(μp) must agree.
        assert!((orbit.hvec().norm() - orbit.hmag()).abs() < 1e-6);
        // Eccentric anomaly lags the true anomaly on the way up.
        assert!(orbit.ea() < orbit.ta());
        assert!(orbit.ma() < orbit.ea());
    }

    #[test]
    fn centric_roundtrip() {
        let dt = Epoch::from_gregorian_utc_at_midnight(2017, 1, 15);
        let orbit = Orbit::keplerian(42164.0, 0.01, 5.0, 10.0, 20.0, 30.0, EARTH);
        let mut xfer = orbit.clone();
        xfer.to_centric(SUN, dt).unwrap();
        assert_eq!(xfer.origin, SUN);
        xfer.to_centric(EARTH, dt).unwrap();
        let (r0, v0) = orbit.rv();
        let (r1, v1) = xfer.rv();
        assert!((r0 - r1).norm() < DISTANCE_EPSILON_KM, "Δr = {}", (r0 - r1).norm());
        assert!((v0 - v1).norm() < 1e-9, "Δv = {}", (v0 - v1).norm());
    }

    #[test]
    fn equality_strengths() {
        let alpha = Orbit::keplerian(24396.0, 0.7283, 7.0, 1.0, 1.0, 1.0, EARTH);
        let beta = Orbit::keplerian(24396.0, 0.7283, 7.0, 1.0, 1.0, 181.0, EARTH);
        assert!(alpha.equals(&beta));
        assert!(!alpha.strictly_equals(&beta));
        assert!(alpha.strictly_equals(&alpha.clone()));
    }
}
