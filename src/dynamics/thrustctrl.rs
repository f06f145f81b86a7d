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

use crate::cosmic::{Orbit, ANGLE_EPSILON_RAD, ECC_EPSILON};
use crate::linalg::Vector3;
use crate::utils::sign;
use std::f64::consts::FRAC_PI_2 as half_pi;
use std::fmt;

/// Acceptance band of the semi-major axis targeting law, in km. One fixed RK4
/// step moves the osculating SMA by a few hundred meters for a low-thrust
/// vehicle, so the band must be wider than that to latch.
pub const SMA_TOLERANCE_KM: f64 = 0.5;

/// The osculating orbital elements that the optimal thrust direction laws can steer.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[allow(clippy::upper_case_acronyms)]
pub enum StateParameter {
    SMA,
    Eccentricity,
    Inclination,
    RAAN,
    AoP,
}

impl StateParameter {
    /// All five steerable elements, the default law set of `OptimalDeltaOrbit`.
    pub const ALL: [StateParameter; 5] = [
        StateParameter::SMA,
        StateParameter::Eccentricity,
        StateParameter::Inclination,
        StateParameter::RAAN,
        StateParameter::AoP,
    ];

    fn value(&self, orbit: &Orbit) -> f64 {
        match self {
            StateParameter::SMA => orbit.sma(),
            StateParameter::Eccentricity => orbit.ecc(),
            StateParameter::Inclination => orbit.inc_rad(),
            StateParameter::RAAN => orbit.raan_rad(),
            StateParameter::AoP => orbit.aop_rad(),
        }
    }

    fn tolerance(&self) -> f64 {
        match self {
            StateParameter::SMA => SMA_TOLERANCE_KM,
            StateParameter::Eccentricity => ECC_EPSILON,
            _ => ANGLE_EPSILON_RAD,
        }
    }
}

impl fmt::Display for StateParameter {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            StateParameter::SMA => write!(f, "sma"),
            StateParameter::Eccentricity => write!(f, "ecc"),
            StateParameter::Inclination => write!(f, "inc"),
            StateParameter::RAAN => write!(f, "raan"),
            StateParameter::AoP => write!(f, "aop"),
        }
    }
}

/// Converts the alpha (in-plane) and beta (out-of-plane) angles in the RSW frame
/// to the unit vector in the RSW frame.
pub(crate) fn unit_vector_from_plane_angles(alpha: f64, beta: f64) -> Vector3<f64> {
    Vector3::new(
        alpha.sin() * beta.cos(),
        alpha.cos() * beta.cos(),
        beta.sin(),
    )
}

/// Returns the Lyapunov-optimal unit thrust direction, in the RSW frame, to change
/// the provided orbital element at the provided osculating orbit.
///
/// These are the per-element laws of IEPC 2011-102 (Ruggiero, Marcuccio and
/// Andrenucci, "Low-Thrust Maneuvers for the Efficient Correction of Orbital
/// Elements"), with the argument of periapsis handled per Petropoulos.
pub fn optimal_direction(parameter: StateParameter, osc: &Orbit) -> Vector3<f64> {
    let ecc = osc.ecc();
    let (sin_ta, cos_ta) = osc.ta_rad().sin_cos();
    match parameter {
        StateParameter::SMA => {
            let alpha = (ecc * sin_ta).atan2(1.0 + ecc * cos_ta);
            unit_vector_from_plane_angles(alpha, 0.0)
        }
        StateParameter::Eccentricity => {
            let (_, cos_ea) = osc.sin_cos_ea();
            let alpha = sin_ta.atan2(cos_ta + cos_ea);
            unit_vector_from_plane_angles(alpha, 0.0)
        }
        StateParameter::Inclination => {
            let beta = half_pi * sign((osc.aop_rad() + osc.ta_rad()).cos());
            unit_vector_from_plane_angles(0.0, beta)
        }
        StateParameter::RAAN => {
            let beta = half_pi * sign((osc.aop_rad() + osc.ta_rad()).sin());
            unit_vector_from_plane_angles(0.0, beta)
        }
        StateParameter::AoP => {
            // In-plane thrusting is most efficient at the Petropoulos true anomaly
            // root, out-of-plane thrusting at the node-symmetric point. Pick the
            // solution whose optimal anomaly is closest to the current one.
            let oe2 = 1.0 - ecc.powi(2);
            let e3 = ecc.powi(3);
            let sqrt_val = (0.25 * (oe2 / e3).powi(2) + 1.0 / 27.0).sqrt();
            let ta_alpha = ((oe2 / (2.0 * e3) + sqrt_val).cbrt()
                - (-oe2 / (2.0 * e3) + sqrt_val).cbrt()
                - 1.0 / ecc)
                .acos();
            let ta_beta = (-ecc * osc.aop_rad().cos()).acos() - osc.aop_rad();
            if (osc.ta_rad() - ta_alpha).abs() < (osc.ta_rad() - ta_beta).abs() {
                let p = osc.semi_parameter();
                let alpha = (-p * cos_ta).atan2((p + osc.rmag()) * sin_ta);
                unit_vector_from_plane_angles(alpha, 0.0)
            } else {
                let beta = half_pi
                    * sign(-(osc.aop_rad() + osc.ta_rad()).sin())
                    * osc.inc_rad().cos();
                unit_vector_from_plane_angles(0.0, beta)
            }
        }
    }
}

/// The rule used by `OptimalDeltaOrbit` to blend the per-element laws.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CombinationMethod {
    /// Weights are the remaining fraction of the correction, per IEPC 2011-102.
    Ruggiero,
    /// Weights are the analytic gain functions of Naasz (cf. Hatten's MSc thesis).
    Naasz,
}

impl fmt::Display for CombinationMethod {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            CombinationMethod::Ruggiero => write!(f, "Ruggiero"),
            CombinationMethod::Naasz => write!(f, "Naasz"),
        }
    }
}

/// Combines the per-element optimal laws to steer the osculating orbit toward a
/// target orbit.
///
/// On the first invocation the law records the initial osculating orbit and, if
/// it was built with the full default set, prunes the elements which are already
/// at their target. The law reports cleared once every active element stopped
/// contributing.
#[derive(Clone, Debug)]
pub struct OptimalDeltaOrbit {
    pub method: CombinationMethod,
    target: Orbit,
    init: Option<Orbit>,
    laws: Vec<StateParameter>,
    from_default_set: bool,
    cleared: bool,
}

impl OptimalDeltaOrbit {
    /// Builds the combined law toward the provided target. An empty law list
    /// requests the full default set.
    pub fn new(target: Orbit, method: CombinationMethod, laws: &[StateParameter]) -> Self {
        let from_default_set = laws.is_empty();
        Self {
            method,
            target,
            init: None,
            laws: if from_default_set {
                StateParameter::ALL.to_vec()
            } else {
                laws.to_vec()
            },
            from_default_set,
            cleared: false,
        }
    }

    /// Whether every active element reported a zero contribution on the last call.
    pub fn cleared(&self) -> bool {
        self.cleared
    }

    /// Returns the blended unit thrust direction in the RSW frame, or zero to coast.
    pub fn control(&mut self, osc: &Orbit) -> Vector3<f64> {
        if self.init.is_none() {
            self.init = Some(osc.clone());
            if self.from_default_set {
                // Do not steer the elements which are already on target.
                let target = &self.target;
                self.laws.retain(|law| {
                    (law.value(osc) - law.value(target)).abs() >= law.tolerance()
                });
            }
            return Vector3::zeros();
        }
        let init = self.init.as_ref().unwrap();

        let mut thrust = Vector3::zeros();
        self.cleared = true;
        for law in &self.laws {
            let osculating = law.value(osc);
            let initial = law.value(init);
            let desired = law.value(&self.target);
            let tol = law.tolerance();
            let factor = match self.method {
                CombinationMethod::Ruggiero => {
                    if (initial - desired).abs() < tol || (osculating - desired).abs() < tol {
                        0.0
                    } else {
                        (desired - osculating) / (desired - initial).abs()
                    }
                }
                CombinationMethod::Naasz => {
                    // The quadratic δO² loses the direction of the correction, so
                    // the sign of the error is carried by the weight.
                    let delta = if (osculating - desired).abs() < tol {
                        0.0
                    } else {
                        osculating - desired
                    };
                    if delta == 0.0 {
                        0.0
                    } else {
                        let p = osc.semi_parameter();
                        let h = osc.hmag();
                        let ecc = osc.ecc();
                        let (sin_aop, cos_aop) = osc.aop_rad().sin_cos();
                        let weight = match law {
                            StateParameter::SMA => {
                                h.powi(2) / (4.0 * osc.sma().powi(4) * (1.0 + ecc).powi(2))
                            }
                            StateParameter::Eccentricity => h.powi(2) / (4.0 * p.powi(2)),
                            StateParameter::Inclination => ((h
                                + ecc * h * (osc.aop_rad() + (ecc * sin_aop).asin()).cos())
                                / (p * ((ecc * sin_aop).powi(2) - 1.0)))
                                .powi(2),
                            StateParameter::RAAN => ((h
                                * osc.inc_rad().sin()
                                * (ecc * (osc.aop_rad() + (ecc * cos_aop).asin()).sin() - 1.0))
                                / (p * (1.0 - (ecc * cos_aop).powi(2))))
                                .powi(2),
                            StateParameter::AoP => {
                                ((ecc * h).powi(2) / (4.0 * p.powi(2)))
                                    * (1.0 - ecc.powi(2) / 4.0)
                            }
                        };
                        0.5 * sign(-delta) * weight * delta.powi(2)
                    }
                }
            };
            if factor != 0.0 {
                self.cleared = false;
                thrust += factor * optimal_direction(*law, osc);
            }
        }

        let norm = thrust.norm();
        if norm > 0.0 {
            thrust / norm
        } else {
            thrust
        }
    }
}

impl fmt::Display for OptimalDeltaOrbit {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "ΔOrbit [{}] toward {}", self.method, self.target)
    }
}

/// A thrust control law: either one of the simple geometric laws or the
/// combined per-element optimal steering.
#[derive(Clone, Debug)]
pub enum ControlLaw {
    /// No thrust.
    Coast,
    /// Thrust along the velocity vector (the optimal Δa direction).
    Tangential,
    /// Thrust against the velocity vector.
    AntiTangential,
    /// Tangential thrust, inverted within the provided angle from apogee while
    /// the orbit is circular enough. Cf. Izzo et al.
    Inversion { from_ta_rad: f64 },
    /// The optimal law for a single orbital element.
    Optimal(StateParameter),
    /// The blended optimal laws toward a target orbit.
    OptimalDeltaOrbit(OptimalDeltaOrbit),
}

impl ControlLaw {
    /// Returns the unit thrust direction in the RSW frame, or zero to coast.
    pub fn control(&mut self, osc: &Orbit) -> Vector3<f64> {
        match self {
            ControlLaw::Coast => Vector3::zeros(),
            ControlLaw::Tangential => optimal_direction(StateParameter::SMA, osc),
            ControlLaw::AntiTangential => -optimal_direction(StateParameter::SMA, osc),
            ControlLaw::Inversion { from_ta_rad } => {
                let ta = osc.ta_rad();
                if osc.ecc() > 0.01
                    || (ta > *from_ta_rad - std::f64::consts::PI
                        && ta < std::f64::consts::PI - *from_ta_rad)
                {
                    optimal_direction(StateParameter::SMA, osc)
                } else {
                    -optimal_direction(StateParameter::SMA, osc)
                }
            }
            ControlLaw::Optimal(parameter) => optimal_direction(*parameter, osc),
            ControlLaw::OptimalDeltaOrbit(delta) => delta.control(osc),
        }
    }
}

impl fmt::Display for ControlLaw {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ControlLaw::Coast => write!(f, "coast"),
            ControlLaw::Tangential => write!(f, "tan"),
            ControlLaw::AntiTangential => write!(f, "aTan"),
            ControlLaw::Inversion { .. } => write!(f, "inversion"),
            ControlLaw::Optimal(parameter) => write!(f, "opti Δ{parameter}"),
            ControlLaw::OptimalDeltaOrbit(delta) => delta.fmt(f),
        }
    }
}
