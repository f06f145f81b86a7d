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

use crate::cosmic::CelestialObject;
use crate::linalg::Vector3;
use crate::time::Duration;
use crate::SmdError;
use std::f64::consts::PI;
use std::fmt;

const TAU: f64 = 2.0 * PI;
const LAMBERT_EPSILON: f64 = 1e-4; // General epsilon
const LAMBERT_EPSILON_TIME: f64 = 1e-6; // Time of flight epsilon, in seconds
const LAMBERT_EPSILON_RAD: f64 = (5e-5 / 180.0) * PI; // 0.00005 degrees
/// Maximum number of iterations allowed in the Lambert problem solver.
/// This is a safety measure to prevent infinite loops in case a solution cannot be found.
const MAX_ITERATIONS: usize = 1000;

/// Define the transfer kind for a Lambert boundary-value problem.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TransferType {
    /// Picks the direction of motion from the true anomaly difference.
    Auto,
    /// Short way, prograde.
    T1,
    /// Long way, retrograde.
    T2,
    /// Long way, prograde, one revolution. Not supported.
    T3,
    /// Short way, retrograde, one revolution. Not supported.
    T4,
}

impl TransferType {
    /// Calculate the direction-of-motion multiplier based on the transfer type.
    fn direction_of_motion(
        self,
        r_init: &Vector3<f64>,
        r_final: &Vector3<f64>,
    ) -> Result<f64, SmdError> {
        match self {
            TransferType::Auto => {
                let mut dnu = r_final[1].atan2(r_final[0]) - r_init[1].atan2(r_init[0]);
                if dnu > TAU {
                    dnu -= TAU;
                } else if dnu < 0.0 {
                    dnu += TAU;
                }
                if dnu > PI {
                    Ok(-1.0)
                } else {
                    Ok(1.0)
                }
            }
            TransferType::T1 => Ok(1.0),
            TransferType::T2 => Ok(-1.0),
            TransferType::T3 | TransferType::T4 => Err(SmdError::LambertMultiRevNotSupported),
        }
    }
}

impl fmt::Display for TransferType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TransferType::Auto => write!(f, "auto"),
            TransferType::T1 => write!(f, "type-1"),
            TransferType::T2 => write!(f, "type-2"),
            TransferType::T3 => write!(f, "type-3"),
            TransferType::T4 => write!(f, "type-4"),
        }
    }
}

/// The velocities solving the boundary-value problem, along with the final
/// value of the universal variable ψ.
#[derive(Clone, Debug, PartialEq)]
pub struct LambertSolution {
    pub v_init: Vector3<f64>,
    pub v_final: Vector3<f64>,
    pub psi: f64,
}

/// Solves the two-point boundary-value problem in the universal-variable
/// formulation, with bisection on ψ and the Stumpff functions C(ψ), S(ψ).
///
/// Given the initial and final radii and a time of flight, returns the needed
/// initial and final velocities around the provided celestial object.
pub fn lambert(
    r_init: Vector3<f64>,
    r_final: Vector3<f64>,
    tof: Duration,
    kind: TransferType,
    origin: CelestialObject,
) -> Result<LambertSolution, SmdError> {
    let tof_s = tof.to_seconds();
    if !(r_init.iter().all(|x| x.is_finite()) && r_final.iter().all(|x| x.is_finite())) {
        return Err(SmdError::MathDomain(
            "Lambert radii must be finite".to_string(),
        ));
    }
    if tof_s <= 0.0 {
        return Err(SmdError::MathDomain(
            "Lambert time of flight must be strictly positive".to_string(),
        ));
    }
    let gm = origin.gm;

    let r_init_norm = r_init.norm();
    let r_final_norm = r_final.norm();
    let r_norm_product = r_init_norm * r_final_norm;
    let cos_dnu = r_init.dot(&r_final) / r_norm_product;

    let dm = kind.direction_of_motion(&r_init, &r_final)?;

    let nu_init = r_init[1].atan2(r_init[0]);
    let nu_final = r_final[1].atan2(r_final[0]);

    let a = dm * (r_norm_product * (1.0 + cos_dnu)).sqrt();

    if nu_final - nu_init < LAMBERT_EPSILON_RAD && a.abs() < LAMBERT_EPSILON {
        return Err(SmdError::TargetsTooClose);
    }

    let mut psi_upper = 4.0 * PI.powi(2);
    let mut psi_lower = -4.0 * PI.powi(2);
    let mut psi = 0.0;

    let mut c2: f64 = 1.0 / 2.0;
    let mut c3: f64 = 1.0 / 6.0;
    let mut iter: usize = 0;
    let mut cur_tof: f64 = 0.0;
    let mut y = 0.0;

    while (cur_tof - tof_s).abs() > LAMBERT_EPSILON_TIME {
        if iter > MAX_ITERATIONS {
            return Err(SmdError::MaxIterReached(format!(
                "Lambert solver failed after {MAX_ITERATIONS} iterations"
            )));
        }
        iter += 1;

        y = r_init_norm + r_final_norm + a * (psi * c3 - 1.0) / c2.sqrt();
        if a > 0.0 && y < 0.0 {
            // Adjust ψ upward until y is no longer negative.
            for _ in 0..500 {
                psi += 0.1;
                y = r_init_norm + r_final_norm + a * (psi * c3 - 1.0) / c2.sqrt();
                if y >= 0.0 {
                    break;
                }
            }
            if y < 0.0 {
                return Err(SmdError::LambertNotReasonablePhi);
            }
        }

        let chi = (y / c2).sqrt();
        cur_tof = (chi.powi(3) * c3 + a * y.sqrt()) / gm.sqrt();

        if cur_tof < tof_s {
            psi_lower = psi;
        } else {
            psi_upper = psi;
        }

        psi = (psi_upper + psi_lower) / 2.0;

        if psi > LAMBERT_EPSILON {
            let sqrt_psi = psi.sqrt();
            let (s_spsi, c_spsi) = sqrt_psi.sin_cos();
            c2 = (1.0 - c_spsi) / psi;
            c3 = (sqrt_psi - s_spsi) / psi.powi(3).sqrt();
        } else if psi < -LAMBERT_EPSILON {
            let sqrt_psi = (-psi).sqrt();
            c2 = (1.0 - sqrt_psi.cosh()) / psi;
            c3 = (sqrt_psi.sinh() - sqrt_psi) / (-psi).powi(3).sqrt();
        } else {
            c2 = 0.5;
            c3 = 1.0 / 6.0;
        }
    }

    let f = 1.0 - y / r_init_norm;
    let g_dot = 1.0 - y / r_final_norm;
    let g = a * (y / gm).sqrt();

    Ok(LambertSolution {
        v_init: (r_final - f * r_init) / g,
        v_final: (1.0 / g) * (g_dot * r_final - r_init),
        psi,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cosmic::EARTH;
    use crate::time::Unit;

    #[test]
    fn lambert_vallado_shortway() {
        // From Vallado 4th edition, page 497.
        let ri = Vector3::new(15945.34, 0.0, 0.0);
        let rf = Vector3::new(12214.83899, 10249.46731, 0.0);
        let exp_vi = Vector3::new(2.058913, 2.915965, 0.0);
        let exp_vf = Vector3::new(-3.451565, 0.910315, 0.0);

        for kind in [TransferType::Auto, TransferType::T1] {
            let sol = lambert(ri, rf, 76 * Unit::Minute, kind, EARTH).unwrap();
            assert!((sol.v_init - exp_vi).norm() < 1e-6, "[{kind}] ψ = {}", sol.psi);
            assert!((sol.v_final - exp_vf).norm() < 1e-6, "[{kind}] ψ = {}", sol.psi);
        }
    }

    #[test]
    fn lambert_vallado_longway() {
        let ri = Vector3::new(15945.34, 0.0, 0.0);
        let rf = Vector3::new(12214.83899, 10249.46731, 0.0);
        let exp_vi = Vector3::new(-3.811158, -2.003854, 0.0);
        let exp_vf = Vector3::new(4.207569, 0.914724, 0.0);

        let sol = lambert(ri, rf, 76 * Unit::Minute, TransferType::T2, EARTH).unwrap();
        assert!((sol.v_init - exp_vi).norm() < 1e-6, "ψ = {}", sol.psi);
        assert!((sol.v_final - exp_vf).norm() < 1e-6, "ψ = {}", sol.psi);
    }

    #[test]
    fn lambert_rejects_multirev_and_bad_inputs() {
        let ri = Vector3::new(15945.34, 0.0, 0.0);
        let rf = Vector3::new(12214.83899, 10249.46731, 0.0);
        for kind in [TransferType::T3, TransferType::T4] {
            assert_eq!(
                lambert(ri, rf, 76 * Unit::Minute, kind, EARTH),
                Err(SmdError::LambertMultiRevNotSupported)
            );
        }
        assert!(matches!(
            lambert(ri, rf, -1 * Unit::Minute, TransferType::T1, EARTH),
            Err(SmdError::MathDomain(_))
        ));
        assert!(matches!(
            lambert(
                Vector3::new(f64::NAN, 0.0, 0.0),
                rf,
                76 * Unit::Minute,
                TransferType::T1,
                EARTH
            ),
            Err(SmdError::MathDomain(_))
        ));
    }
}
