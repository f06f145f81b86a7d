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

use super::thrustctrl::{CombinationMethod, ControlLaw, OptimalDeltaOrbit, StateParameter};
use crate::cosmic::{Cargo, CelestialObject, Orbit};
use crate::linalg::Vector3;
use crate::time::{Duration, Epoch};
use std::f64::consts::PI;
use std::fmt;

/// The share of the sphere of influence at which an outward spiral is considered escaped.
const SOI_ESCAPE_RATIO: f64 = 0.9;

/// Half-width of the true anomaly window, in radians, within which an impulsive
/// burn point is considered reached. Must be wider than the true anomaly swept
/// during one integration step at periapsis.
const BURN_WINDOW_RAD: f64 = 5e-2;

/// A one-shot side effect executed when its waypoint clears. The effect is
/// queued on the spacecraft and applied between integration steps, because it
/// may invalidate the orbit mid-step.
#[derive(Clone, Debug)]
pub enum WaypointAction {
    /// Add the cargo to the manifest.
    AddCargo(Cargo),
    /// Drop the named cargo from the manifest.
    DropCargo(String),
    /// Switch the orbit to be centered on the provided celestial object.
    RefFrameChange(CelestialObject),
    /// Continue the propagation from the provided orbit.
    Propagate(Orbit),
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum HohmannStatus {
    AwaitFirstBurn,
    TransferCoast,
    Completed,
}

/// A step of the mission plan. The spacecraft holds an ordered list of
/// waypoints and a cursor; each waypoint answers a single query: the thrust
/// direction at the provided osculating orbit and epoch, and whether the
/// waypoint is now cleared.
#[derive(Clone, Debug)]
pub enum Waypoint {
    /// Coast for the provided duration, counted from the first time this
    /// waypoint is evaluated.
    Loiter {
        duration: Duration,
        action: Option<WaypointAction>,
        first_seen: Option<Epoch>,
        cleared: bool,
    },
    /// Steer the osculating orbit toward the target orbit with the blended
    /// per-element optimal laws.
    OrbitTarget {
        action: Option<WaypointAction>,
        ctrl: OptimalDeltaOrbit,
        cleared: bool,
    },
    /// A two-impulse transfer to a circular orbit at the provided radius:
    /// coast to periapsis, burn onto the transfer ellipse, coast to its
    /// apoapsis, circularize.
    HohmannTransfer {
        target_sma_km: f64,
        action: Option<WaypointAction>,
        status: HohmannStatusField,
        pending_impulse: Option<Vector3<f64>>,
        cleared: bool,
    },
    /// Thrust along track until reaching the edge of the sphere of influence
    /// of the provided body.
    OutwardSpiral {
        body: CelestialObject,
        action: Option<WaypointAction>,
        cleared: bool,
    },
    /// Thrust toward a fixed inertial position until within tolerance of it.
    Positional {
        target_km: Vector3<f64>,
        tolerance_km: f64,
        action: Option<WaypointAction>,
        cleared: bool,
    },
}

/// Newtype keeping the Hohmann state machine private to this module.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct HohmannStatusField(HohmannStatus);

impl Waypoint {
    pub fn loiter(duration: Duration, action: Option<WaypointAction>) -> Self {
        Waypoint::Loiter {
            duration,
            action,
            first_seen: None,
            cleared: false,
        }
    }

    /// Builds an orbit-targeting waypoint. An empty law list requests the full
    /// default set, pruned on first evaluation.
    pub fn orbit_target(
        target: Orbit,
        action: Option<WaypointAction>,
        method: CombinationMethod,
        laws: &[StateParameter],
    ) -> Self {
        Waypoint::OrbitTarget {
            action,
            ctrl: OptimalDeltaOrbit::new(target, method, laws),
            cleared: false,
        }
    }

    pub fn hohmann_transfer(target_sma_km: f64, action: Option<WaypointAction>) -> Self {
        Waypoint::HohmannTransfer {
            target_sma_km,
            action,
            status: HohmannStatusField(HohmannStatus::AwaitFirstBurn),
            pending_impulse: None,
            cleared: false,
        }
    }

    pub fn outward_spiral(body: CelestialObject, action: Option<WaypointAction>) -> Self {
        Waypoint::OutwardSpiral {
            body,
            action,
            cleared: false,
        }
    }

    pub fn positional(
        target_km: Vector3<f64>,
        tolerance_km: f64,
        action: Option<WaypointAction>,
    ) -> Self {
        Waypoint::Positional {
            target_km,
            tolerance_km,
            action,
            cleared: false,
        }
    }

    /// Whether this waypoint has been reached.
    pub fn cleared(&self) -> bool {
        match self {
            Waypoint::Loiter { cleared, .. }
            | Waypoint::OrbitTarget { cleared, .. }
            | Waypoint::HohmannTransfer { cleared, .. }
            | Waypoint::OutwardSpiral { cleared, .. }
            | Waypoint::Positional { cleared, .. } => *cleared,
        }
    }

    /// Takes the one-shot action of this waypoint, if any.
    pub(crate) fn take_action(&mut self) -> Option<WaypointAction> {
        match self {
            Waypoint::Loiter { action, .. }
            | Waypoint::OrbitTarget { action, .. }
            | Waypoint::HohmannTransfer { action, .. }
            | Waypoint::OutwardSpiral { action, .. }
            | Waypoint::Positional { action, .. } => action.take(),
        }
    }

    /// Takes the impulsive Δv requested by this waypoint, if any, in km/s in
    /// the inertial frame.
    pub(crate) fn take_impulse(&mut self) -> Option<Vector3<f64>> {
        match self {
            Waypoint::HohmannTransfer {
                pending_impulse, ..
            } => pending_impulse.take(),
            _ => None,
        }
    }

    /// Returns the unit thrust direction in the RSW frame (zero to coast) and
    /// whether this waypoint is now cleared.
    pub fn thrust_direction(&mut self, osc: &Orbit, dt: Epoch) -> (Vector3<f64>, bool) {
        match self {
            Waypoint::Loiter {
                duration,
                first_seen,
                cleared,
                ..
            } => {
                let start = *first_seen.get_or_insert(dt);
                *cleared = start + *duration <= dt;
                (Vector3::zeros(), *cleared)
            }
            Waypoint::OrbitTarget { ctrl, cleared, .. } => {
                let direction = ctrl.control(osc);
                *cleared = ctrl.cleared();
                (direction, *cleared)
            }
            Waypoint::HohmannTransfer {
                target_sma_km,
                status,
                pending_impulse,
                cleared,
                ..
            } => {
                match status.0 {
                    HohmannStatus::AwaitFirstBurn => {
                        // A circular orbit has no periapsis: burn from wherever we are.
                        if osc.ecc() < 1e-3 || ta_from_periapsis(osc) < BURN_WINDOW_RAD {
                            let r_dep = osc.rmag();
                            let a_transfer = (r_dep + *target_sma_km) / 2.0;
                            let v_needed =
                                (osc.origin.gm * (2.0 / r_dep - 1.0 / a_transfer)).sqrt();
                            let v_hat = osc.velocity() / osc.vmag();
                            *pending_impulse = Some((v_needed - osc.vmag()) * v_hat);
                            status.0 = HohmannStatus::TransferCoast;
                            info!(
                                "Hohmann: departure burn of {:.4} km/s at r = {:.1} km",
                                v_needed - osc.vmag(),
                                r_dep
                            );
                        }
                        (Vector3::zeros(), false)
                    }
                    HohmannStatus::TransferCoast => {
                        if (osc.ta_rad() - PI).abs() < BURN_WINDOW_RAD {
                            let r_arr = osc.rmag();
                            let v_circular = (osc.origin.gm / r_arr).sqrt();
                            let v_hat = osc.velocity() / osc.vmag();
                            *pending_impulse = Some((v_circular - osc.vmag()) * v_hat);
                            status.0 = HohmannStatus::Completed;
                            info!(
                                "Hohmann: insertion burn of {:.4} km/s at r = {:.1} km",
                                v_circular - osc.vmag(),
                                r_arr
                            );
                        }
                        (Vector3::zeros(), false)
                    }
                    HohmannStatus::Completed => {
                        *cleared = true;
                        (Vector3::zeros(), true)
                    }
                }
            }
            Waypoint::OutwardSpiral { body, cleared, .. } => {
                if osc.rmag() >= SOI_ESCAPE_RATIO * body.soi {
                    *cleared = true;
                    (ControlLaw::Coast.control(osc), true)
                } else {
                    (ControlLaw::Tangential.control(osc), false)
                }
            }
            Waypoint::Positional {
                target_km,
                tolerance_km,
                cleared,
                ..
            } => {
                let delta = *target_km - osc.radius();
                if delta.norm() < *tolerance_km {
                    *cleared = true;
                    (Vector3::zeros(), true)
                } else {
                    (osc.dcm_inertial_to_rsw() * (delta / delta.norm()), false)
                }
            }
        }
    }
}

/// Returns the absolute true anomaly distance from periapsis, in [0, π].
fn ta_from_periapsis(osc: &Orbit) -> f64 {
    let ta = osc.ta_rad();
    ta.min(2.0 * PI - ta)
}

impl fmt::Display for Waypoint {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Waypoint::Loiter { duration, .. } => write!(f, "Loiter for {duration}"),
            Waypoint::OrbitTarget { ctrl, .. } => write!(f, "{ctrl}"),
            Waypoint::HohmannTransfer { target_sma_km, .. } => {
                write!(f, "Hohmann transfer to a = {target_sma_km} km")
            }
            Waypoint::OutwardSpiral { body, .. } => {
                write!(f, "Outward spiral out of the {body} SOI")
            }
            Waypoint::Positional { target_km, .. } => {
                write!(
                    f,
                    "Reach position [{:.1}, {:.1}, {:.1}] km",
                    target_km[0], target_km[1], target_km[2]
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cosmic::{EARTH, SUN};
    use crate::time::Unit;

    #[test]
    fn loiter_clears_after_duration() {
        let action = WaypointAction::AddCargo(Cargo {
            name: "relay".to_string(),
            mass_kg: 10.0,
        });
        let mut wp = Waypoint::loiter(1 * Unit::Minute, Some(action));
        assert!(!wp.cleared());
        let osc = Orbit::keplerian(7000.0, 0.01, 30.0, 0.0, 0.0, 0.0, EARTH);
        let start = Epoch::from_gregorian_utc_at_midnight(2017, 1, 1);
        let (dv, reached) = wp.thrust_direction(&osc, start);
        assert!(!reached, "loiter waypoint was reached too early");
        assert_eq!(dv.norm(), 0.0, "loiter waypoint requested a velocity change");
        let (dv, reached) = wp.thrust_direction(&osc, start + 1 * Unit::Second);
        assert!(!reached);
        assert_eq!(dv.norm(), 0.0);
        let (dv, reached) = wp.thrust_direction(&osc, start + 1 * Unit::Minute);
        assert!(reached, "loiter waypoint was not reached as it should have been");
        assert_eq!(dv.norm(), 0.0);
        assert!(wp.cleared());
        assert!(wp.take_action().is_some());
        assert!(wp.take_action().is_none(), "action must be one-shot");
        assert!(!wp.to_string().is_empty());
    }

    #[test]
    fn outward_spiral_clears_at_soi_edge() {
        let mut wp = Waypoint::outward_spiral(EARTH, None);
        let start = Epoch::from_gregorian_utc_at_midnight(2017, 1, 1);
        let inside = Orbit::keplerian(100_000.0, 0.01, 1.0, 0.0, 0.0, 0.0, EARTH);
        let (dv, reached) = wp.thrust_direction(&inside, start);
        assert!(!reached, "waypoint was reached too early");
        assert!(dv.norm() > 0.0, "spiral did not request any velocity change");
        let at_edge = Orbit::keplerian(0.95 * EARTH.soi, 0.01, 1.0, 0.0, 0.0, 0.0, EARTH);
        let (dv, reached) = wp.thrust_direction(&at_edge, start);
        assert!(reached, "waypoint was not reached as it should have been");
        assert_eq!(dv.norm(), 0.0, "reached waypoint still returns a velocity change");
    }

    #[test]
    fn positional_steers_and_clears() {
        let osc = Orbit::keplerian(7000.0, 0.001, 10.0, 0.0, 0.0, 0.0, EARTH);
        let start = Epoch::from_gregorian_utc_at_midnight(2017, 1, 1);
        let mut far = Waypoint::positional(osc.radius() * 1.3, 10.0, None);
        let (dv, reached) = far.thrust_direction(&osc, start);
        assert!(!reached);
        // The target is radially outward: the RSW direction is almost pure R.
        assert!(dv[0] > 0.999, "direction = {dv}");
        let mut close = Waypoint::positional(osc.radius(), 10.0, None);
        let (dv, reached) = close.thrust_direction(&osc, start);
        assert!(reached);
        assert_eq!(dv.norm(), 0.0);
    }

    #[test]
    fn hohmann_sequences_two_burns() {
        let start = Epoch::from_gregorian_utc_at_midnight(2017, 1, 1);
        let mut wp = Waypoint::hohmann_transfer(9000.0, None);
        // Circular departure: the first burn fires from wherever we are.
        let circular = Orbit::keplerian(7000.0, 1e-4, 10.0, 0.0, 0.0, 37.0, EARTH);
        let (dv, reached) = wp.thrust_direction(&circular, start);
        assert!(!reached);
        assert_eq!(dv.norm(), 0.0);
        let burn1 = wp.take_impulse().expect("no departure burn requested");
        // Prograde burn of about 0.46 km/s onto the transfer ellipse.
        assert!((burn1.norm() - 0.458).abs() < 5e-3, "Δv1 = {}", burn1.norm());
        assert!(burn1.dot(&circular.velocity()) > 0.0);
        // Mid transfer: nothing to do.
        let coasting = Orbit::keplerian(8000.0, 0.125, 10.0, 0.0, 37.0, 90.0, EARTH);
        let (_, reached) = wp.thrust_direction(&coasting, start);
        assert!(!reached);
        assert!(wp.take_impulse().is_none());
        // At the transfer apoapsis: circularization burn, then cleared.
        let at_apo = Orbit::keplerian(8000.0, 0.125, 10.0, 0.0, 37.0, 180.0, EARTH);
        let (_, reached) = wp.thrust_direction(&at_apo, start);
        assert!(!reached);
        let burn2 = wp.take_impulse().expect("no insertion burn requested");
        assert!((burn2.norm() - 0.430).abs() < 5e-3, "Δv2 = {}", burn2.norm());
        let (dv, reached) = wp.thrust_direction(&at_apo, start);
        assert!(reached);
        assert_eq!(dv.norm(), 0.0);
        assert!(wp.cleared());
    }

    #[test]
    fn frame_change_action() {
        let mut wp = Waypoint::loiter(0 * Unit::Second, Some(WaypointAction::RefFrameChange(SUN)));
        let osc = Orbit::keplerian(7000.0, 0.01, 30.0, 0.0, 0.0, 0.0, EARTH);
        let start = Epoch::from_gregorian_utc_at_midnight(2017, 1, 1);
        let (_, reached) = wp.thrust_direction(&osc, start);
        assert!(reached, "zero-duration loiter must clear on first evaluation");
        match wp.take_action() {
            Some(WaypointAction::RefFrameChange(body)) => assert_eq!(body, SUN),
            other => panic!("wrong action: {other:?}"),
        }
    }
}
