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

use super::{CelestialObject, Orbit, STD_GRAVITY};
use crate::dynamics::{Eps, Thruster, Waypoint, WaypointAction};
use crate::linalg::Vector3;
use crate::time::Epoch;
use std::fmt;

/// A piece of cargo carried by the spacecraft, accounted for in the total mass.
#[derive(Clone, Debug, PartialEq)]
pub struct Cargo {
    pub name: String,
    pub mass_kg: f64,
}

/// A side effect queued by the guidance path and applied by the propagator
/// between integration steps, in enqueue order.
#[derive(Clone, Debug)]
pub enum DeferredAction {
    /// Add the Δv, in km/s in the inertial frame, to the current velocity.
    Impulse(Vector3<f64>),
    AddCargo(Cargo),
    DropCargo(String),
    FrameChange(CelestialObject),
    SetOrbit(Orbit),
}

impl From<WaypointAction> for DeferredAction {
    fn from(action: WaypointAction) -> Self {
        match action {
            WaypointAction::AddCargo(cargo) => DeferredAction::AddCargo(cargo),
            WaypointAction::DropCargo(name) => DeferredAction::DropCargo(name),
            WaypointAction::RefFrameChange(body) => DeferredAction::FrameChange(body),
            WaypointAction::Propagate(orbit) => DeferredAction::SetOrbit(orbit),
        }
    }
}

/// Spacecraft defines a vehicle and its mission plan.
///
/// The vehicle owns the waypoint cursor and the deferred-action queue; it is
/// mutated only by the propagator between integration steps.
#[derive(Debug)]
pub struct Spacecraft {
    pub name: String,
    /// in kg
    pub dry_mass_kg: f64,
    /// in kg; a negative value at construction means unlimited fuel
    pub fuel_mass_kg: f64,
    pub eps: Eps,
    pub thrusters: Vec<Thruster>,
    pub cargo: Vec<Cargo>,
    pub waypoints: Vec<Waypoint>,
    wp_idx: usize,
    pub(crate) queue: Vec<DeferredAction>,
    unlimited_fuel: bool,
}

impl Spacecraft {
    /// Builds a spacecraft from all of its subsystems.
    pub fn new(
        name: &str,
        dry_mass_kg: f64,
        fuel_mass_kg: f64,
        eps: Eps,
        thrusters: Vec<Thruster>,
        cargo: Vec<Cargo>,
        waypoints: Vec<Waypoint>,
    ) -> Self {
        Self {
            name: name.to_string(),
            dry_mass_kg,
            fuel_mass_kg,
            eps,
            thrusters,
            cargo,
            waypoints,
            wp_idx: 0,
            queue: Vec::new(),
            unlimited_fuel: fuel_mass_kg < 0.0,
        }
    }

    /// Builds a spacecraft with no thrusters, no fuel, and no plan: it coasts.
    pub fn empty(name: &str, dry_mass_kg: f64) -> Self {
        Self::new(
            name,
            dry_mass_kg,
            -1.0,
            Eps::Unlimited,
            Vec::new(),
            Vec::new(),
            Vec::new(),
        )
    }

    /// Returns the total mass of the vehicle in kg.
    pub fn mass_kg(&self) -> f64 {
        self.dry_mass_kg
            + self.fuel_mass_kg.max(0.0)
            + self.cargo.iter().map(|cargo| cargo.mass_kg).sum::<f64>()
    }

    /// Returns whether the vehicle thrusts regardless of the fuel accounting.
    pub fn unlimited_fuel(&self) -> bool {
        self.unlimited_fuel
    }

    /// Returns the waypoint the guidance is currently flying, if any.
    pub fn current_waypoint(&self) -> Option<&Waypoint> {
        self.waypoints.get(self.wp_idx)
    }

    /// Whether the whole mission plan has been flown.
    pub fn all_waypoints_cleared(&self) -> bool {
        self.waypoints.iter().all(Waypoint::cleared)
    }

    /// Logs the vehicle configuration.
    pub fn log_info(&self) {
        info!(
            "[{}] dry: {} kg, fuel: {} kg, {} thruster(s), {} waypoint(s)",
            self.name,
            self.dry_mass_kg,
            self.fuel_mass_kg,
            self.thrusters.len(),
            self.waypoints.len()
        );
    }

    /// Returns the specific thrust in the RSW frame, in km/s^2, and the fuel
    /// mass flow rate in kg/s, for the provided osculating orbit and epoch.
    ///
    /// This drives the waypoint state machine: cleared waypoints enqueue their
    /// action and advance the cursor, and the thrust request of the active
    /// waypoint is gated by the fuel state and the power budget.
    pub fn accelerate(&mut self, dt: Epoch, osc: &Orbit) -> (Vector3<f64>, f64) {
        loop {
            let Some(waypoint) = self.waypoints.get_mut(self.wp_idx) else {
                return (Vector3::zeros(), 0.0);
            };
            let (direction, cleared) = waypoint.thrust_direction(osc, dt);
            if let Some(delta_v) = waypoint.take_impulse() {
                self.queue.push(DeferredAction::Impulse(delta_v));
            }
            if cleared {
                info!("[{}] waypoint reached: {}", self.name, waypoint);
                if let Some(action) = waypoint.take_action() {
                    self.queue.push(action.into());
                }
                self.wp_idx += 1;
                continue;
            }
            if direction.norm() == 0.0 {
                return (Vector3::zeros(), 0.0);
            }
            if !self.unlimited_fuel && self.fuel_mass_kg <= 0.0 {
                return (Vector3::zeros(), 0.0);
            }

            // Fire every thruster the power budget can sustain at its full rating.
            let mut available_w = self.eps.available_power(dt);
            let mut thrust_n = 0.0;
            let mut fuel_rate = 0.0;
            for thruster in &self.thrusters {
                let (voltage, power) = thruster.max();
                if available_w >= power {
                    if let Ok((thrust, isp)) = thruster.thrust(voltage, power) {
                        available_w -= power;
                        thrust_n += thrust;
                        fuel_rate += thrust / (isp * STD_GRAVITY);
                    }
                }
            }
            if thrust_n == 0.0 {
                return (Vector3::zeros(), 0.0);
            }
            // N/kg is m/s^2; the state equations are in km.
            let specific_thrust = direction * (thrust_n / self.mass_kg()) * 1e-3;
            return (specific_thrust, fuel_rate);
        }
    }

    /// Applies the deferred actions, in enqueue order, to this vehicle and to
    /// the provided orbit. Called by the propagator between integration steps.
    pub(crate) fn apply_queue(&mut self, orbit: &mut Orbit, dt: Epoch) {
        for action in std::mem::take(&mut self.queue) {
            match action {
                DeferredAction::Impulse(delta_v) => {
                    let (radius, velocity) = orbit.rv();
                    *orbit = Orbit::cartesian(radius, velocity + delta_v, orbit.origin);
                }
                DeferredAction::AddCargo(cargo) => {
                    info!("[{}] cargo added: {} ({} kg)", self.name, cargo.name, cargo.mass_kg);
                    self.cargo.push(cargo);
                }
                DeferredAction::DropCargo(name) => {
                    info!("[{}] cargo dropped: {}", self.name, name);
                    self.cargo.retain(|cargo| cargo.name != name);
                }
                DeferredAction::FrameChange(body) => {
                    if let Err(error) = orbit.to_centric(body, dt) {
                        warn!("[{}] frame change failed: {}", self.name, error);
                    } else {
                        info!("[{}] now {} centered", self.name, body.name);
                    }
                }
                DeferredAction::SetOrbit(new_orbit) => {
                    info!("[{}] orbit overwritten: {}", self.name, new_orbit);
                    *orbit = new_orbit;
                }
            }
        }
    }
}

impl fmt::Display for Spacecraft {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} ({:.1} kg)", self.name, self.mass_kg())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cosmic::EARTH;
    use crate::dynamics::CombinationMethod;
    use crate::dynamics::StateParameter;

    #[test]
    fn empty_sc_coasts() {
        let mut sc = Spacecraft::empty("test", 1500.0);
        assert!(sc.unlimited_fuel());
        assert!(sc.all_waypoints_cleared());
        let osc = Orbit::keplerian(7000.0, 0.01, 30.0, 0.0, 0.0, 0.0, EARTH);
        let dt = Epoch::from_gregorian_utc_at_midnight(2017, 1, 1);
        let (thrust, fuel_rate) = sc.accelerate(dt, &osc);
        assert_eq!(thrust.norm(), 0.0);
        assert_eq!(fuel_rate, 0.0);
    }

    #[test]
    fn thrusts_toward_target_and_counts_fuel() {
        let target = Orbit::keplerian(42164.0, 0.001, 0.001, 1.0, 1.0, 1.0, EARTH);
        let osc = Orbit::keplerian(24396.0, 0.001, 0.001, 1.0, 1.0, 1.0, EARTH);
        let mut sc = Spacecraft::new(
            "COE",
            300.0,
            67.0,
            Eps::Unlimited,
            vec![Thruster::Pps1350],
            Vec::new(),
            vec![Waypoint::orbit_target(
                target,
                None,
                CombinationMethod::Ruggiero,
                &[StateParameter::SMA],
            )],
        );
        let dt = Epoch::from_gregorian_utc_at_midnight(2017, 1, 1);
        // First evaluation records the initial orbit: coast.
        let (thrust, _) = sc.accelerate(dt, &osc);
        assert_eq!(thrust.norm(), 0.0);
        let (thrust, fuel_rate) = sc.accelerate(dt, &osc);
        // 140 mN over 367 kg.
        assert!((thrust.norm() - 0.140 / 367.0 * 1e-3).abs() < 1e-12);
        assert!((fuel_rate - 0.140 / (1800.0 * STD_GRAVITY)).abs() < 1e-12);
        // Without enough bus power, the thruster does not fire.
        sc.eps = Eps::FixedBus { power_w: 1000.0 };
        let (thrust, fuel_rate) = sc.accelerate(dt, &osc);
        assert_eq!(thrust.norm(), 0.0);
        assert_eq!(fuel_rate, 0.0);
    }

    #[test]
    fn deferred_impulse_is_applied_between_steps() {
        let mut sc = Spacecraft::empty("imp", 100.0);
        let mut orbit = Orbit::keplerian(7000.0, 0.01, 30.0, 10.0, 20.0, 30.0, EARTH);
        let dt = Epoch::from_gregorian_utc_at_midnight(2017, 1, 1);
        let v_before = orbit.velocity();
        sc.queue.push(DeferredAction::Impulse(Vector3::new(0.0, 0.0, 1.0)));
        sc.apply_queue(&mut orbit, dt);
        let v_after = orbit.velocity();
        assert!(((v_after - v_before) - Vector3::new(0.0, 0.0, 1.0)).norm() < 1e-12);
    }

    #[test]
    fn cargo_actions() {
        let mut sc = Spacecraft::empty("cargo", 100.0);
        let mut orbit = Orbit::keplerian(7000.0, 0.01, 30.0, 10.0, 20.0, 30.0, EARTH);
        let dt = Epoch::from_gregorian_utc_at_midnight(2017, 1, 1);
        sc.queue.push(DeferredAction::AddCargo(Cargo {
            name: "sample".to_string(),
            mass_kg: 12.0,
        }));
        sc.apply_queue(&mut orbit, dt);
        assert!((sc.mass_kg() - 112.0).abs() < 1e-12);
        sc.queue
            .push(DeferredAction::DropCargo("sample".to_string()));
        sc.apply_queue(&mut orbit, dt);
        assert!((sc.mass_kg() - 100.0).abs() < 1e-12);
    }
}
