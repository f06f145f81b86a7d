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

use crate::cosmic::{Orbit, Spacecraft, SUN};
use crate::io::{stream_states, ExportConfig, StateRecord};
use crate::linalg::{SVector, Vector3};
use crate::time::{Duration, Epoch, Unit};
use crate::utils::between_0_tau;
use crate::SmdError;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{channel, sync_channel, Receiver, Sender, SyncSender};
use std::sync::{Arc, Mutex};
use std::thread;
use std::thread::JoinHandle;

/// Default integration step of the mission propagator.
const STEP_SIZE_S: f64 = 10.0;

/// Capacity of the state history channel feeding the export consumer.
const HIST_BUFFER: usize = 1000;

/// The seven-element state integrated by the propagator:
/// (a, e, i, Ω, ω, ν, m_fuel).
type State7 = SVector<f64, 7>;

/// Which zonal harmonic perturbations the propagator applies.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Perturbations {
    pub j2: bool,
    pub j3: bool,
    pub j4: bool,
}

impl Perturbations {
    /// Enables the secular J2 rates only.
    pub fn with_j2() -> Self {
        Self {
            j2: true,
            j3: false,
            j4: false,
        }
    }
}

struct StatusLine {
    dt: Epoch,
    fuel_kg: f64,
    sma_km: f64,
    ecc: f64,
}

/// Mission defines a mission and does the propagation.
///
/// The propagator drives a fixed-step classical Runge-Kutta 4 over the Gauss
/// variational equations, with the specific force supplied by the vehicle's
/// guidance at the start of each step. State snapshots are streamed by value
/// to an optional export consumer over a bounded channel; a periodic status
/// line is logged from a ticker thread while the propagation runs.
pub struct Mission {
    pub vehicle: Spacecraft,
    pub orbit: Orbit,
    pub start_dt: Epoch,
    pub end_dt: Epoch,
    pub current_dt: Epoch,
    pub perts: Perturbations,
    /// Set when the orbit radius dips below the central body's surface.
    pub collided: bool,
    step: Duration,
    stop_tx: Sender<()>,
    stop_rx: Receiver<()>,
    hist_tx: Option<SyncSender<StateRecord>>,
    export_handle: Option<JoinHandle<Result<(), SmdError>>>,
    done: Arc<AtomicBool>,
    status: Arc<Mutex<StatusLine>>,
}

impl Mission {
    /// Builds a new mission. If the export configuration requests any sink, the
    /// consumer thread is started immediately.
    ///
    /// An end date at or before the start date requests an open-ended mission:
    /// the propagation runs until every waypoint has been cleared.
    pub fn new(
        vehicle: Spacecraft,
        orbit: Orbit,
        start_dt: Epoch,
        end_dt: Epoch,
        perts: Perturbations,
        conf: ExportConfig,
    ) -> Self {
        let (stop_tx, stop_rx) = channel();
        let (hist_tx, export_handle) = if conf.is_useless() {
            (None, None)
        } else {
            let (tx, rx) = sync_channel(HIST_BUFFER);
            let handle = thread::spawn(move || stream_states(conf, rx));
            (Some(tx), Some(handle))
        };
        if end_dt <= start_dt {
            warn!("[astro] no end date: propagating until the plan is flown");
        }
        if perts.j3 || perts.j4 {
            warn!("[astro] secular J3/J4 rates are not modeled and will be ignored");
        }
        let status = Arc::new(Mutex::new(StatusLine {
            dt: start_dt,
            fuel_kg: vehicle.fuel_mass_kg,
            sma_km: orbit.sma(),
            ecc: orbit.ecc(),
        }));
        Self {
            vehicle,
            orbit,
            start_dt,
            end_dt,
            current_dt: start_dt,
            perts,
            collided: false,
            step: STEP_SIZE_S * Unit::Second,
            stop_tx,
            stop_rx,
            hist_tx,
            export_handle,
            done: Arc::new(AtomicBool::new(false)),
            status,
        }
    }

    /// Overrides the fixed integration step.
    pub fn with_step(mut self, step: Duration) -> Self {
        self.step = step;
        self
    }

    /// Returns a handle which stops the propagation from another thread. The
    /// stop is honored between integration steps, never mid-step.
    pub fn stop_handle(&self) -> Sender<()> {
        self.stop_tx.clone()
    }

    /// Logs the status of the propagation and vehicle.
    pub fn log_status(&self) {
        info!(
            "[astro] {} fuel: {:.3} kg {}",
            self.current_dt, self.vehicle.fuel_mass_kg, self.orbit
        );
    }

    /// Starts the propagation. Blocks until a stop condition is met, and joins
    /// the export and status threads before returning.
    pub fn propagate(&mut self) -> Result<(), SmdError> {
        self.log_status();
        let v_init = self.orbit.vmag();

        let ticker_done = self.done.clone();
        let ticker_status = self.status.clone();
        let ticker = thread::spawn(move || {
            let mut beats = 0u32;
            loop {
                thread::sleep(std::time::Duration::from_millis(250));
                if ticker_done.load(Ordering::Relaxed) {
                    break;
                }
                beats += 1;
                if beats % 240 == 0 {
                    let line = ticker_status.lock().unwrap();
                    info!(
                        "[astro] {} fuel: {:.3} kg a: {:.3} km e: {:.6}",
                        line.dt, line.fuel_kg, line.sma_km, line.ecc
                    );
                }
            }
        });

        let result = self.advance_loop();
        self.done.store(true, Ordering::Relaxed);

        // Flush the final state and close the channel so the consumer sees EOF.
        if let Some(tx) = self.hist_tx.take() {
            let _ = tx.send(StateRecord::new(
                self.current_dt,
                &self.vehicle,
                &self.orbit,
            ));
        }
        if let Some(handle) = self.export_handle.take() {
            match handle.join() {
                Ok(Err(error)) => error!("[astro] export failed: {error}"),
                Err(_) => error!("[astro] export thread panicked"),
                Ok(Ok(())) => (),
            }
        }
        let _ = ticker.join();

        let elapsed = self.current_dt - self.start_dt;
        info!(
            "[astro] status: finished, duration: {}, Δv: {:.3} km/s",
            elapsed,
            (self.orbit.vmag() - v_init).abs()
        );
        self.log_status();
        if !self.vehicle.unlimited_fuel() && self.vehicle.fuel_mass_kg < 0.0 {
            error!("[prop] fuel: {:.3} kg", self.vehicle.fuel_mass_kg);
        }
        result
    }

    fn advance_loop(&mut self) -> Result<(), SmdError> {
        let open_ended = self.end_dt <= self.start_dt;
        loop {
            // Stop conditions, all checked between steps.
            if self.stop_rx.try_recv().is_ok() {
                info!("[astro] propagation stop requested at {}", self.current_dt);
                return Ok(());
            }
            if open_ended {
                if self.vehicle.all_waypoints_cleared() {
                    return Ok(());
                }
            } else if self.current_dt >= self.end_dt {
                return Ok(());
            }
            // Shorten the last step to land exactly on the end date.
            let step = if open_ended {
                self.step
            } else {
                let remaining = self.end_dt - self.current_dt;
                if remaining < self.step {
                    remaining
                } else {
                    self.step
                }
            };

            if let Some(tx) = &self.hist_tx {
                tx.send(StateRecord::new(
                    self.current_dt,
                    &self.vehicle,
                    &self.orbit,
                ))
                .map_err(|_| SmdError::ExportError("history consumer hung up".to_string()))?;
            }

            // The specific force is held constant across the four RK4 stages: it
            // is a function of the osculating state at the step start.
            let (specific_thrust, fuel_rate) = self.vehicle.accelerate(self.current_dt, &self.orbit);

            let state = self.state_vector();
            let h = step.to_seconds();
            let k1 = self.derivatives(&state, &specific_thrust, fuel_rate)?;
            let k2 = self.derivatives(&(state + k1 * (h / 2.0)), &specific_thrust, fuel_rate)?;
            let k3 = self.derivatives(&(state + k2 * (h / 2.0)), &specific_thrust, fuel_rate)?;
            let k4 = self.derivatives(&(state + k3 * h), &specific_thrust, fuel_rate)?;
            let next = state + (k1 + k2 * 2.0 + k3 * 2.0 + k4) * (h / 6.0);

            self.current_dt = self.current_dt + step;
            self.set_state(&next);

            let mut line = self.status.lock().unwrap();
            line.dt = self.current_dt;
            line.fuel_kg = self.vehicle.fuel_mass_kg;
            line.sma_km = self.orbit.sma();
            line.ecc = self.orbit.ecc();
        }
    }

    fn state_vector(&self) -> State7 {
        State7::from([
            self.orbit.sma(),
            self.orbit.ecc(),
            self.orbit.inc_rad(),
            self.orbit.raan_rad(),
            self.orbit.aop_rad(),
            self.orbit.ta_rad(),
            self.vehicle.fuel_mass_kg,
        ])
    }

    /// The Gauss variational equations with the specific force (f_R, f_S, f_W)
    /// in the RSW frame, plus the secular J2 rates when enabled.
    fn derivatives(
        &self,
        state: &State7,
        specific_thrust: &Vector3<f64>,
        fuel_rate: f64,
    ) -> Result<State7, SmdError> {
        let gm = self.orbit.origin.gm;
        let a = state[0];
        // Eccentricity is a magnitude; the integrator may momentarily push it
        // through zero.
        let ecc = state[1].abs();
        let inc = between_0_tau(state[2]);
        let aop = between_0_tau(state[4]);
        let ta = between_0_tau(state[5]);

        let p = a * (1.0 - ecc.powi(2));
        let h = (gm * p).sqrt();
        let (sin_ta, cos_ta) = ta.sin_cos();
        let r = p / (1.0 + ecc * cos_ta);
        let (sin_i, cos_i) = inc.sin_cos();
        let (sin_u, cos_u) = (aop + ta).sin_cos();
        let f_r = specific_thrust[0];
        let f_s = specific_thrust[1];
        let f_w = specific_thrust[2];

        let mut d = State7::zeros();
        d[0] = ((2.0 * a * a) / h) * (ecc * sin_ta * f_r + (p / r) * f_s);
        d[1] = (p * sin_ta * f_r + f_s * ((p + r) * cos_ta + r * ecc)) / h;
        d[2] = f_w * r * cos_u / h;
        // Zero cross-track force raises no node rate, even on an equatorial orbit.
        d[3] = if f_w == 0.0 {
            0.0
        } else {
            f_w * r * sin_u / (h * sin_i)
        };
        // The 1/e terms vanish with the in-plane force in the circular limit.
        let in_plane = -p * cos_ta * f_r + (p + r) * sin_ta * f_s;
        if in_plane != 0.0 {
            d[4] = in_plane / (h * ecc);
            d[5] = -in_plane / (ecc * h);
        }
        d[4] -= d[3] * cos_i;
        // As per Vallado, page 636 (with the errata of the 4th edition).
        d[5] += h / (r * r);
        d[6] = -fuel_rate;

        if self.perts.j2 && self.orbit.origin.j(2) > 0.0 {
            let n = (gm / a.powi(3)).sqrt();
            let ratio2 = (self.orbit.origin.radius / p).powi(2);
            d[3] += -(3.0 * n * self.orbit.origin.j(2) / 2.0) * ratio2 * cos_i;
            d[4] += -(3.0 * n * self.orbit.origin.j(2) / 4.0)
                * ratio2
                * (5.0 * cos_i.powi(2) - 1.0);
        }

        for (i, value) in d.iter().enumerate() {
            if !value.is_finite() {
                let (radius, velocity) = self.orbit.rv();
                return Err(SmdError::IntegrationDiverged {
                    dt: self.current_dt,
                    details: format!(
                        "d[{i}] = {value} with p = {p} km, h = {h} km^2/s, dv = {specific_thrust:?} km/s^2\n\
                         tentative: a = {a} km, e = {ecc}, i = {inc} rad, ν = {ta} rad\n\
                         current: {}\nR = {radius:?} km\tV = {velocity:?} km/s",
                        self.orbit
                    ),
                });
            }
        }
        Ok(d)
    }

    /// Writes the integrated state back, wraps the angles into [0, 2π), applies
    /// the deferred vehicle actions, and runs the orbit sanity checks.
    fn set_state(&mut self, state: &State7) {
        self.orbit.set_elements(
            state[0],
            state[1].abs(),
            between_0_tau(state[2]),
            between_0_tau(state[3]),
            between_0_tau(state[4]),
            between_0_tau(state[5]),
        );

        self.vehicle.apply_queue(&mut self.orbit, self.current_dt);

        let rmag = self.orbit.rmag();
        if !self.collided && rmag < self.orbit.origin.radius {
            self.collided = true;
            error!(
                "[astro] collided with {} at {}",
                self.orbit.origin.name, self.current_dt
            );
        } else if self.collided && rmag > self.orbit.origin.radius * 1.01 {
            // Now further than the 1% dead zone.
            self.collided = false;
            error!(
                "[astro] revived over {} at {}",
                self.orbit.origin.name, self.current_dt
            );
        } else if rmag > self.orbit.origin.soi {
            info!(
                "[astro] exiting the {} sphere of influence at {}",
                self.orbit.origin.name, self.current_dt
            );
            if let Err(error) = self.orbit.to_centric(SUN, self.current_dt) {
                warn!("[astro] could not become heliocentric: {error}");
            }
        }

        if !self.vehicle.unlimited_fuel() && self.vehicle.fuel_mass_kg > 0.0 && state[6] <= 0.0 {
            error!("[prop] fuel exhausted at {}", self.current_dt);
        }
        self.vehicle.fuel_mass_kg = state[6];
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cosmic::EARTH;

    #[test]
    fn coasting_derivatives_only_move_nu() {
        let vehicle = Spacecraft::empty("test", 1500.0);
        let orbit = Orbit::keplerian(42164.0, 1e-4, 1.0, 5.0, 10.0, 0.0, EARTH);
        let start = Epoch::from_gregorian_utc_at_midnight(2017, 1, 1);
        let mission = Mission::new(
            vehicle,
            orbit,
            start,
            start + 1 * Unit::Day,
            Perturbations::default(),
            ExportConfig::default(),
        );
        let state = mission.state_vector();
        let d = mission
            .derivatives(&state, &Vector3::zeros(), 0.0)
            .unwrap();
        for i in 0..5 {
            assert_eq!(d[i], 0.0, "d[{i}] nonzero while coasting");
        }
        assert!(d[5] > 0.0);
        assert_eq!(d[6], 0.0);
    }

    #[test]
    fn j2_adds_secular_rates() {
        let vehicle = Spacecraft::empty("test", 1500.0);
        let orbit = Orbit::keplerian(42164.1363, 1e-4, 1.0, 5.0, 10.0, 0.0, EARTH);
        let start = Epoch::from_gregorian_utc_at_midnight(2017, 1, 1);
        let mission = Mission::new(
            vehicle,
            orbit,
            start,
            start + 1 * Unit::Day,
            Perturbations::with_j2(),
            ExportConfig::default(),
        );
        let state = mission.state_vector();
        let d = mission
            .derivatives(&state, &Vector3::zeros(), 0.0)
            .unwrap();
        // Nodal regression and (in this formulation) apsidal regression.
        assert!(d[3] < 0.0);
        assert!(d[4] < 0.0);
        // Published GEO nodal regression is about -2.7e-9 rad/s.
        assert!((d[3] + 2.71e-9).abs() < 1e-11, "d[3] = {}", d[3]);
    }

    #[test]
    fn diverging_state_is_reported() {
        let vehicle = Spacecraft::empty("test", 1500.0);
        let orbit = Orbit::keplerian(7000.0, 0.01, 1.0, 5.0, 10.0, 0.0, EARTH);
        let start = Epoch::from_gregorian_utc_at_midnight(2017, 1, 1);
        let mission = Mission::new(
            vehicle,
            orbit,
            start,
            start + 1 * Unit::Day,
            Perturbations::default(),
            ExportConfig::default(),
        );
        let mut state = mission.state_vector();
        state[1] = 1.0; // exactly parabolic: p = 0, so h = 0
        let result = mission.derivatives(&state, &Vector3::new(0.0, 1e-7, 0.0), 0.0);
        assert!(matches!(
            result,
            Err(SmdError::IntegrationDiverged { .. })
        ));
    }
}
