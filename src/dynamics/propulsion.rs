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

use crate::cosmic::STD_GRAVITY;
use crate::time::Epoch;
use crate::SmdError;
use std::fmt;

/// An electric thruster of the vehicle. A thruster is qualified between its
/// minimum and maximum voltage and power operating points, and reports its
/// thrust in Newtons and specific impulse in seconds at a given point.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Thruster {
    /// The Snecma thruster flown on SMART-1.
    /// Source: http://www.esa.int/esapub/bulletin/bulletin129/bul129e_estublier.pdf
    Pps1350,
    /// A generic electric propulsion thruster with a fixed thrust and Isp.
    GenericEp { thrust_n: f64, isp_s: f64 },
}

impl Thruster {
    /// Returns the minimum voltage (V) and power (W) requirements for this thruster.
    pub fn min(&self) -> (f64, f64) {
        match self {
            Thruster::Pps1350 => self.max(),
            Thruster::GenericEp { .. } => (0.0, 0.0),
        }
    }

    /// Returns the maximum voltage (V) and power (W) requirements for this thruster.
    pub fn max(&self) -> (f64, f64) {
        match self {
            Thruster::Pps1350 => (350.0, 2500.0),
            Thruster::GenericEp { .. } => (0.0, 0.0),
        }
    }

    /// Returns the thrust in Newtons and the specific impulse in seconds at the
    /// provided operating point.
    pub fn thrust(&self, voltage: f64, power: f64) -> Result<(f64, f64), SmdError> {
        match self {
            Thruster::Pps1350 => {
                if voltage == 350.0 && power == 2500.0 {
                    Ok((140.0 * 1e-3, 1800.0))
                } else {
                    Err(SmdError::UnsupportedThrusterPoint { voltage, power })
                }
            }
            Thruster::GenericEp { thrust_n, isp_s } => Ok((*thrust_n, *isp_s)),
        }
    }

    /// Returns the fuel mass flow rate in kg/s at the provided operating point.
    pub fn fuel_rate(&self, voltage: f64, power: f64) -> Result<f64, SmdError> {
        let (thrust_n, isp_s) = self.thrust(voltage, power)?;
        Ok(thrust_n / (isp_s * STD_GRAVITY))
    }
}

impl fmt::Display for Thruster {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Thruster::Pps1350 => write!(f, "PPS-1350"),
            Thruster::GenericEp { thrust_n, isp_s } => {
                write!(f, "EP ({thrust_n} N, {isp_s} s)")
            }
        }
    }
}

/// The electrical power supply of the vehicle. The EPS gates which thrusters
/// may fire: a thruster is powered only if the remaining budget covers its
/// maximum power draw.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Eps {
    /// Provides any amount of power at any time.
    Unlimited,
    /// A constant power bus.
    FixedBus { power_w: f64 },
}

impl Eps {
    /// Returns the power available, in Watts, at the provided epoch.
    pub fn available_power(&self, _dt: Epoch) -> f64 {
        match self {
            Eps::Unlimited => f64::INFINITY,
            Eps::FixedBus { power_w } => *power_w,
        }
    }
}
