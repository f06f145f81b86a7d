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

/// The thrust direction laws: per-element Lyapunov-optimal steering and their
/// Ruggiero / Naasz combinations.
pub mod thrustctrl;
pub use self::thrustctrl::{
    CombinationMethod, ControlLaw, OptimalDeltaOrbit, StateParameter, SMA_TOLERANCE_KM,
};

/// The propulsion subsystem: thrusters and the electrical power supply.
pub mod propulsion;
pub use self::propulsion::{Eps, Thruster};

/// The waypoint state machine which sequences the mission plan.
pub mod waypoint;
pub use self::waypoint::{Waypoint, WaypointAction};
