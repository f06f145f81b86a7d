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

/*! # smd

Space mission design: waypoint-driven low-thrust guidance, Gauss variational
propagation across spheres of influence, and universal-variable Lambert
targeting for interplanetary transfers.
*/

/// Provides the celestial body catalog, the dual-representation `Orbit`, and the `Spacecraft`.
pub mod cosmic;

/// Provides the thrust control laws, the propulsion subsystem, and the waypoint state machine.
pub mod dynamics;

mod errors;
/// smd will (almost) never panic and functions which may fail will return an error.
pub use self::errors::SmdError;

/// State export: configuration record and the background CSV / trajectory sinks.
pub mod io;

/// Ground station range and range-rate measurements.
pub mod od;

/// The mission-level propagator: fixed-step RK4 over the Gauss variational equations.
pub mod propagators;

/// Simple tools (e.g. Lambert solver)
pub mod tools;

/// Utility functions shared by different modules, and which may be useful to engineers.
pub mod utils;

#[macro_use]
extern crate log;
extern crate hifitime;
extern crate nalgebra as na;

/// Re-export of hifitime
pub mod time {
    pub use hifitime::*;
}

/// Re-export nalgebra
pub mod linalg {
    pub use na::base::*;
}

/// Re-export some useful things
pub use self::cosmic::{CelestialObject, Orbit, Spacecraft, EARTH, JUPITER, MARS, SUN, VENUS};
pub use self::propagators::Mission;
