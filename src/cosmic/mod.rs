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

/// One astronomical unit, in kilometers.
pub const AU: f64 = 149_597_870.0;

/// Standard gravity in m/s^2, from NIST special publication 330, 2008 edition.
pub const STD_GRAVITY: f64 = 9.80665;

mod bodies;
pub use self::bodies::{CelestialObject, EARTH, JUPITER, MARS, SUN, VENUS};

mod orbit;
pub use self::orbit::{Orbit, ANGLE_EPSILON_RAD, DISTANCE_EPSILON_KM, ECC_EPSILON};

mod spacecraft;
pub use self::spacecraft::{Cargo, DeferredAction, Spacecraft};
