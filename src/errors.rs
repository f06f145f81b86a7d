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

use crate::time::Epoch;
use thiserror::Error;

/// Represents all possible errors that can occur in the smd library.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SmdError {
    /// Occurs when a thruster is queried outside of its qualified operating envelope.
    #[error("Unsupported thruster operating point: {voltage} V / {power} W")]
    UnsupportedThrusterPoint { voltage: f64, power: f64 },

    /// Occurs when a multi-revolution Lambert transfer is requested.
    #[error("Multi-revolution Lambert transfers are not supported")]
    LambertMultiRevNotSupported,

    /// Occurs when no reasonable phi is found to connect both radii.
    #[error("No reasonable phi found to connect both radii")]
    LambertNotReasonablePhi,

    /// Occurs when the targets in the Lambert solver are too close, i.e. Δν ~=0 and A ~=0.
    #[error("Lambert too close: Δν ~=0 and A ~=0")]
    TargetsTooClose,

    /// Occurs when the maximum number of iterations is reached for a particular operation.
    #[error("Maximum iterations reached: {0}")]
    MaxIterReached(String),

    /// Occurs when there is a math domain error, e.g. non-finite inputs.
    #[error("Math domain error: {0}")]
    MathDomain(String),

    /// Occurs when a celestial object is not found in the catalog or the ephemeris.
    #[error("Celestial object not found: `{0}`")]
    ObjectNotFound(String),

    /// Occurs when the equations of motion return a non-finite derivative.
    #[error("Integration diverged at {dt}: {details}")]
    IntegrationDiverged { dt: Epoch, details: String },

    /// Occurs when there is an error when exporting data.
    #[error("Error when exporting data: {0}")]
    ExportError(String),
}
