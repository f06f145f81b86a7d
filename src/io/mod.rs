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

use crate::cosmic::{Orbit, Spacecraft};
use crate::linalg::Vector3;
use crate::time::Epoch;
use crate::SmdError;
use serde_derive::{Deserialize, Serialize};
use std::env;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::sync::mpsc::Receiver;

/// Name of the environment variable holding the output directory of the export
/// sinks. This is the only runtime environment read by the library.
pub const OUTPUT_DIR_ENV: &str = "DATAOUT";

/// Configures the state export of a mission. A default configuration disables
/// all sinks and no consumer thread is started.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Prefix of the generated files.
    pub filename: String,
    /// Write the orbital elements CSV sink.
    pub oe: bool,
    /// Write the x-y-z-vx-vy-vz trajectory sink.
    pub traj: bool,
    /// Append the wall-clock timestamp to the prefix, preventing overwrites.
    pub timestamp: bool,
}

impl ExportConfig {
    /// Both canned sinks, under the provided prefix.
    pub fn from_filename(filename: &str) -> Self {
        Self {
            filename: filename.to_string(),
            oe: true,
            traj: true,
            timestamp: false,
        }
    }

    /// Returns whether this configuration would produce no output at all.
    pub fn is_useless(&self) -> bool {
        self.filename.is_empty() || (!self.oe && !self.traj)
    }

    fn prefix(&self) -> String {
        if self.timestamp {
            let stamp = std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .map(|elapsed| elapsed.as_secs())
                .unwrap_or(0);
            format!("{}-{}", self.filename, stamp)
        } else {
            self.filename.clone()
        }
    }
}

/// The kind of an export product, encoded in the file name
/// `{prefix}-{kind}-{index}.{ext}`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ExportKind {
    OrbitalElements,
    Trajectory,
    Catalog,
}

impl ExportKind {
    pub fn token(&self) -> &'static str {
        match self {
            ExportKind::OrbitalElements => "oe",
            ExportKind::Trajectory => "prop",
            ExportKind::Catalog => "catalog",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ExportKind::OrbitalElements => "csv",
            ExportKind::Trajectory => "xyzv",
            ExportKind::Catalog => "json",
        }
    }
}

/// Returns the full path of an export product.
pub fn output_path(prefix: &str, kind: ExportKind, index: usize) -> PathBuf {
    let dir = env::var(OUTPUT_DIR_ENV).unwrap_or_else(|_| ".".to_string());
    PathBuf::from(dir).join(format!(
        "{}-{}-{}.{}",
        prefix,
        kind.token(),
        index,
        kind.extension()
    ))
}

/// A snapshot of the propagated state, owned by value so the export consumer
/// never races the propagator.
#[derive(Clone, Debug)]
pub struct StateRecord {
    pub dt: Epoch,
    pub fuel_kg: f64,
    pub radius_km: Vector3<f64>,
    pub velocity_km_s: Vector3<f64>,
    pub sma_km: f64,
    pub ecc: f64,
    pub inc_deg: f64,
    pub raan_deg: f64,
    pub aop_deg: f64,
    pub ta_deg: f64,
}

impl StateRecord {
    pub fn new(dt: Epoch, vehicle: &Spacecraft, orbit: &Orbit) -> Self {
        let (radius_km, velocity_km_s) = orbit.rv();
        Self {
            dt,
            fuel_kg: vehicle.fuel_mass_kg,
            radius_km,
            velocity_km_s,
            sma_km: orbit.sma(),
            ecc: orbit.ecc(),
            inc_deg: orbit.inc(),
            raan_deg: orbit.raan(),
            aop_deg: orbit.aop(),
            ta_deg: orbit.ta(),
        }
    }
}

/// Consumes state snapshots from the channel until it closes, writing the
/// configured sinks. Run on a dedicated thread: the channel is bounded, so a
/// slow disk back-pressures the propagator instead of losing samples.
pub fn stream_states(conf: ExportConfig, rx: Receiver<StateRecord>) -> Result<(), SmdError> {
    let prefix = conf.prefix();
    let index = next_free_index(&prefix);

    let mut oe_writer = if conf.oe {
        let path = output_path(&prefix, ExportKind::OrbitalElements, index);
        let mut writer = csv::Writer::from_path(&path)
            .map_err(|error| SmdError::ExportError(format!("{}: {error}", path.display())))?;
        writer
            .write_record([
                "t", "x", "y", "z", "vx", "vy", "vz", "a", "e", "i_deg", "raan_deg", "argp_deg",
                "nu_deg", "fuel",
            ])
            .map_err(|error| SmdError::ExportError(error.to_string()))?;
        info!("writing orbital elements to {}", path.display());
        Some(writer)
    } else {
        None
    };

    let mut traj_writer = if conf.traj {
        let path = output_path(&prefix, ExportKind::Trajectory, index);
        let file = File::create(&path)
            .map_err(|error| SmdError::ExportError(format!("{}: {error}", path.display())))?;
        info!("writing trajectory to {}", path.display());
        Some(BufWriter::new(file))
    } else {
        None
    };

    let mut start: Option<Epoch> = None;
    for record in rx {
        let elapsed_s = (record.dt - *start.get_or_insert(record.dt)).to_seconds();
        if let Some(writer) = oe_writer.as_mut() {
            writer
                .write_record([
                    format!("{elapsed_s:.3}"),
                    format!("{:.9}", record.radius_km[0]),
                    format!("{:.9}", record.radius_km[1]),
                    format!("{:.9}", record.radius_km[2]),
                    format!("{:.9}", record.velocity_km_s[0]),
                    format!("{:.9}", record.velocity_km_s[1]),
                    format!("{:.9}", record.velocity_km_s[2]),
                    format!("{:.9}", record.sma_km),
                    format!("{:.9}", record.ecc),
                    format!("{:.9}", record.inc_deg),
                    format!("{:.9}", record.raan_deg),
                    format!("{:.9}", record.aop_deg),
                    format!("{:.9}", record.ta_deg),
                    format!("{:.6}", record.fuel_kg),
                ])
                .map_err(|error| SmdError::ExportError(error.to_string()))?;
        }
        if let Some(writer) = traj_writer.as_mut() {
            writeln!(
                writer,
                "{elapsed_s:.3} {:.9} {:.9} {:.9} {:.9} {:.9} {:.9}",
                record.radius_km[0],
                record.radius_km[1],
                record.radius_km[2],
                record.velocity_km_s[0],
                record.velocity_km_s[1],
                record.velocity_km_s[2]
            )
            .map_err(|error| SmdError::ExportError(error.to_string()))?;
        }
    }

    if let Some(mut writer) = oe_writer.take() {
        writer
            .flush()
            .map_err(|error| SmdError::ExportError(error.to_string()))?;
    }
    if let Some(mut writer) = traj_writer.take() {
        writer
            .flush()
            .map_err(|error| SmdError::ExportError(error.to_string()))?;
    }
    Ok(())
}

fn next_free_index(prefix: &str) -> usize {
    let mut index = 0;
    while output_path(prefix, ExportKind::OrbitalElements, index).exists()
        || output_path(prefix, ExportKind::Trajectory, index).exists()
    {
        index += 1;
    }
    index
}
