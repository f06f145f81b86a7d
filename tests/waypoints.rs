extern crate smd;

use smd::cosmic::{Cargo, Orbit, Spacecraft, EARTH};
use smd::dynamics::{Eps, Thruster, Waypoint, WaypointAction};
use smd::io::ExportConfig;
use smd::propagators::{Mission, Perturbations};
use smd::time::{Epoch, Unit};

/// A loitering mission: the plan is a single timed coast whose action loads a
/// piece of cargo; open-ended propagation stops once the loiter has elapsed.
#[test]
fn loiter_then_load_cargo() {
    let _ = pretty_env_logger::try_init();
    let oinit = Orbit::keplerian(EARTH.radius + 500.0, 0.001, 51.6, 5.0, 10.0, 0.0, EARTH);
    let plan = vec![Waypoint::loiter(
        30 * Unit::Minute,
        Some(WaypointAction::AddCargo(Cargo {
            name: "resupply".to_string(),
            mass_kg: 250.0,
        })),
    )];
    let sc = Spacecraft::new(
        "loiter",
        300.0,
        67.0,
        Eps::Unlimited,
        vec![Thruster::Pps1350],
        Vec::new(),
        plan,
    );
    let start = Epoch::from_gregorian_utc_at_midnight(2017, 1, 1);
    let mut mission = Mission::new(
        sc,
        oinit.clone(),
        start,
        start - 1 * Unit::Nanosecond,
        Perturbations::default(),
        ExportConfig::default(),
    );
    mission.propagate().unwrap();
    assert!(mission.vehicle.all_waypoints_cleared());
    assert!(mission.current_dt - start >= 30 * Unit::Minute);
    assert!(mission.current_dt - start < 31 * Unit::Minute);
    // The cargo action ran exactly once, between steps.
    assert_eq!(mission.vehicle.cargo.len(), 1);
    assert!((mission.vehicle.mass_kg() - 617.0).abs() < 1e-9);
    // Loitering does not burn fuel.
    assert!((mission.vehicle.fuel_mass_kg - 67.0).abs() < 1e-12);
    // A timed coast leaves the orbit shape untouched.
    assert!(mission.orbit.equals(&oinit));
}

/// A two-impulse Hohmann transfer from LEO to a 9000 km circular orbit,
/// executed through the deferred impulse queue.
#[test]
fn hohmann_transfer_mission() {
    let _ = pretty_env_logger::try_init();
    let oinit = Orbit::keplerian(7000.0, 1e-4, 28.5, 10.0, 0.0, 0.0, EARTH);
    let plan = vec![Waypoint::hohmann_transfer(9000.0, None)];
    let sc = Spacecraft::new(
        "hohmann",
        300.0,
        -1.0,
        Eps::Unlimited,
        Vec::new(),
        Vec::new(),
        plan,
    );
    let start = Epoch::from_gregorian_utc_at_midnight(2017, 1, 1);
    let mut mission = Mission::new(
        sc,
        oinit,
        start,
        start - 1 * Unit::Nanosecond,
        Perturbations::default(),
        ExportConfig::default(),
    );
    mission.propagate().unwrap();
    assert!(mission.vehicle.all_waypoints_cleared());
    // The burn windows are a few hundredths of a radian wide, so the insertion
    // is not perfectly circular.
    assert!(
        (mission.orbit.sma() - 9000.0).abs() < 100.0,
        "a = {} km",
        mission.orbit.sma()
    );
    assert!(mission.orbit.ecc() < 0.02, "e = {}", mission.orbit.ecc());
    // Half the transfer ellipse takes just under an hour.
    let elapsed = mission.current_dt - start;
    assert!(elapsed > 50 * Unit::Minute && elapsed < 80 * Unit::Minute);
}

/// Chained waypoints: a short loiter, then an orbit raise; the cursor advances
/// from one to the next and both actions run in order.
#[test]
fn chained_waypoints() {
    let _ = pretty_env_logger::try_init();
    use smd::dynamics::{CombinationMethod, StateParameter};
    let oinit = Orbit::keplerian(24_396.0, 0.001, 0.001, 1.0, 1.0, 1.0, EARTH);
    let otarget = Orbit::keplerian(24_500.0, 0.001, 0.001, 1.0, 1.0, 1.0, EARTH);
    let plan = vec![
        Waypoint::loiter(
            10 * Unit::Minute,
            Some(WaypointAction::AddCargo(Cargo {
                name: "beacon".to_string(),
                mass_kg: 5.0,
            })),
        ),
        Waypoint::orbit_target(
            otarget.clone(),
            Some(WaypointAction::DropCargo("beacon".to_string())),
            CombinationMethod::Ruggiero,
            &[StateParameter::SMA],
        ),
    ];
    let sc = Spacecraft::new(
        "chain",
        300.0,
        67.0,
        Eps::Unlimited,
        vec![Thruster::Pps1350],
        Vec::new(),
        plan,
    );
    let start = Epoch::from_gregorian_utc_at_midnight(2017, 1, 1);
    let mut mission = Mission::new(
        sc,
        oinit,
        start,
        start - 1 * Unit::Nanosecond,
        Perturbations::default(),
        ExportConfig::default(),
    );
    mission.propagate().unwrap();
    assert!(mission.vehicle.all_waypoints_cleared());
    assert!((mission.orbit.sma() - otarget.sma()).abs() < 1.0);
    // The beacon was added by the first waypoint and dropped by the second.
    assert!(mission.vehicle.cargo.is_empty());
    assert!(mission.vehicle.fuel_mass_kg < 67.0);
}
