//! Scripted traffic.

use rand::{rngs::StdRng, Rng, SeedableRng};
use shared_types::{SimulationFrame, VehicleState};

/// Three vehicles driving east at 5 m/s, 0.1 s steps.
///
/// `veh_0` and `veh_1` stay 50 m apart; `veh_2` is about 400 m away from
/// both.
pub fn convoy(frames: u64) -> Vec<SimulationFrame> {
    (0..frames)
        .map(|step| {
            let dx = step as f64 * 0.5;
            SimulationFrame::new(
                step,
                (step + 1) as f64 * 0.1,
                vec![
                    VehicleState::new("veh_0", dx, 0.0, 5.0, 90.0).with_class("passenger"),
                    VehicleState::new("veh_1", 50.0 + dx, 0.0, 5.0, 90.0)
                        .with_class("passenger"),
                    VehicleState::new("veh_2", 400.0 + dx, 100.0, 5.0, 90.0)
                        .with_class("truck"),
                ],
            )
        })
        .collect()
}

/// `count` vehicles scattered over a `side_m` square, seeded.
pub fn random_vehicles(count: usize, side_m: f64, seed: u64) -> Vec<VehicleState> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count)
        .map(|i| {
            VehicleState::new(
                format!("veh_{i}"),
                rng.gen_range(0.0..side_m),
                rng.gen_range(0.0..side_m),
                rng.gen_range(0.0..30.0),
                rng.gen_range(0.0..360.0),
            )
        })
        .collect()
}
