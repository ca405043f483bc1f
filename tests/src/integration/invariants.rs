//! # Invariant Sweeps
//!
//! Drives the service with seeded random operation sequences and checks the
//! committed state after every step:
//!
//! - at most one train is `InCrossing`, and only while the crossing is
//!   `Locked` with no vehicle inside
//! - a vehicle operation changes at most one grid cell
//! - train arbitration never touches the grid
//! - with several crossings sharing one train set, each crossing is held by
//!   at most the one train it was last granted to

#[cfg(test)]
mod tests {
    use crate::fixtures::*;
    use lc_crossing_contract::prelude::*;
    use lc_crossing_contract::domain::invariants::check_single_cell_delta_invariant;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use std::collections::HashMap;

    const CROSSING: &str = "1001";
    const TRAINS: [&str; 3] = ["T1", "T2", "T3"];
    const PLATES: [&str; 5] = ["CAR-1", "CAR-2", "CAR-3", "CAR-4", "CAR-5"];

    #[derive(Debug, Clone, Copy)]
    enum Step {
        RequestSlot(usize),
        ReleaseSlot(usize, usize),
        RequestCrossing(usize),
        ReleaseCrossing(usize),
        Tick(u64),
    }

    fn random_step(rng: &mut StdRng, lanes: usize, capacity: usize) -> Step {
        match rng.gen_range(0..10) {
            0..=2 => Step::RequestSlot(rng.gen_range(0..PLATES.len())),
            3..=4 => Step::ReleaseSlot(rng.gen_range(0..lanes), rng.gen_range(0..capacity)),
            5..=6 => Step::RequestCrossing(rng.gen_range(0..TRAINS.len())),
            7 => Step::ReleaseCrossing(rng.gen_range(0..TRAINS.len())),
            _ => Step::Tick(rng.gen_range(1..15)),
        }
    }

    fn snapshot(service: &CrossingService<ManualClock>) -> (Crossing, Vec<Train>) {
        let crossing = stored_crossing(service.world(), CROSSING);
        let trains = TRAINS
            .iter()
            .map(|id| stored_train(service.world(), id))
            .collect();
        (crossing, trains)
    }

    fn run_sequence(seed: u64, steps: usize) {
        let mut rng = StdRng::seed_from_u64(seed);
        let lanes = rng.gen_range(1..3);
        let capacity = rng.gen_range(1..4);

        let service = service();
        seed_crossing(&service, CROSSING, CrossingStatus::FreeToCross, u64::MAX / 2, lanes, capacity);
        for (i, id) in TRAINS.iter().enumerate() {
            seed_train(&service, id, 10 + 10 * i as u64);
        }

        for step_index in 0..steps {
            let step = random_step(&mut rng, lanes, capacity);
            let (before, _) = snapshot(&service);

            // Protocol denials and invalid releases are expected; safety is what we check
            let _ = match step {
                Step::RequestSlot(p) => request_slot(&service, PLATES[p], CROSSING).map(|_| ()),
                Step::ReleaseSlot(lane, slot) => {
                    release_slot(&service, PLATES[0], CROSSING, lane as i64, slot as i64)
                }
                Step::RequestCrossing(t) => request_crossing(&service, CROSSING, TRAINS[t]).map(|_| ()),
                Step::ReleaseCrossing(t) => release_crossing(&service, CROSSING, TRAINS[t]).map(|_| ()),
                Step::Tick(secs) => {
                    service.clock().advance(secs);
                    Ok(())
                }
            };

            let (after, trains) = snapshot(&service);
            let result = check_all_invariants(&after, &trains);
            assert!(
                result.is_valid(),
                "seed {seed} step {step_index} ({step:?}): {result:?}"
            );
            assert!(
                check_single_cell_delta_invariant(&before, &after),
                "seed {seed} step {step_index} ({step:?}) changed more than one cell"
            );
            if matches!(step, Step::RequestCrossing(_) | Step::ReleaseCrossing(_)) {
                assert_eq!(before.lanes, after.lanes, "arbitration touched the grid");
            }
        }
    }

    #[test]
    fn test_random_sequences_preserve_invariants() {
        for seed in 0..40 {
            run_sequence(seed, 150);
        }
    }

    // =========================================================================
    // SHARED TRAINS, SEVERAL CROSSINGS
    // =========================================================================

    const NETWORK: [&str; 2] = ["A", "B"];

    #[derive(Debug, Clone, Copy)]
    enum NetworkStep {
        RequestSlot(usize, usize),
        ReleaseSlot(usize, usize, usize),
        RequestCrossing(usize, usize),
        ReleaseCrossing(usize, usize),
        Tick(u64),
    }

    fn random_network_step(rng: &mut StdRng, capacity: usize) -> NetworkStep {
        let crossing = rng.gen_range(0..NETWORK.len());
        match rng.gen_range(0..10) {
            0..=1 => NetworkStep::RequestSlot(crossing, rng.gen_range(0..PLATES.len())),
            2..=3 => NetworkStep::ReleaseSlot(crossing, 0, rng.gen_range(0..capacity)),
            4..=6 => NetworkStep::RequestCrossing(crossing, rng.gen_range(0..TRAINS.len())),
            7..=8 => NetworkStep::ReleaseCrossing(crossing, rng.gen_range(0..TRAINS.len())),
            _ => NetworkStep::Tick(rng.gen_range(1..15)),
        }
    }

    fn run_network_sequence(seed: u64, steps: usize) {
        let mut rng = StdRng::seed_from_u64(seed);
        let capacity = rng.gen_range(1..3);

        let service = service();
        for id in NETWORK {
            seed_crossing(&service, id, CrossingStatus::FreeToCross, u64::MAX / 2, 1, capacity);
        }
        for (i, id) in TRAINS.iter().enumerate() {
            seed_train(&service, id, 10 + 10 * i as u64);
        }

        // Train each crossing was last granted to and has not released
        let mut granted: HashMap<&str, Option<&str>> =
            NETWORK.iter().map(|id| (*id, None)).collect();

        for step_index in 0..steps {
            let step = random_network_step(&mut rng, capacity);
            let before: Vec<Crossing> = NETWORK
                .iter()
                .map(|id| stored_crossing(service.world(), id))
                .collect();

            match step {
                NetworkStep::RequestSlot(c, p) => {
                    let _ = request_slot(&service, PLATES[p], NETWORK[c]);
                }
                NetworkStep::ReleaseSlot(c, lane, slot) => {
                    let _ = release_slot(&service, PLATES[0], NETWORK[c], lane as i64, slot as i64);
                }
                NetworkStep::RequestCrossing(c, t) => {
                    let outcome = request_crossing(&service, NETWORK[c], TRAINS[t]).unwrap();
                    if outcome.is_granted() {
                        let previous = granted.insert(NETWORK[c], Some(TRAINS[t])).flatten();
                        assert_eq!(
                            previous, None,
                            "seed {seed} step {step_index}: {} granted {} while held by {previous:?}",
                            TRAINS[t], NETWORK[c]
                        );
                    }
                }
                NetworkStep::ReleaseCrossing(c, t) => {
                    if release_crossing(&service, NETWORK[c], TRAINS[t]).unwrap() {
                        assert_eq!(granted[NETWORK[c]], Some(TRAINS[t]));
                        granted.insert(NETWORK[c], None);
                    }
                }
                NetworkStep::Tick(secs) => service.clock().advance(secs),
            }

            for (i, id) in NETWORK.iter().enumerate() {
                let after = stored_crossing(service.world(), id);
                let holders: Vec<Train> = granted[id]
                    .iter()
                    .map(|train_id| stored_train(service.world(), train_id))
                    .collect();

                let result = check_all_invariants(&after, &holders);
                assert!(
                    result.is_valid(),
                    "seed {seed} step {step_index} ({step:?}) crossing {id}: {result:?}"
                );
                assert!(check_single_cell_delta_invariant(&before[i], &after));
                if let Some(train_id) = granted[id] {
                    assert_eq!(after.status, CrossingStatus::Locked);
                    assert_eq!(after.holder.as_deref(), Some(train_id));
                }
            }
        }
    }

    #[test]
    fn test_random_sequences_across_crossings() {
        for seed in 0..40 {
            run_network_sequence(seed, 200);
        }
    }

    #[test]
    fn test_every_holder_eventually_released() {
        let service = service();
        seed_crossing(&service, CROSSING, CrossingStatus::FreeToCross, u64::MAX / 2, 1, 2);
        for id in TRAINS {
            seed_train(&service, id, 1_000);
        }

        // Trains take turns; each grant must be followed by its own release
        for _round in 0..3 {
            for id in TRAINS {
                assert!(request_crossing(&service, CROSSING, id).unwrap().is_granted());
                let (crossing, trains) = snapshot(&service);
                assert!(check_mutual_exclusion_invariant(&crossing, &trains));
                assert!(release_crossing(&service, CROSSING, id).unwrap());
            }
        }
    }
}
