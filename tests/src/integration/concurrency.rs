//! # Concurrency Tests
//!
//! Many callers submitting against the same crossing at once. Simulations
//! race; MVCC validation at commit rejects stale ones and callers retry.
//! Capacity and train exclusivity must hold for every interleaving.

#[cfg(test)]
mod tests {
    use crate::fixtures::*;
    use lc_crossing_contract::prelude::*;
    use std::collections::HashSet;
    use std::sync::Arc;

    const CROSSING: &str = "1001";
    const MAX_ATTEMPTS: usize = 32;

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_slot_requests_respect_capacity() {
        let service = Arc::new(service());
        seed_crossing(&service, CROSSING, CrossingStatus::FreeToCross, 1_000_000, 2, 3);

        let handles: Vec<_> = (0..20)
            .map(|i| {
                let service = Arc::clone(&service);
                tokio::spawn(async move {
                    let plate = format!("CAR-{i:02}");
                    service
                        .submit_with_retry(
                            &vehicle(&plate),
                            &Invocation::RequestSlot {
                                crossing_id: CROSSING.to_string(),
                            },
                            MAX_ATTEMPTS,
                        )
                        .map(|result| (plate, result.as_slot()))
                })
            })
            .collect();

        let mut assigned = Vec::new();
        for handle in handles {
            let (plate, slot) = handle.await.expect("task panicked").expect("submission failed");
            if let Some(SlotAssignment::Assigned(position)) = slot {
                assigned.push((plate, position));
            }
        }

        assert_eq!(assigned.len(), 6);
        let distinct: HashSet<_> = assigned.iter().map(|(_, position)| *position).collect();
        assert_eq!(distinct.len(), 6, "two vehicles were given the same cell");

        let stored = stored_crossing(service.world(), CROSSING);
        assert_eq!(stored.occupied_count(), 6);

        for (plate, position) in &assigned {
            let record = service
                .world()
                .get(&StateKey::private("RailwayPrivateCollection", plate))
                .expect("private record");
            let record: OccupancyRecord = serde_json::from_slice(&record).unwrap();
            assert_eq!(record, OccupancyRecord::Occupying(*position));
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_racing_trains_single_holder() {
        let service = Arc::new(service());
        seed_crossing(&service, CROSSING, CrossingStatus::FreeToCross, 1_000_000, 1, 1);
        let trains: Vec<String> = (0..6).map(|i| format!("T{i}")).collect();
        for id in &trains {
            seed_train(&service, id, 600);
        }

        let handles: Vec<_> = trains
            .iter()
            .cloned()
            .map(|train_id| {
                let service = Arc::clone(&service);
                tokio::spawn(async move {
                    service.submit_with_retry(
                        &operator(),
                        &Invocation::RequestCrossing {
                            crossing_id: CROSSING.to_string(),
                            train_id,
                        },
                        MAX_ATTEMPTS,
                    )
                })
            })
            .collect();

        let mut granted = 0;
        for handle in handles {
            let result = handle.await.expect("task panicked").expect("submission failed");
            if result.as_outcome().is_some_and(|outcome| outcome.is_granted()) {
                granted += 1;
            }
        }
        assert_eq!(granted, 1);

        let stored: Vec<Train> = trains
            .iter()
            .map(|id| stored_train(service.world(), id))
            .collect();
        let crossing = stored_crossing(service.world(), CROSSING);
        assert!(check_mutual_exclusion_invariant(&crossing, &stored));
        assert_eq!(crossing.status, CrossingStatus::Locked);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_shared_trains_racing_two_crossings() {
        let service = Arc::new(service());
        let crossings = ["A", "B"];
        for id in crossings {
            seed_crossing(&service, id, CrossingStatus::FreeToCross, 1_000_000, 1, 1);
        }
        let trains: Vec<String> = (0..4).map(|i| format!("T{i}")).collect();
        for id in &trains {
            seed_train(&service, id, 600);
        }

        let mut handles = Vec::new();
        for crossing_id in crossings {
            for train_id in trains.iter().cloned() {
                let service = Arc::clone(&service);
                handles.push(tokio::spawn(async move {
                    service
                        .submit_with_retry(
                            &operator(),
                            &Invocation::RequestCrossing {
                                crossing_id: crossing_id.to_string(),
                                train_id: train_id.clone(),
                            },
                            MAX_ATTEMPTS,
                        )
                        .map(|result| (crossing_id, train_id, result.as_outcome()))
                }));
            }
        }

        let mut granted: Vec<(&str, String)> = Vec::new();
        for handle in handles {
            let (crossing_id, train_id, outcome) =
                handle.await.expect("task panicked").expect("submission failed");
            if outcome.is_some_and(|outcome| outcome.is_granted()) {
                granted.push((crossing_id, train_id));
            }
        }

        for id in crossings {
            let winners: Vec<&String> = granted
                .iter()
                .filter(|(crossing_id, _)| *crossing_id == id)
                .map(|(_, train_id)| train_id)
                .collect();
            assert_eq!(winners.len(), 1, "crossing {id} granted to {winners:?}");

            let crossing = stored_crossing(service.world(), id);
            assert_eq!(crossing.status, CrossingStatus::Locked);
            assert_eq!(crossing.holder.as_deref(), Some(winners[0].as_str()));
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_vehicles_and_train_race() {
        let service = Arc::new(service());
        seed_crossing(&service, CROSSING, CrossingStatus::FreeToCross, 1_000_000, 1, 4);
        seed_train(&service, "T1", 600);

        let mut handles = Vec::new();
        for i in 0..8 {
            let service = Arc::clone(&service);
            handles.push(tokio::spawn(async move {
                service
                    .submit_with_retry(
                        &vehicle(&format!("CAR-{i}")),
                        &Invocation::RequestSlot {
                            crossing_id: CROSSING.to_string(),
                        },
                        MAX_ATTEMPTS,
                    )
                    .map(|_| ())
            }));
        }
        let train_service = Arc::clone(&service);
        handles.push(tokio::spawn(async move {
            train_service
                .submit_with_retry(
                    &operator(),
                    &Invocation::RequestCrossing {
                        crossing_id: CROSSING.to_string(),
                        train_id: "T1".to_string(),
                    },
                    MAX_ATTEMPTS,
                )
                .map(|_| ())
        }));

        for handle in handles {
            handle.await.expect("task panicked").expect("submission failed");
        }

        let crossing = stored_crossing(service.world(), CROSSING);
        let train = stored_train(service.world(), "T1");
        assert!(check_mutual_exclusion_invariant(&crossing, &[train.clone()]));

        // Either the train got in first, or it is waiting on the vehicles
        match train.status {
            TrainStatus::InCrossing => assert!(crossing.is_clear()),
            TrainStatus::Caution => {
                assert_eq!(crossing.status, CrossingStatus::WillBeLocked);
                assert!(!crossing.is_clear());
            }
            other => panic!("unexpected train status {other}"),
        }
    }
}
