//! Concurrent submission and phase closing through the turn coordinator.

use std::sync::Arc;
use std::time::Duration;

use quadrant::abilities::{AbilityInvocation, AbilityOutcome, Intel};
use quadrant::board::{Faction, Order, Phase, Season, ALL_FACTIONS};
use quadrant::config::GameConfig;
use quadrant::error::StateError;
use quadrant::game::Game;
use quadrant::protocol::{parse_orders, OrderSubmission, OrderType};
use quadrant::session::{CloseReason, TurnCoordinator};
use tokio::time::Instant;

fn coordinator(players: &[Faction], timeout: Duration) -> Arc<TurnCoordinator> {
    let game = Game::new(GameConfig::default(), players).unwrap();
    Arc::new(TurnCoordinator::with_timeout(game, timeout))
}

#[tokio::test(start_paused = true)]
async fn seven_concurrent_submitters_reach_quorum() {
    let coord = coordinator(&ALL_FACTIONS, Duration::from_secs(300));
    let phase = coord.phase_id().await;

    let closer = {
        let c = Arc::clone(&coord);
        tokio::spawn(async move { c.close_orders_phase().await })
    };
    let submitters: Vec<_> = ALL_FACTIONS
        .iter()
        .map(|&faction| {
            let c = Arc::clone(&coord);
            tokio::spawn(async move { c.submit_orders(faction, phase, &[]).await })
        })
        .collect();
    for s in submitters {
        assert!(s.await.unwrap().unwrap().fully_accepted());
    }

    let start = Instant::now();
    let closed = closer.await.unwrap().unwrap();
    assert_eq!(closed.reason, CloseReason::Quorum);
    assert!(closed.defaulted.is_empty());
    assert!(start.elapsed() < Duration::from_secs(300));
    assert_eq!(closed.result.orders.len(), 21);
    assert_eq!(coord.phase_id().await.season, Season::Fall);
}

#[tokio::test(start_paused = true)]
async fn last_submission_wins() {
    let coord = coordinator(&[Faction::Federation, Faction::Klingon], Duration::from_secs(60));
    let phase = coord.phase_id().await;

    let (first, second) = coord
        .inspect(|g| {
            (
                parse_orders(g.board(), "earth - vega").unwrap(),
                parse_orders(g.board(), "earth - risa").unwrap(),
            )
        })
        .await;
    coord.submit_orders(Faction::Federation, phase, &first).await.unwrap();
    coord.submit_orders(Faction::Federation, phase, &second).await.unwrap();
    coord.submit_orders(Faction::Klingon, phase, &[]).await.unwrap();

    let closed = coord.close_orders_phase().await.unwrap();
    let risa = coord.inspect(|g| g.board().lookup("risa").unwrap()).await;
    let moved = closed
        .result
        .orders
        .iter()
        .find(|r| matches!(r.order, Order::Move { .. }))
        .unwrap();
    assert_eq!(moved.order.dest(), Some(risa));
}

#[tokio::test(start_paused = true)]
async fn deadline_defaults_silent_factions() {
    let coord = coordinator(
        &[Faction::Federation, Faction::Klingon, Faction::Gorn],
        Duration::from_secs(300),
    );
    let phase = coord.phase_id().await;
    coord.submit_orders(Faction::Klingon, phase, &[]).await.unwrap();

    let start = Instant::now();
    let closed = coord.close_orders_phase().await.unwrap();
    assert_eq!(closed.reason, CloseReason::Timeout);
    assert_eq!(closed.defaulted, vec![Faction::Federation, Faction::Gorn]);
    assert!(start.elapsed() >= Duration::from_secs(300));
    // Defaulted units hold.
    assert_eq!(closed.result.orders.len(), 9);
}

#[tokio::test(start_paused = true)]
async fn submissions_after_close_are_stale() {
    let coord = coordinator(&[Faction::Federation, Faction::Klingon], Duration::from_secs(10));
    let phase = coord.phase_id().await;
    coord.close_orders_phase().await.unwrap();

    let err = coord.submit_orders(Faction::Federation, phase, &[]).await.unwrap_err();
    assert!(matches!(err, StateError::WrongPhase { .. }));
    assert_eq!(coord.pending_factions().await.len(), 2);
}

#[tokio::test(start_paused = true)]
async fn raw_submissions_report_unknown_territories() {
    let coord = coordinator(&[Faction::Federation, Faction::Klingon], Duration::from_secs(10));
    let phase = coord.phase_id().await;
    let submissions = [
        OrderSubmission::new("earth", OrderType::Move).with_target("vega"),
        OrderSubmission::new("atlantis", OrderType::Hold),
    ];
    let report = coord.submit(Faction::Federation, phase, &submissions).await.unwrap();
    assert_eq!(report.accepted.len(), 1);
    assert_eq!(report.rejected.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn abilities_see_orders_submitted_concurrently() {
    let coord = coordinator(&[Faction::Federation, Faction::Romulan], Duration::from_secs(60));
    let phase = coord.phase_id().await;
    let orders = coord.inspect(|g| parse_orders(g.board(), "earth - vega").unwrap()).await;
    coord.submit_orders(Faction::Federation, phase, &orders).await.unwrap();

    let outcome = coord
        .invoke_ability(Faction::Romulan, &AbilityInvocation::Intercept)
        .await
        .unwrap();
    let AbilityOutcome::Intel {
        intel: Intel::Orders { orders: seen },
    } = outcome
    else {
        panic!("unexpected outcome {outcome:?}");
    };
    assert_eq!(seen, vec![(Faction::Federation, orders[0])]);
    assert_eq!(coord.inspect(|g| g.phase_id().phase).await, Phase::Orders);
}
