//! # Report Lifecycle Scenarios
//!
//! End-to-end runs of create → submit_initial → dispute → settle against the
//! in-memory host, checking returned values, phase flags, balances, and
//! escrow conservation at every step.

mod common;

use bpo_core::{ReportId, U256};
use bpo_engine::{ErrorKind, OracleError, OracleEvent, RewardRoute};
use bpo_state::ReportPhase;
use common::*;

#[test]
fn reference_report_dispute_and_settle() {
    let h = Harness::new();
    let alice = actor("alice");
    let bob = actor("bob");
    let carol = actor("carol");
    h.fund(alice);
    h.fund(bob);

    let id = h.create(actor("creator"), reference_params()).unwrap();
    assert_eq!(id, ReportId(1));
    h.assert_conserved();

    h.submit(alice, id, e18(1), e18(2_000)).unwrap();
    let record = h.oracle.report(id).unwrap();
    assert_eq!(record.status.price, U256::from(500_000_000_000_000u64));
    assert_eq!(record.status.phase, ReportPhase::Reported);
    assert_eq!(record.status.initial_report_tick, 1_000);
    h.assert_conserved();

    h.advance(6);
    let alice_weth = h.asset_balance(weth(), alice);
    h.dispute(bob, id, weth(), e17(11), e18(2_100)).unwrap();

    let record = h.oracle.report(id).unwrap();
    assert!(record.status.dispute_occurred);
    assert_eq!(record.status.current_reporter, Some(bob));
    assert_eq!(record.status.initial_reporter, Some(alice));
    assert_eq!(record.extra.dispute_count, 1);
    // Displaced reporter gets 2 * old + fee.
    let fee = U256::from(300_000_000_000_000u64);
    assert_eq!(h.asset_balance(weth(), alice), alice_weth + e18(2) + fee);
    assert_eq!(
        h.oracle.treasury().asset_fees(&weth()),
        U256::from(100_000_000_000_000u64)
    );
    h.assert_conserved();

    h.advance(300);
    let bob_weth = h.asset_balance(weth(), bob);
    let bob_usdc = h.asset_balance(usdc(), bob);
    let (price, tick) = h.settle(carol, id).unwrap();

    let expected_price = e17(11) * e18(1) / e18(2_100);
    assert_eq!(price, expected_price);
    assert_eq!(price, U256::from(523_809_523_809_523u64));
    assert_eq!(tick, 1_306);

    let record = h.oracle.report(id).unwrap();
    assert!(record.status.is_settled);
    assert!(record.status.is_distributed);
    assert_eq!(record.status.phase, ReportPhase::Distributed);
    assert_eq!(h.asset_balance(weth(), bob), bob_weth + e17(11));
    assert_eq!(h.asset_balance(usdc(), bob), bob_usdc + e18(2_100));
    assert_eq!(h.native_balance(carol), U256::from(SETTLER_REWARD));
    assert_eq!(
        h.oracle.treasury().native_pool(),
        U256::from(CREATION_VALUE - SETTLER_REWARD)
    );
    assert_eq!(h.oracle.get_settlement_data(id).unwrap(), (price, tick));
    h.assert_conserved();

    // Only the protocol fee stays behind.
    assert_eq!(
        h.asset_balance(weth(), h.escrow),
        U256::from(100_000_000_000_000u64)
    );
    assert_eq!(h.asset_balance(usdc(), h.escrow), U256::ZERO);
}

#[test]
fn dispute_before_delay_is_too_early() {
    let h = Harness::new();
    let id = reported(&h, actor("alice"));
    h.fund(actor("bob"));

    h.advance(4);
    let err = h
        .dispute(actor("bob"), id, weth(), e17(11), e18(2_100))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TimingViolation);
    assert!(matches!(err, OracleError::Timing { reason: "too early", .. }));
    assert!(!h.oracle.report(id).unwrap().status.dispute_occurred);
}

#[test]
fn late_settlement_distributes_without_price() {
    let h = Harness::new();
    let alice = actor("alice");
    let id = reported(&h, alice);
    let alice_weth = h.asset_balance(weth(), alice);
    let alice_usdc = h.asset_balance(usdc(), alice);

    h.advance(300 + 5 + 1);
    let result = h.settle(actor("carol"), id).unwrap();
    assert_eq!(result, (U256::ZERO, 0));

    let record = h.oracle.report(id).unwrap();
    assert!(record.status.is_distributed);
    assert!(!record.status.is_settled);
    assert_eq!(h.asset_balance(weth(), alice), alice_weth + e18(1));
    assert_eq!(h.asset_balance(usdc(), alice), alice_usdc + e18(2_000));
    // Undisputed: the reporter reward goes to the initial reporter.
    assert_eq!(
        h.native_balance(alice),
        U256::from(CREATION_VALUE - SETTLER_REWARD)
    );

    let err = h.oracle.get_settlement_data(id).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::StateConflict);
    assert!(!h
        .oracle
        .events_for(id)
        .iter()
        .any(|e| matches!(e, OracleEvent::Settled { .. })));
    h.assert_conserved();
}

#[test]
fn second_dispute_in_same_tick_fails() {
    let h = Harness::new();
    let id = reported(&h, actor("alice"));
    h.fund(actor("bob"));
    h.fund(actor("carol"));

    h.advance(6);
    h.dispute(actor("bob"), id, weth(), e17(11), e18(2_100))
        .unwrap();
    let escalated = e17(11) * U256::from(11u64) / U256::from(10u64);
    let err = h
        .dispute(actor("carol"), id, weth(), escalated, e18(2_000))
        .unwrap_err();
    assert!(matches!(
        err.kind(),
        ErrorKind::TimingViolation | ErrorKind::StateConflict
    ));
    assert_eq!(h.oracle.report(id).unwrap().status.current_reporter, Some(actor("bob")));
}

#[test]
fn zero_delay_still_limits_one_report_per_tick() {
    let h = Harness::new();
    let alice = actor("alice");
    h.fund(alice);
    h.fund(actor("bob"));
    let mut params = reference_params();
    params.dispute_delay = 0;
    let id = h.create(actor("creator"), params).unwrap();
    h.submit(alice, id, e18(1), e18(2_000)).unwrap();

    let err = h
        .dispute(actor("bob"), id, weth(), e17(11), e18(2_100))
        .unwrap_err();
    assert!(matches!(
        err,
        OracleError::Timing {
            reason: "already reported this tick",
            ..
        }
    ));

    h.advance(1);
    h.dispute(actor("bob"), id, weth(), e17(11), e18(2_100))
        .unwrap();
}

#[test]
fn settle_is_idempotent() {
    let h = Harness::new();
    let id = reported(&h, actor("alice"));
    h.advance(300);

    let first = h.settle(actor("carol"), id).unwrap();
    let events = h.oracle.events().len();
    let carol = h.native_balance(actor("carol"));
    let escrow_weth = h.asset_balance(weth(), h.escrow);

    h.advance(1_000);
    let second = h.settle(actor("dave"), id).unwrap();
    assert_eq!(first, second);
    assert_eq!(h.oracle.events().len(), events);
    assert_eq!(h.native_balance(actor("carol")), carol);
    assert_eq!(h.native_balance(actor("dave")), U256::ZERO);
    assert_eq!(h.asset_balance(weth(), h.escrow), escrow_weth);
}

#[test]
fn idempotent_late_settlement_returns_zero() {
    let h = Harness::new();
    let id = reported(&h, actor("alice"));
    h.advance(1_000);
    assert_eq!(h.settle(actor("carol"), id).unwrap(), (U256::ZERO, 0));
    assert_eq!(h.settle(actor("carol"), id).unwrap(), (U256::ZERO, 0));
}

#[test]
fn settle_before_duration_is_rejected() {
    let h = Harness::new();
    let id = reported(&h, actor("alice"));
    h.advance(299);
    let err = h.settle(actor("carol"), id).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TimingViolation);
    assert!(!h.oracle.report(id).unwrap().status.is_distributed);
}

#[test]
fn settle_without_reporter_is_state_conflict() {
    let h = Harness::new();
    let id = h.create(actor("creator"), reference_params()).unwrap();
    h.advance(10_000);
    let err = h.settle(actor("carol"), id).unwrap_err();
    assert!(matches!(err, OracleError::NoReporter { .. }));
    assert_eq!(err.kind(), ErrorKind::StateConflict);
}

#[test]
fn window_boundary_is_inclusive() {
    let h = Harness::new();
    let id = reported(&h, actor("alice"));
    h.advance(300 + 5);
    let (price, tick) = h.settle(actor("carol"), id).unwrap();
    assert_eq!(price, U256::from(500_000_000_000_000u64));
    assert_eq!(tick, 1_305);
}

#[test]
fn disputes_stop_once_window_closes() {
    let h = Harness::new();
    let id = reported(&h, actor("alice"));
    h.fund(actor("bob"));
    h.advance(300);
    let err = h
        .dispute(actor("bob"), id, weth(), e17(11), e18(2_100))
        .unwrap_err();
    assert!(matches!(
        err,
        OracleError::Timing {
            reason: "reporting window over",
            ..
        }
    ));
}

#[test]
fn dispute_resets_settlement_clock() {
    let h = Harness::new();
    let id = reported(&h, actor("alice"));
    h.fund(actor("bob"));
    h.advance(200);
    h.dispute(actor("bob"), id, weth(), e17(11), e18(2_100))
        .unwrap();

    h.advance(150);
    assert_eq!(
        h.settle(actor("carol"), id).unwrap_err().kind(),
        ErrorKind::TimingViolation
    );
    h.advance(150);
    assert!(h.settle(actor("carol"), id).is_ok());
}

#[test]
fn keep_fee_on_dispute_pays_initial_reporter() {
    let h = Harness::new();
    let alice = actor("alice");
    h.fund(alice);
    h.fund(actor("bob"));
    let mut params = reference_params();
    params.keep_fee_on_dispute = true;
    let id = h.create(actor("creator"), params).unwrap();
    h.submit(alice, id, e18(1), e18(2_000)).unwrap();
    h.advance(6);
    h.dispute(actor("bob"), id, weth(), e17(11), e18(2_100))
        .unwrap();
    h.advance(300);
    h.settle(actor("carol"), id).unwrap();

    assert_eq!(
        h.native_balance(alice),
        U256::from(CREATION_VALUE - SETTLER_REWARD)
    );
    assert_eq!(h.oracle.treasury().native_pool(), U256::ZERO);
    let distributed = h
        .oracle
        .events_for(id)
        .into_iter()
        .find_map(|e| match e {
            OracleEvent::Distributed { reward_route, .. } => Some(reward_route),
            _ => None,
        });
    assert_eq!(distributed, Some(RewardRoute::InitialReporter));
    h.assert_conserved();
}

#[test]
fn event_sequence_for_full_lifecycle() {
    let h = Harness::new();
    let id = reported(&h, actor("alice"));
    h.fund(actor("bob"));
    h.advance(6);
    h.dispute(actor("bob"), id, weth(), e17(11), e18(2_100))
        .unwrap();
    h.advance(300);
    h.settle(actor("carol"), id).unwrap();

    let names: Vec<&str> = h.oracle.events_for(id).iter().map(|e| e.name()).collect();
    assert_eq!(
        names,
        [
            "created",
            "initial_report_submitted",
            "disputed",
            "settled",
            "distributed"
        ]
    );
    let json = serde_json::to_string(&h.oracle.events()).unwrap();
    assert!(json.contains("\"event\":\"disputed\""));
}

#[test]
fn reports_are_independent() {
    let h = Harness::new();
    let first = reported(&h, actor("alice"));
    let second = reported(&h, actor("bob"));
    assert_eq!(second, ReportId(2));
    assert_eq!(h.oracle.report_count(), 2);

    h.advance(300);
    h.settle(actor("carol"), first).unwrap();
    assert!(h.oracle.report(first).unwrap().status.is_distributed);
    assert!(!h.oracle.report(second).unwrap().status.is_distributed);
    h.assert_conserved();
}
