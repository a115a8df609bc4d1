//! # Settlement, Payout, and Treasury Tests
//!
//! Native payouts degrade to wrapped credit and then to a forfeit tally
//! without failing settlement. A failed escrow release rolls the whole
//! settlement back. Protocol fees and the native pool drain only to the fee
//! recipient, which only the owner may change.

mod common;

use std::thread;

use bpo_core::U256;
use bpo_engine::{CallContext, ErrorKind, OracleError, OracleEvent};
use common::*;

const REPORTER_REWARD: u64 = CREATION_VALUE - SETTLER_REWARD;

fn disputed_and_settled(h: &Harness) -> bpo_core::ReportId {
    let id = reported(h, actor("alice"));
    h.fund(actor("bob"));
    h.advance(6);
    h.dispute(actor("bob"), id, weth(), e17(11), e18(2_100))
        .unwrap();
    h.advance(300);
    h.settle(actor("carol"), id).unwrap();
    id
}

#[test]
fn refused_native_payment_falls_back_to_wrapped() {
    let h = Harness::new();
    let alice = actor("alice");
    let id = reported(&h, alice);
    h.bank.reject_direct(alice);

    h.advance(300);
    h.settle(actor("carol"), id).unwrap();
    assert_eq!(h.native_balance(alice), U256::ZERO);
    assert_eq!(h.bank.wrapped_balance_of(&alice), U256::from(REPORTER_REWARD));
    assert_eq!(h.oracle.treasury().forfeited_native(), U256::ZERO);
    h.assert_conserved();
}

#[test]
fn unreachable_settler_forfeits_without_blocking() {
    let h = Harness::new();
    let alice = actor("alice");
    let carol = actor("carol");
    let id = reported(&h, alice);
    h.bank.reject_direct(carol);
    h.bank.set_wrapped_frozen(true);

    h.advance(300);
    let alice_weth = h.asset_balance(weth(), alice);
    h.settle(carol, id).unwrap();

    assert_eq!(h.asset_balance(weth(), alice), alice_weth + e18(1));
    assert_eq!(h.native_balance(alice), U256::from(REPORTER_REWARD));
    assert_eq!(h.native_balance(carol), U256::ZERO);
    assert_eq!(
        h.oracle.treasury().forfeited_native(),
        U256::from(SETTLER_REWARD)
    );
    assert_eq!(h.native_balance(h.escrow), U256::from(SETTLER_REWARD));
    h.assert_conserved();
}

#[test]
fn failed_release_rolls_settlement_back() {
    let h = Harness::new();
    let alice = actor("alice");
    let id = reported(&h, alice);
    h.advance(300);
    h.ledger.freeze(usdc(), alice);

    let events_before = h.oracle.events().len();
    let err = h.settle(actor("carol"), id).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TransferFailure);

    let record = h.oracle.report(id).unwrap();
    assert!(!record.status.is_settled);
    assert!(!record.status.is_distributed);
    assert_eq!(h.oracle.events().len(), events_before);
    assert_eq!(h.native_balance(actor("carol")), U256::ZERO);
    assert!(h.oracle.get_settlement_data(id).is_err());
    h.assert_conserved();

    h.ledger.unfreeze(usdc(), alice);
    let (price, _) = h.settle(actor("carol"), id).unwrap();
    assert_eq!(price, U256::from(500_000_000_000_000u64));
    assert_eq!(h.native_balance(actor("carol")), U256::from(SETTLER_REWARD));
    h.assert_conserved();
}

#[test]
fn failed_release_restores_native_pool() {
    let h = Harness::new();
    let id = reported(&h, actor("alice"));
    h.fund(actor("bob"));
    h.advance(6);
    h.dispute(actor("bob"), id, weth(), e17(11), e18(2_100))
        .unwrap();
    h.advance(300);
    h.ledger.freeze(weth(), actor("bob"));

    assert!(h.settle(actor("carol"), id).is_err());
    assert_eq!(h.oracle.treasury().native_pool(), U256::ZERO);
    h.assert_conserved();
}

#[test]
fn protocol_fees_go_to_recipient() {
    let h = Harness::new();
    disputed_and_settled(&h);
    let anyone = CallContext::new(actor("anyone"));

    let withdrawn = h.oracle.withdraw_asset_fees(&anyone, weth()).unwrap();
    assert_eq!(withdrawn, U256::from(100_000_000_000_000u64));
    assert_eq!(h.asset_balance(weth(), h.owner), withdrawn);
    assert_eq!(h.oracle.treasury().asset_fees(&weth()), U256::ZERO);
    assert_eq!(h.asset_balance(weth(), h.escrow), U256::ZERO);

    // Nothing accrued: a no-op.
    assert_eq!(
        h.oracle.withdraw_asset_fees(&anyone, usdc()).unwrap(),
        U256::ZERO
    );
    h.assert_conserved();
}

#[test]
fn native_pool_goes_to_recipient() {
    let h = Harness::new();
    disputed_and_settled(&h);
    let treasurer = actor("treasurer");
    h.oracle
        .update_fee_recipient(&CallContext::new(h.owner), treasurer)
        .unwrap();

    let withdrawn = h
        .oracle
        .withdraw_native_fees(&CallContext::new(actor("anyone")))
        .unwrap();
    assert_eq!(withdrawn, U256::from(REPORTER_REWARD));
    assert_eq!(h.native_balance(treasurer), withdrawn);
    assert_eq!(h.oracle.treasury().native_pool(), U256::ZERO);
    assert!(h.oracle.events().iter().any(|e| matches!(
        e,
        OracleEvent::FeesWithdrawn { asset: None, recipient, .. } if *recipient == treasurer
    )));
    h.assert_conserved();
}

#[test]
fn refused_native_withdrawal_keeps_pool() {
    let h = Harness::new();
    disputed_and_settled(&h);
    h.bank.reject_direct(h.owner);

    let err = h
        .oracle
        .withdraw_native_fees(&CallContext::new(h.owner))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TransferFailure);
    assert_eq!(
        h.oracle.treasury().native_pool(),
        U256::from(REPORTER_REWARD)
    );
    h.assert_conserved();
}

#[test]
fn only_owner_changes_recipient() {
    let h = Harness::new();
    let err = h
        .oracle
        .update_fee_recipient(&CallContext::new(actor("mallory")), actor("mallory"))
        .unwrap_err();
    assert!(matches!(err, OracleError::Unauthorized { .. }));
    assert_eq!(err.kind(), ErrorKind::AccessControl);
    assert_eq!(h.oracle.treasury().recipient(), h.owner);

    h.oracle
        .update_fee_recipient(&CallContext::new(h.owner), actor("treasurer"))
        .unwrap();
    assert_eq!(h.oracle.treasury().recipient(), actor("treasurer"));
    assert!(matches!(
        h.oracle.events().last(),
        Some(OracleEvent::FeeRecipientUpdated { .. })
    ));
}

#[test]
fn concurrent_settlers_pay_out_once() {
    let h = Harness::new();
    let alice = actor("alice");
    let id = reported(&h, alice);
    h.advance(300);
    let alice_weth = h.asset_balance(weth(), alice);

    let handles: Vec<_> = ["carol", "dave", "erin", "frank"]
        .into_iter()
        .map(|name| {
            let oracle = h.oracle.clone();
            thread::spawn(move || oracle.settle(&CallContext::new(actor(name)), id))
        })
        .collect();
    let results: Vec<_> = handles
        .into_iter()
        .map(|handle| handle.join().unwrap().unwrap())
        .collect();

    assert!(results.windows(2).all(|w| w[0] == w[1]));
    let paid: U256 = ["carol", "dave", "erin", "frank"]
        .into_iter()
        .map(|name| h.native_balance(actor(name)))
        .fold(U256::ZERO, |acc, b| acc + b);
    assert_eq!(paid, U256::from(SETTLER_REWARD));
    assert_eq!(h.asset_balance(weth(), alice), alice_weth + e18(1));
    h.assert_conserved();
}
