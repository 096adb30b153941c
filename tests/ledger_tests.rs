mod common;

use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use coc_engine::database::models::{BatchStatus, DebitInput, TransactionType};
use coc_engine::services::calendar::MONTH_NAMES;

use common::{fixed_now, TestApp};

fn debit_input(employee_id: &str, hours: f64) -> DebitInput {
    DebitInput {
        employee_id: employee_id.to_string(),
        hours,
        reference_id: Some("CTO-REQ-1".to_string()),
        notes: None,
    }
}

// ==========================================================================
// Seed scenario 6: FIFO debit across mixed expiries
// ==========================================================================
#[tokio::test]
async fn debit_consumes_earliest_expiring_batch_first() {
    let app = TestApp::with_employee("E1").await;
    let b1 = app.import_batch("E1", "January", 2025, 5.0, "2026-01-31").await;
    let b2 = app.import_batch("E1", "February", 2025, 4.0, "2026-06-30").await;

    let allocations = app
        .ctx
        .credits
        .debit(debit_input("E1", 7.0), "hr-chief", fixed_now())
        .await
        .unwrap();

    assert_eq!(allocations.len(), 2);
    assert_eq!(allocations[0].batch_id, b1);
    assert_eq!(allocations[0].hours_consumed, 5.0);
    assert_eq!(allocations[1].batch_id, b2);
    assert_eq!(allocations[1].hours_consumed, 2.0);

    let first = app.ctx.batches.require(&b1).await.unwrap();
    assert_eq!(first.remaining_hours, 0.0);
    assert_eq!(first.used_hours, 5.0);
    assert_eq!(first.status, BatchStatus::Used);

    let second = app.ctx.batches.require(&b2).await.unwrap();
    assert_eq!(second.remaining_hours, 2.0);
    assert_eq!(second.used_hours, 2.0);
    assert_eq!(second.status, BatchStatus::Active);

    // One debit row per batch touched.
    let debits: Vec<_> = app
        .ctx
        .ledger
        .by_employee("E1")
        .await
        .unwrap()
        .into_iter()
        .filter(|entry| entry.transaction_type == TransactionType::Debit)
        .collect();
    assert_eq!(debits.len(), 2);
    assert_eq!(debits[0].hours, -5.0);
    assert_eq!(debits[0].batch_id.as_deref(), Some(b1.as_str()));
    assert_eq!(debits[1].hours, -2.0);
    assert_eq!(debits[1].batch_id.as_deref(), Some(b2.as_str()));
}

#[tokio::test]
async fn overdraw_is_refused_and_writes_nothing() {
    let app = TestApp::with_employee("E1").await;
    app.import_batch("E1", "January", 2025, 5.0, "2026-01-31").await;

    let err = app
        .ctx
        .credits
        .debit(debit_input("E1", 9.0), "hr-chief", fixed_now())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "PreconditionFailed");

    let batches = app.ctx.batches.by_employee("E1").await.unwrap();
    assert_eq!(batches[0].remaining_hours, 5.0);
    let debits: Vec<_> = app
        .ctx
        .ledger
        .by_employee("E1")
        .await
        .unwrap()
        .into_iter()
        .filter(|entry| entry.transaction_type == TransactionType::Debit)
        .collect();
    assert!(debits.is_empty());
}

// ==========================================================================
// E1: the expiration sweep
// ==========================================================================
#[tokio::test]
async fn expire_sweep_forfeits_remaining_hours_and_keeps_them_on_record() {
    let app = TestApp::with_employee("E1").await;
    let b1 = app.import_batch("E1", "January", 2025, 5.0, "2025-06-30").await;
    let b2 = app.import_batch("E1", "February", 2025, 4.0, "2026-06-30").await;

    // Use part of the expiring batch first.
    app.ctx
        .credits
        .debit(debit_input("E1", 2.0), "hr-chief", fixed_now())
        .await
        .unwrap();

    let as_of = NaiveDate::from_ymd_opt(2025, 7, 1).unwrap();
    let result = app
        .ctx
        .credits
        .expire_sweep(as_of, fixed_now())
        .await
        .unwrap();

    assert_eq!(result.batches_expired, 1);
    assert_eq!(result.forfeited_total, 3.0);
    assert_eq!(result.expired[0].batch_id, b1);
    assert_eq!(result.expired[0].forfeited_hours, 3.0);

    // The record keeps the forfeited figure for audit.
    let expired = app.ctx.batches.require(&b1).await.unwrap();
    assert_eq!(expired.status, BatchStatus::Expired);
    assert_eq!(expired.remaining_hours, 3.0);

    // No Active batch remains past the sweep horizon.
    let batches = app.ctx.batches.by_employee("E1").await.unwrap();
    for batch in &batches {
        if batch.status == BatchStatus::Active {
            assert!(batch.valid_until >= as_of);
        }
    }
    let survivor = app.ctx.batches.require(&b2).await.unwrap();
    assert_eq!(survivor.status, BatchStatus::Active);

    // An Expiration row carries the forfeit, negated.
    let expirations: Vec<_> = app
        .ctx
        .ledger
        .by_employee("E1")
        .await
        .unwrap()
        .into_iter()
        .filter(|entry| entry.transaction_type == TransactionType::Expiration)
        .collect();
    assert_eq!(expirations.len(), 1);
    assert_eq!(expirations[0].hours, -3.0);
    assert_eq!(expirations[0].batch_id.as_deref(), Some(b1.as_str()));

    // Expired hours no longer contribute to the active balance.
    let balance = app.ctx.credits.balance("E1", as_of).await.unwrap();
    assert_eq!(balance.active, 4.0);
    assert_eq!(balance.expired, 3.0);
    assert_eq!(balance.used, 2.0);
}

#[tokio::test]
async fn sweep_of_a_fully_used_batch_writes_no_expiration_row() {
    let app = TestApp::with_employee("E1").await;
    app.import_batch("E1", "January", 2025, 5.0, "2025-06-30").await;
    app.ctx
        .credits
        .debit(debit_input("E1", 5.0), "hr-chief", fixed_now())
        .await
        .unwrap();

    let result = app
        .ctx
        .credits
        .expire_sweep(NaiveDate::from_ymd_opt(2025, 7, 1).unwrap(), fixed_now())
        .await
        .unwrap();
    // Already Used, not Active: the sweep has nothing to expire.
    assert_eq!(result.batches_expired, 0);
    let expirations: Vec<_> = app
        .ctx
        .ledger
        .by_employee("E1")
        .await
        .unwrap()
        .into_iter()
        .filter(|entry| entry.transaction_type == TransactionType::Expiration)
        .collect();
    assert!(expirations.is_empty());
}

// ==========================================================================
// Covered logs follow their batch through Used and Expired
// ==========================================================================
#[tokio::test]
async fn draining_a_certificate_batch_marks_its_logs_used() {
    let app = TestApp::with_employee("E1").await;
    app.ctx
        .overtime
        .log_batch(
            common::MockData::batch(
                "E1",
                "March",
                2025,
                vec![common::MockData::full_rest_day("2025-03-15")],
            ),
            "clerk",
            fixed_now(),
        )
        .await
        .unwrap();
    app.ctx
        .certification
        .certify(
            coc_engine::database::models::CertifyInput {
                employee_id: "E1".to_string(),
                month: "March".to_string(),
                year: 2025,
                date_of_issuance: "2025-04-01".to_string(),
            },
            "chief",
            fixed_now(),
        )
        .await
        .unwrap();

    app.ctx
        .credits
        .debit(debit_input("E1", 12.0), "hr-chief", fixed_now())
        .await
        .unwrap();

    let logs = app
        .ctx
        .logs
        .query_by_period("E1", "March", 2025)
        .await
        .unwrap();
    assert_eq!(logs[0].status, coc_engine::database::models::LogStatus::Used);
    // The validity end earned at certification stays on the record.
    assert_eq!(
        logs[0].valid_until,
        Some(NaiveDate::from_ymd_opt(2026, 3, 31).unwrap())
    );

    // Used logs no longer count toward the monthly cap.
    let month_total = app
        .ctx
        .logs
        .month_total_non_terminal("E1", "March", 2025)
        .await
        .unwrap();
    assert_eq!(month_total, 0.0);
}

#[tokio::test]
async fn sweeping_a_certificate_batch_marks_its_logs_expired() {
    let app = TestApp::with_employee("E1").await;
    app.ctx
        .overtime
        .log_batch(
            common::MockData::batch(
                "E1",
                "March",
                2025,
                vec![common::MockData::full_rest_day("2025-03-15")],
            ),
            "clerk",
            fixed_now(),
        )
        .await
        .unwrap();
    app.ctx
        .certification
        .certify(
            coc_engine::database::models::CertifyInput {
                employee_id: "E1".to_string(),
                month: "March".to_string(),
                year: 2025,
                date_of_issuance: "2025-04-01".to_string(),
            },
            "chief",
            fixed_now(),
        )
        .await
        .unwrap();

    app.ctx
        .credits
        .expire_sweep(NaiveDate::from_ymd_opt(2026, 4, 1).unwrap(), fixed_now())
        .await
        .unwrap();

    let logs = app
        .ctx
        .logs
        .query_by_period("E1", "March", 2025)
        .await
        .unwrap();
    assert_eq!(
        logs[0].status,
        coc_engine::database::models::LogStatus::Expired
    );
}

// ==========================================================================
// Ordering: one employee's ledger is totally ordered
// ==========================================================================
#[tokio::test]
async fn ledger_orders_by_date_then_transaction_id() {
    let app = TestApp::with_employee("E1").await;
    app.import_batch("E1", "January", 2025, 10.0, "2026-06-30").await;
    for _ in 0..3 {
        app.ctx
            .credits
            .debit(debit_input("E1", 1.0), "hr-chief", fixed_now())
            .await
            .unwrap();
    }

    let entries = app.ctx.ledger.by_employee("E1").await.unwrap();
    assert_eq!(entries.len(), 4);
    for pair in entries.windows(2) {
        let earlier = (
            pair[0].transaction_date,
            pair[0].transaction_id.parse::<i64>().unwrap(),
        );
        let later = (
            pair[1].transaction_date,
            pair[1].transaction_id.parse::<i64>().unwrap(),
        );
        assert!(earlier < later);
    }
}

// ==========================================================================
// L2: FIFO order holds for random batch sets
// ==========================================================================
#[tokio::test]
async fn random_debits_touch_batches_in_expiry_order() {
    let mut rng = StdRng::seed_from_u64(7);

    for round in 0..10 {
        let app = TestApp::with_employee("E1").await;
        let count: u32 = rng.gen_range(3..=6);
        let mut hours_by_batch = std::collections::HashMap::new();
        let mut expiry_by_batch = std::collections::HashMap::new();

        for index in 0..count {
            let hours = f64::from(rng.gen_range(10..=80)) / 10.0;
            // Distinct expiries, spaced months apart.
            let expiry = NaiveDate::from_ymd_opt(2026, 1 + index, 28).unwrap();
            let batch_id = app
                .import_batch(
                    "E1",
                    MONTH_NAMES[index as usize],
                    2025,
                    hours,
                    &expiry.format("%Y-%m-%d").to_string(),
                )
                .await;
            hours_by_batch.insert(batch_id.clone(), hours);
            expiry_by_batch.insert(batch_id, expiry);
        }

        let available: f64 = hours_by_batch.values().sum();
        let debit_hours = (f64::from(rng.gen_range(5..=(available * 10.0) as i32)) / 10.0).max(0.5);

        let allocations = app
            .ctx
            .credits
            .debit(debit_input("E1", debit_hours), "hr-chief", fixed_now())
            .await
            .unwrap();

        // Touched in strictly ascending expiry order, every batch but the
        // last fully drained.
        let expiries: Vec<NaiveDate> = allocations
            .iter()
            .map(|allocation| expiry_by_batch[&allocation.batch_id])
            .collect();
        for pair in expiries.windows(2) {
            assert!(pair[0] < pair[1], "round {round}: out of order");
        }
        for allocation in &allocations[..allocations.len() - 1] {
            assert_eq!(
                allocation.hours_consumed, hours_by_batch[&allocation.batch_id],
                "round {round}: a non-final batch was only partially drained"
            );
        }
        let consumed: f64 = allocations.iter().map(|a| a.hours_consumed).sum();
        assert!((consumed - debit_hours).abs() < 0.05, "round {round}");
    }
}

// ==========================================================================
// L1: ledger reconstruction holds under random credit/debit/expiry mixes
// ==========================================================================
#[tokio::test]
async fn ledger_balance_matches_batches_under_random_sequences() {
    let mut rng = StdRng::seed_from_u64(42);
    let app = TestApp::with_employee("E1").await;
    let today = app.ctx.credits.today(fixed_now()).await.unwrap();

    let mut period = 0u32;
    for _ in 0..40 {
        match rng.gen_range(0..10) {
            // Credit: a new batch with a staggered future expiry.
            0..=4 => {
                let hours = f64::from(rng.gen_range(5..=120)) / 10.0;
                let month = MONTH_NAMES[(period % 12) as usize];
                let year = 2020 + (period / 12) as i32;
                let expiry_days = i64::from(rng.gen_range(30..700));
                let expiry = today + chrono::Duration::days(expiry_days);
                app.import_batch(
                    "E1",
                    month,
                    year,
                    hours,
                    &expiry.format("%Y-%m-%d").to_string(),
                )
                .await;
                period += 1;
            }
            // Debit: some share of whatever is active.
            5..=7 => {
                let balance = app.ctx.credits.balance("E1", today).await.unwrap();
                if balance.active >= 1.0 {
                    let upper = (balance.active * 10.0) as i32;
                    let hours = f64::from(rng.gen_range(1..=upper)) / 10.0;
                    app.ctx
                        .credits
                        .debit(debit_input("E1", hours), "hr-chief", fixed_now())
                        .await
                        .unwrap();
                }
            }
            // Sweep at a random future horizon.
            _ => {
                let horizon = today + chrono::Duration::days(i64::from(rng.gen_range(0..700)));
                app.ctx
                    .credits
                    .expire_sweep(horizon, fixed_now())
                    .await
                    .unwrap();
            }
        }

        // The invariant holds after every operation.
        let reconciliation = app.ctx.credits.verify_ledger("E1").await.unwrap();
        assert!(
            (reconciliation.batch_active - reconciliation.ledger_active).abs() < 0.05,
            "batches say {} but ledger says {}",
            reconciliation.batch_active,
            reconciliation.ledger_active
        );
    }
}
