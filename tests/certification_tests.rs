mod common;

use chrono::NaiveDate;
use pretty_assertions::assert_eq;

use coc_engine::database::models::{
    BatchSource, BatchStatus, CertifyInput, LogStatus, TransactionType,
};

use common::{fixed_now, MockData, TestApp};

fn march_certify_input() -> CertifyInput {
    CertifyInput {
        employee_id: "E1".to_string(),
        month: "March".to_string(),
        year: 2025,
        date_of_issuance: "2025-04-01".to_string(),
    }
}

/// Three March logs worth 1.5 + 2.0 + 4.0 = 7.5 hours.
async fn seed_march_logs(app: &TestApp) {
    app.ctx
        .overtime
        .log_batch(
            MockData::batch(
                "E1",
                "March",
                2025,
                vec![
                    MockData::entry(
                        "2025-03-10",
                        Some(("8:00 AM", "12:00 PM")),
                        Some(("1:00 PM", "6:30 PM")),
                    ),
                    MockData::full_weekday_evening("2025-03-11"),
                    // Saturday 8:00–10:40: 160 minutes × 1.5 = 4.0.
                    MockData::entry("2025-03-15", Some(("8:00 AM", "10:40 AM")), None),
                ],
            ),
            "clerk",
            fixed_now(),
        )
        .await
        .unwrap();
}

// ==========================================================================
// Seed scenario 5: the full certification post-state
// ==========================================================================
#[tokio::test]
async fn certification_produces_logs_batch_ledger_and_certificate() {
    let app = TestApp::with_employee("E1").await;
    seed_march_logs(&app).await;

    let result = app
        .ctx
        .certification
        .certify(march_certify_input(), "chief", fixed_now())
        .await
        .unwrap();

    let expected_valid_until = NaiveDate::from_ymd_opt(2026, 3, 31).unwrap();
    assert_eq!(result.logs_certified, 3);
    assert_eq!(result.total_hours, 7.5);
    assert_eq!(result.valid_until, expected_valid_until);

    // C2: every covered log is Active with the same validity end.
    let logs = app
        .ctx
        .logs
        .query_by_period("E1", "March", 2025)
        .await
        .unwrap();
    assert_eq!(logs.len(), 3);
    for log in &logs {
        assert_eq!(log.status, LogStatus::Active);
        assert_eq!(log.valid_until, Some(expected_valid_until));
    }

    // One batch: original = remaining = 7.5, used = 0, Active.
    let batch = app.ctx.batches.require(&result.batch_id).await.unwrap();
    assert_eq!(batch.original_hours, 7.5);
    assert_eq!(batch.remaining_hours, 7.5);
    assert_eq!(batch.used_hours, 0.0);
    assert_eq!(batch.status, BatchStatus::Active);
    assert_eq!(batch.source_type, BatchSource::MonthlyCertificate);
    assert_eq!(
        batch.source_certificate_id.as_deref(),
        Some(result.certificate_id.as_str())
    );

    // One ledger credit of +7.5 linked to the batch.
    let entries = app.ctx.ledger.by_employee("E1").await.unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].transaction_type, TransactionType::Credit);
    assert_eq!(entries[0].hours, 7.5);
    assert_eq!(entries[0].batch_id.as_deref(), Some(result.batch_id.as_str()));
    assert_eq!(entries[0].performed_by, "chief");

    // One certificate row, the period lock witness.
    let certificate = app
        .ctx
        .certificates
        .find_for_period("E1", "March", 2025)
        .await
        .unwrap()
        .expect("certificate exists");
    assert_eq!(certificate.total_hours, 7.5);
    assert_eq!(certificate.valid_until, expected_valid_until);
}

// ==========================================================================
// Idempotency: a second certification is a failed no-op
// ==========================================================================
#[tokio::test]
async fn repeated_certification_is_a_no_op_conflict() {
    let app = TestApp::with_employee("E1").await;
    seed_march_logs(&app).await;
    app.ctx
        .certification
        .certify(march_certify_input(), "chief", fixed_now())
        .await
        .unwrap();

    let err = app
        .ctx
        .certification
        .certify(march_certify_input(), "chief", fixed_now())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "Conflict/AlreadyExists");

    // Still exactly one batch, one credit, one certificate.
    let batches = app.ctx.batches.by_employee("E1").await.unwrap();
    assert_eq!(batches.len(), 1);
    let entries = app.ctx.ledger.by_employee("E1").await.unwrap();
    assert_eq!(entries.len(), 1);
}

// ==========================================================================
// Preconditions
// ==========================================================================
#[tokio::test]
async fn future_issuance_date_is_refused() {
    let app = TestApp::with_employee("E1").await;
    seed_march_logs(&app).await;

    let mut input = march_certify_input();
    input.date_of_issuance = "2025-04-11".to_string();
    let err = app
        .ctx
        .certification
        .certify(input, "chief", fixed_now())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "PreconditionFailed");
}

#[tokio::test]
async fn certifying_an_empty_period_is_refused() {
    let app = TestApp::with_employee("E1").await;
    let err = app
        .ctx
        .certification
        .certify(march_certify_input(), "chief", fixed_now())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "PreconditionFailed");

    // C1: nothing was written.
    assert!(app.ctx.batches.by_employee("E1").await.unwrap().is_empty());
    assert!(app.ctx.ledger.by_employee("E1").await.unwrap().is_empty());
    assert!(app
        .ctx
        .certificates
        .find_for_period("E1", "March", 2025)
        .await
        .unwrap()
        .is_none());
}

// ==========================================================================
// Validity derivation respects the configurable month count
// ==========================================================================
#[tokio::test]
async fn validity_months_are_configurable() {
    let app = TestApp::with_employee("E1").await;
    app.ctx
        .configuration
        .set("CertificateValidityMonths", "6", "integer")
        .await
        .unwrap();
    seed_march_logs(&app).await;

    let result = app
        .ctx
        .certification
        .certify(march_certify_input(), "chief", fixed_now())
        .await
        .unwrap();
    assert_eq!(
        result.valid_until,
        NaiveDate::from_ymd_opt(2025, 9, 30).unwrap()
    );
}

// ==========================================================================
// Recovery completes the one legal partial state
// ==========================================================================
#[tokio::test]
async fn recovery_completes_logs_active_without_certificate() {
    let app = TestApp::with_employee("E1").await;
    seed_march_logs(&app).await;

    // Simulate a crash after the log updates landed: flip the logs to
    // Active with a validity end, but write no batch, credit, or
    // certificate.
    let valid_until = NaiveDate::from_ymd_opt(2026, 3, 31).unwrap();
    let logs = app
        .ctx
        .logs
        .query_by_period("E1", "March", 2025)
        .await
        .unwrap();
    for log in &logs {
        app.ctx
            .logs
            .update(
                &log.log_id,
                coc_engine::database::models::OvertimeLog::certify_patch(&log.log_id, valid_until),
            )
            .await
            .unwrap();
    }

    let recovered = app
        .ctx
        .certification
        .recover_dangling(fixed_now())
        .await
        .unwrap();
    assert_eq!(recovered.len(), 1);
    assert_eq!(recovered[0].employee_id, "E1");
    assert_eq!(recovered[0].total_hours, 7.5);

    // C1 restored: batch, credit, and certificate all exist now.
    let batches = app.ctx.batches.by_employee("E1").await.unwrap();
    assert_eq!(batches.len(), 1);
    assert_eq!(batches[0].original_hours, 7.5);
    assert_eq!(batches[0].valid_until, valid_until);
    let entries = app.ctx.ledger.by_employee("E1").await.unwrap();
    assert_eq!(entries.len(), 1);
    assert!(app
        .ctx
        .certificates
        .find_for_period("E1", "March", 2025)
        .await
        .unwrap()
        .is_some());

    // A second scan finds nothing left to do.
    let again = app
        .ctx
        .certification
        .recover_dangling(fixed_now())
        .await
        .unwrap();
    assert!(again.is_empty());
}
