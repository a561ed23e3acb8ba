//! End-to-end entitlement flows against a real SQLite database.

use vidra::db::Store;
use vidra::services::{
    AccessVerdict, EntitlementError, EntitlementService, SeaOrmEntitlementService,
};

async fn service() -> SeaOrmEntitlementService {
    let db_path = std::env::temp_dir().join(format!("vidra-test-{}.db", uuid::Uuid::new_v4()));
    let store = Store::new(&format!("sqlite:{}", db_path.display()))
        .await
        .expect("failed to open test database");
    SeaOrmEntitlementService::new(store)
}

fn future_date() -> String {
    (chrono::Local::now().date_naive() + chrono::Duration::days(30))
        .format("%Y-%m-%d")
        .to_string()
}

#[tokio::test]
async fn trial_registration_is_idempotent() {
    let service = service().await;

    assert!(service.register_trial("100", "Alice").await.unwrap());
    assert!(!service.register_trial("100", "Alice").await.unwrap());

    let verdict = service.check_access("100").await.unwrap();
    assert_eq!(verdict, AccessVerdict::Trial { credits: 5 });
}

#[tokio::test]
async fn re_registration_does_not_refill_credits() {
    let service = service().await;
    service.register_trial("101", "Bob").await.unwrap();

    service.debit("101").await.unwrap();
    service.debit("101").await.unwrap();

    service.register_trial("101", "Bob").await.unwrap();
    let verdict = service.check_access("101").await.unwrap();
    assert_eq!(verdict, AccessVerdict::Trial { credits: 3 });
}

#[tokio::test]
async fn debit_subtracts_one_credit_per_call() {
    let service = service().await;
    service.register_trial("102", "Carol").await.unwrap();

    service.debit("102").await.unwrap();
    assert_eq!(
        service.check_access("102").await.unwrap(),
        AccessVerdict::Trial { credits: 4 }
    );

    service.debit("102").await.unwrap();
    assert_eq!(
        service.check_access("102").await.unwrap(),
        AccessVerdict::Trial { credits: 3 }
    );
}

#[tokio::test]
async fn debit_is_a_noop_for_premium_and_unknown_users() {
    let service = service().await;

    // Unknown user: nothing to deduct, nothing to fail.
    service.debit("does-not-exist").await.unwrap();

    service.register_trial("103", "Dave").await.unwrap();
    service
        .grant_license("103", "Dave", &future_date())
        .await
        .unwrap();

    service.debit("103").await.unwrap();
    service.debit("103").await.unwrap();

    // Credits untouched behind the active license.
    let users = service.list_all().await.unwrap();
    let dave = users.iter().find(|u| u.user_id == "103").unwrap();
    assert_eq!(dave.credits, 5);
}

#[tokio::test]
async fn exhausted_trial_is_denied() {
    let service = service().await;
    service.register_trial("104", "Eve").await.unwrap();

    for _ in 0..5 {
        service.debit("104").await.unwrap();
    }

    let verdict = service.check_access("104").await.unwrap();
    assert!(!verdict.allows());
}

#[tokio::test]
async fn grant_license_rejects_bad_dates_without_mutating() {
    let service = service().await;

    let err = service
        .grant_license("105", "user_105", "next tuesday")
        .await
        .unwrap_err();
    assert!(matches!(err, EntitlementError::InvalidDate(_)));

    // The failed grant must not have created the record.
    assert_eq!(
        service.check_access("105").await.unwrap(),
        AccessVerdict::Denied(vidra::services::DenialReason::NotRegistered)
    );
}

#[tokio::test]
async fn grant_license_accepts_alternate_separators() {
    let service = service().await;

    let confirmation = service
        .grant_license("106", "user_106", "2099/01/15")
        .await
        .unwrap();
    assert!(confirmation.contains("2099-01-15"));

    assert!(matches!(
        service.check_access("106").await.unwrap(),
        AccessVerdict::Premium { .. }
    ));
}

#[tokio::test]
async fn block_writes_the_past_sentinel() {
    let service = service().await;
    service.register_trial("107", "Frank").await.unwrap();

    // Use up the trial, then block.
    for _ in 0..5 {
        service.debit("107").await.unwrap();
    }
    service.block("107").await.unwrap();

    let users = service.list_all().await.unwrap();
    let frank = users.iter().find(|u| u.user_id == "107").unwrap();
    assert_eq!(frank.expiration_date.as_deref(), Some("2000-01-01"));
    assert_eq!(frank.display_name, "blocked_user");

    assert!(!service.check_access("107").await.unwrap().allows());
}

#[tokio::test]
async fn blocking_an_unregistered_id_grants_no_credits() {
    let service = service().await;

    // Pre-emptive block before the user ever ran /start.
    service.block("555").await.unwrap();

    assert_eq!(
        service.check_access("555").await.unwrap(),
        AccessVerdict::Denied(vidra::services::DenialReason::Exhausted)
    );

    let users = service.list_all().await.unwrap();
    let blocked = users.iter().find(|u| u.user_id == "555").unwrap();
    assert_eq!(blocked.credits, 0);
    assert_eq!(blocked.expiration_date.as_deref(), Some("2000-01-01"));
}

#[tokio::test]
async fn granting_a_license_to_a_new_id_starts_without_credits() {
    let service = service().await;

    service
        .grant_license("556", "user_556", "2099-01-01")
        .await
        .unwrap();

    let users = service.list_all().await.unwrap();
    let granted = users.iter().find(|u| u.user_id == "556").unwrap();
    assert_eq!(granted.credits, 0);

    // Active license still admits; credits only matter once it lapses.
    assert!(matches!(
        service.check_access("556").await.unwrap(),
        AccessVerdict::Premium { .. }
    ));
}

#[tokio::test]
async fn delete_reports_whether_a_record_existed() {
    let service = service().await;
    service.register_trial("108", "Grace").await.unwrap();

    assert!(service.delete("108").await.unwrap());
    assert!(!service.delete("108").await.unwrap());

    assert_eq!(
        service.check_access("108").await.unwrap(),
        AccessVerdict::Denied(vidra::services::DenialReason::NotRegistered)
    );
}

#[tokio::test]
async fn list_active_filters_and_sorts_by_soonest_expiry() {
    let service = service().await;

    service
        .grant_license("201", "user_201", "2099-06-01")
        .await
        .unwrap();
    service
        .grant_license("202", "user_202", "2099-01-01")
        .await
        .unwrap();
    service
        .grant_license("203", "user_203", "2000-06-01")
        .await
        .unwrap();
    service.register_trial("204", "TrialOnly").await.unwrap();

    let active = service.list_active().await.unwrap();
    let ids: Vec<&str> = active.iter().map(|u| u.user_id.as_str()).collect();
    assert_eq!(ids, vec!["202", "201"]);
}

#[tokio::test]
async fn list_all_puts_trial_only_users_last() {
    let service = service().await;

    service.register_trial("301", "TrialOnly").await.unwrap();
    service
        .grant_license("302", "user_302", "2099-01-01")
        .await
        .unwrap();

    let all = service.list_all().await.unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(all[0].user_id, "302");
    assert_eq!(all[1].user_id, "301");
}
