//! `SeaORM` implementation of the `EntitlementService` trait.

use async_trait::async_trait;
use chrono::{Local, NaiveDate};
use tracing::debug;

use crate::constants::{license, trial};
use crate::db::{Store, UserRecord};
use crate::services::access::{self, AccessVerdict};
use crate::services::entitlement_service::{EntitlementError, EntitlementService};

pub struct SeaOrmEntitlementService {
    store: Store,
}

impl SeaOrmEntitlementService {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }

    fn today() -> NaiveDate {
        Local::now().date_naive()
    }

    /// Accepts a couple of common admin input shapes and normalizes to
    /// `YYYY-MM-DD`. Impossible dates (2026-02-30) fail like malformed ones.
    fn normalize_date(input: &str) -> Result<String, EntitlementError> {
        const FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%d.%m.%Y"];

        FORMATS
            .iter()
            .find_map(|fmt| NaiveDate::parse_from_str(input.trim(), fmt).ok())
            .map(|date| date.format("%Y-%m-%d").to_string())
            .ok_or_else(|| EntitlementError::InvalidDate(input.to_string()))
    }
}

#[async_trait]
impl EntitlementService for SeaOrmEntitlementService {
    async fn register_trial(
        &self,
        user_id: &str,
        display_name: &str,
    ) -> Result<bool, EntitlementError> {
        let created = self
            .store
            .user_repo()
            .register_trial(user_id, display_name, trial::INITIAL_CREDITS)
            .await?;

        Ok(created)
    }

    async fn check_access(&self, user_id: &str) -> Result<AccessVerdict, EntitlementError> {
        let record = self.store.user_repo().get(user_id).await?;
        Ok(access::evaluate(record.as_ref(), Self::today()))
    }

    async fn grant_license(
        &self,
        user_id: &str,
        display_name: &str,
        expiration_input: &str,
    ) -> Result<String, EntitlementError> {
        let expiration = Self::normalize_date(expiration_input)?;

        self.store
            .user_repo()
            .upsert_license(user_id, display_name, &expiration)
            .await?;

        Ok(format!(
            "License for {display_name} updated until {expiration}"
        ))
    }

    async fn block(&self, user_id: &str) -> Result<(), EntitlementError> {
        self.store
            .user_repo()
            .upsert_license(user_id, license::BLOCKED_DISPLAY_NAME, license::BLOCKED_SENTINEL)
            .await?;

        Ok(())
    }

    async fn delete(&self, user_id: &str) -> Result<bool, EntitlementError> {
        Ok(self.store.user_repo().delete(user_id).await?)
    }

    async fn list_all(&self) -> Result<Vec<UserRecord>, EntitlementError> {
        Ok(self.store.user_repo().list_all().await?)
    }

    async fn list_active(&self) -> Result<Vec<UserRecord>, EntitlementError> {
        let today = Self::today().format("%Y-%m-%d").to_string();
        Ok(self.store.user_repo().list_active(&today).await?)
    }

    async fn debit(&self, user_id: &str) -> Result<(), EntitlementError> {
        let Some(record) = self.store.user_repo().get(user_id).await? else {
            return Ok(());
        };

        if access::is_premium_active(&record, Self::today()) {
            debug!(user_id, "premium-active user, no credit deduction");
            return Ok(());
        }

        self.store.user_repo().decrement_credit(user_id).await?;
        debug!(user_id, "trial credit deducted");

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_accepts_common_formats() {
        assert_eq!(
            SeaOrmEntitlementService::normalize_date("2026-09-01").unwrap(),
            "2026-09-01"
        );
        assert_eq!(
            SeaOrmEntitlementService::normalize_date("2026/09/01").unwrap(),
            "2026-09-01"
        );
        assert_eq!(
            SeaOrmEntitlementService::normalize_date("01.09.2026").unwrap(),
            "2026-09-01"
        );
    }

    #[test]
    fn normalize_rejects_garbage_and_impossible_dates() {
        assert!(matches!(
            SeaOrmEntitlementService::normalize_date("not-a-date"),
            Err(EntitlementError::InvalidDate(_))
        ));
        assert!(matches!(
            SeaOrmEntitlementService::normalize_date("2026-02-30"),
            Err(EntitlementError::InvalidDate(_))
        ));
    }
}
