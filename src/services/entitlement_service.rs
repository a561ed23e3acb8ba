//! Domain service for the per-user entitlement model.
//!
//! Splits the read-only access check (run before every privileged action)
//! from the mutating credit debit (run once per completed generation) so a
//! single logical action can be gated several times without double-charging.

use thiserror::Error;

use crate::db::UserRecord;
use crate::services::access::AccessVerdict;

/// Errors specific to entitlement operations.
#[derive(Debug, Error)]
pub enum EntitlementError {
    #[error("Invalid date: {0}")]
    InvalidDate(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<sea_orm::DbErr> for EntitlementError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for EntitlementError {
    fn from(err: anyhow::Error) -> Self {
        Self::Database(err.to_string())
    }
}

/// Domain service trait for entitlement decisions and admin mutations.
#[async_trait::async_trait]
pub trait EntitlementService: Send + Sync {
    /// Creates the record with the trial allowance if absent; idempotent.
    /// Returns whether a new record was created.
    async fn register_trial(
        &self,
        user_id: &str,
        display_name: &str,
    ) -> Result<bool, EntitlementError>;

    /// Read-only admission check against today's date.
    async fn check_access(&self, user_id: &str) -> Result<AccessVerdict, EntitlementError>;

    /// Validates and normalizes the expiry input, then upserts the record.
    /// Returns a confirmation line for the admin.
    ///
    /// # Errors
    ///
    /// Returns [`EntitlementError::InvalidDate`] without touching storage if
    /// the input does not parse to a real calendar date.
    async fn grant_license(
        &self,
        user_id: &str,
        display_name: &str,
        expiration_input: &str,
    ) -> Result<String, EntitlementError>;

    /// License-based block: sets the expiry to a past sentinel, leaving the
    /// credit counter untouched.
    async fn block(&self, user_id: &str) -> Result<(), EntitlementError>;

    /// Removes the record. Returns whether anything was deleted.
    async fn delete(&self, user_id: &str) -> Result<bool, EntitlementError>;

    /// All records, newest expiry first (trial-only records last).
    async fn list_all(&self) -> Result<Vec<UserRecord>, EntitlementError>;

    /// Records with an expiry on or after today, soonest first.
    async fn list_active(&self) -> Result<Vec<UserRecord>, EntitlementError>;

    /// Settles one generation: no-op for absent or premium-active users,
    /// otherwise subtracts exactly one credit. Deliberately not idempotent,
    /// and deliberately unguarded at this layer: the caller is expected to
    /// have passed `check_access` before starting the work that led here.
    async fn debit(&self, user_id: &str) -> Result<(), EntitlementError>;
}
