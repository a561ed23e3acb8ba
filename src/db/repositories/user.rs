use anyhow::{Context, Result};
use chrono::NaiveDate;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, Order, QueryFilter, QueryOrder,
    Set,
};

use crate::entities::users;

/// One entitlement record per external user identity.
#[derive(Debug, Clone)]
pub struct UserRecord {
    pub user_id: String,
    pub display_name: String,
    pub expiration_date: Option<String>,
    pub credits: i32,
}

impl UserRecord {
    /// Parses the stored expiry into a calendar date. An unparseable value is
    /// treated the same as no license at all, so stale rows fall back to the
    /// credit path instead of failing the whole access check.
    #[must_use]
    pub fn expiration(&self) -> Option<NaiveDate> {
        self.expiration_date
            .as_deref()
            .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
    }
}

impl From<users::Model> for UserRecord {
    fn from(model: users::Model) -> Self {
        Self {
            user_id: model.user_id,
            display_name: model.display_name,
            expiration_date: model.expiration_date,
            credits: model.credits,
        }
    }
}

pub struct UserRepository {
    conn: DatabaseConnection,
}

impl UserRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn get(&self, user_id: &str) -> Result<Option<UserRecord>> {
        let user = users::Entity::find_by_id(user_id)
            .one(&self.conn)
            .await
            .context("Failed to query user by id")?;

        Ok(user.map(UserRecord::from))
    }

    /// Creates the record with the trial credit allowance if it does not
    /// exist yet. Returns whether a new record was created.
    pub async fn register_trial(
        &self,
        user_id: &str,
        display_name: &str,
        trial_credits: i32,
    ) -> Result<bool> {
        let existing = users::Entity::find_by_id(user_id)
            .one(&self.conn)
            .await
            .context("Failed to query user for trial registration")?;

        if existing.is_some() {
            return Ok(false);
        }

        let record = users::ActiveModel {
            user_id: Set(user_id.to_string()),
            display_name: Set(display_name.to_string()),
            expiration_date: Set(None),
            credits: Set(trial_credits),
        };
        record
            .insert(&self.conn)
            .await
            .context("Failed to insert trial user")?;

        Ok(true)
    }

    /// Upserts a license expiry. Credits are left untouched for existing
    /// records; a brand-new record starts with zero credits, since license
    /// creation is not trial registration. This also keeps a pre-emptive
    /// block on an unregistered id an actual denial.
    pub async fn upsert_license(
        &self,
        user_id: &str,
        display_name: &str,
        expiration_date: &str,
    ) -> Result<()> {
        let existing = users::Entity::find_by_id(user_id)
            .one(&self.conn)
            .await
            .context("Failed to query user for license upsert")?;

        match existing {
            Some(user) => {
                let mut active: users::ActiveModel = user.into();
                active.display_name = Set(display_name.to_string());
                active.expiration_date = Set(Some(expiration_date.to_string()));
                active
                    .update(&self.conn)
                    .await
                    .context("Failed to update license")?;
            }
            None => {
                let record = users::ActiveModel {
                    user_id: Set(user_id.to_string()),
                    display_name: Set(display_name.to_string()),
                    expiration_date: Set(Some(expiration_date.to_string())),
                    credits: Set(0),
                };
                record
                    .insert(&self.conn)
                    .await
                    .context("Failed to insert licensed user")?;
            }
        }

        Ok(())
    }

    pub async fn delete(&self, user_id: &str) -> Result<bool> {
        let result = users::Entity::delete_by_id(user_id)
            .exec(&self.conn)
            .await
            .context("Failed to delete user")?;

        Ok(result.rows_affected > 0)
    }

    /// All records, newest expiry first. SQLite sorts NULL as the smallest
    /// value, so trial-only rows land at the end of the descending order.
    pub async fn list_all(&self) -> Result<Vec<UserRecord>> {
        let rows = users::Entity::find()
            .order_by(users::Column::ExpirationDate, Order::Desc)
            .all(&self.conn)
            .await
            .context("Failed to list users")?;

        Ok(rows.into_iter().map(UserRecord::from).collect())
    }

    /// Records with an expiry on or after `today`, soonest first.
    pub async fn list_active(&self, today: &str) -> Result<Vec<UserRecord>> {
        let rows = users::Entity::find()
            .filter(users::Column::ExpirationDate.gte(today))
            .order_by(users::Column::ExpirationDate, Order::Asc)
            .all(&self.conn)
            .await
            .context("Failed to list active users")?;

        Ok(rows.into_iter().map(UserRecord::from).collect())
    }

    /// Subtracts one credit unconditionally. The premium guard lives in the
    /// entitlement service, not here; this is a single-statement write so the
    /// storage engine serializes it.
    pub async fn decrement_credit(&self, user_id: &str) -> Result<()> {
        users::Entity::update_many()
            .col_expr(
                users::Column::Credits,
                Expr::col(users::Column::Credits).sub(1),
            )
            .filter(users::Column::UserId.eq(user_id))
            .exec(&self.conn)
            .await
            .context("Failed to decrement credit")?;

        Ok(())
    }
}
