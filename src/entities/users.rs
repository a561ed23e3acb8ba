use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    /// External chat-platform identity, stable for the lifetime of the record.
    #[sea_orm(primary_key, auto_increment = false)]
    pub user_id: String,

    /// Last-known human-readable label; overwritten on license updates.
    pub display_name: String,

    /// `YYYY-MM-DD` license expiry. `None` means the user never had a paid
    /// period (trial-only).
    pub expiration_date: Option<String>,

    /// Remaining free generations. Seeded at registration, decremented by
    /// completed generations while no license is active.
    pub credits: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
