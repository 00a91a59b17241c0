use sea_orm::entity::prelude::*;
use serde::{ Deserialize, Serialize };

/// A live alert has deleted_at_unix = 0; soft deletion stamps the row with
/// the deletion time so the slug can be reused by a new row.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "alerts")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub slug: String,
    pub title: String,
    pub body: String,
    pub pair_address: String,
    pub alert_type: String,
    pub alert_value: String,
    pub alert_option: String,
    pub expiration_time: DateTimeUtc,
    pub alert_actions: String,
    pub alert_status: String,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
    pub deleted_at_unix: i64,
    pub account_id: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::account::Entity",
        from = "Column::AccountId",
        to = "super::account::Column::Id"
    )]
    Account,
}

impl Related<super::account::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Account.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
