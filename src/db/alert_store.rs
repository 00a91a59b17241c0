use std::future::Future;
use std::pin::Pin;

use chrono::{ DateTime, Utc };
use sea_orm::{
    ActiveModelTrait,
    ColumnTrait,
    ConnectionTrait,
    DatabaseConnection,
    DatabaseTransaction,
    EntityTrait,
    JoinType,
    PaginatorTrait,
    QueryFilter,
    QueryOrder,
    QuerySelect,
    RelationTrait,
    Set,
    SqlErr,
    TransactionTrait,
};

use crate::db::entity::{ account, alert, Alert };
use crate::enums::AlertStatus;
use crate::error::{ AppError, Result };

/// Field set for a new alert row; id and timestamps are filled on insert.
#[derive(Debug, Clone)]
pub struct NewAlert {
    pub slug: String,
    pub title: String,
    pub body: String,
    pub pair_address: String,
    pub alert_type: String,
    pub alert_value: String,
    pub alert_option: String,
    pub expiration_time: DateTime<Utc>,
    pub alert_actions: String,
    pub alert_status: AlertStatus,
    pub account_id: i64,
}

#[derive(Debug, Clone, Default)]
pub struct ListAlertsCriteria {
    /// Restrict to alerts owned by this account.
    pub account: Option<i64>,
    pub offset: u64,
    pub limit: u64,
}

/// All reads and writes honor soft deletion: rows with a nonzero
/// deleted_at_unix are invisible to every operation here.
pub struct AlertStore {
    db: DatabaseConnection,
}

impl AlertStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Connection handle for operations running outside a transaction.
    pub fn db(&self) -> &DatabaseConnection {
        &self.db
    }

    /// Runs `func` inside a transaction: commit on Ok, rollback on Err.
    /// A failed rollback is reported together with the error that caused it.
    pub async fn run_in_tx<T, F>(&self, func: F) -> Result<T>
        where
            T: Send,
            F: for<'c> FnOnce(
                &'c DatabaseTransaction
            ) -> Pin<Box<dyn Future<Output = Result<T>> + Send + 'c>> +
                Send
    {
        let txn = self.db.begin().await?;
        match func(&txn).await {
            Ok(value) => {
                txn.commit().await.map_err(|e| AppError::Internal(format!("commit tx: {}", e)))?;
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback_err) = txn.rollback().await {
                    return Err(
                        AppError::Internal(
                            format!("rollback tx: {} (caused by: {})", rollback_err, err)
                        )
                    );
                }
                Err(err)
            }
        }
    }

    pub async fn save_alert<C: ConnectionTrait>(
        &self,
        conn: &C,
        alert: NewAlert
    ) -> Result<alert::Model> {
        let now = Utc::now();
        let row = alert::ActiveModel {
            slug: Set(alert.slug),
            title: Set(alert.title),
            body: Set(alert.body),
            pair_address: Set(alert.pair_address),
            alert_type: Set(alert.alert_type),
            alert_value: Set(alert.alert_value),
            alert_option: Set(alert.alert_option),
            expiration_time: Set(alert.expiration_time),
            alert_actions: Set(alert.alert_actions),
            alert_status: Set(alert.alert_status.as_str().to_string()),
            created_at: Set(now),
            updated_at: Set(now),
            deleted_at_unix: Set(0),
            account_id: Set(alert.account_id),
            ..Default::default()
        };

        match row.insert(conn).await {
            Ok(created) => Ok(created),
            Err(e) => {
                if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
                    return Err(AppError::KeyConflict("slug".to_string()));
                }
                Err(AppError::Database(e))
            }
        }
    }

    /// Finds one live alert by slug, with its owning account joined in.
    pub async fn find_alert_by_slug<C: ConnectionTrait>(
        &self,
        conn: &C,
        slug: &str
    ) -> Result<(alert::Model, account::Model)> {
        let row = Alert::find()
            .find_also_related(account::Entity)
            .filter(alert::Column::Slug.eq(slug))
            .filter(alert::Column::DeletedAtUnix.eq(0))
            .one(conn).await?;

        match row {
            Some((alert, Some(account))) => Ok((alert, account)),
            Some((alert, None)) =>
                Err(AppError::Internal(format!("alert {} has no account row", alert.id))),
            None => Err(AppError::NotFound),
        }
    }

    /// Pages live alerts newest first, returning the page and the total
    /// count of live rows matching the criteria.
    ///
    /// Runs in two phases so the count and the page agree under joins:
    /// first distinct ids (counted, then paged), then hydration of the
    /// page ids with the account rows joined in.
    pub async fn find_alerts<C: ConnectionTrait>(
        &self,
        conn: &C,
        criteria: &ListAlertsCriteria
    ) -> Result<(Vec<(alert::Model, account::Model)>, u64)> {
        let mut ids_query = Alert::find().filter(alert::Column::DeletedAtUnix.eq(0));
        if let Some(account_id) = criteria.account {
            ids_query = ids_query
                .join(JoinType::LeftJoin, alert::Relation::Account.def())
                .filter(account::Column::Id.eq(account_id));
        }

        let total = ids_query
            .clone()
            .select_only()
            .column(alert::Column::Id)
            .distinct()
            .count(conn).await?;

        let ids: Vec<i64> = ids_query
            .select_only()
            .column(alert::Column::Id)
            .distinct()
            .order_by_desc(alert::Column::Id)
            .offset(criteria.offset)
            .limit(criteria.limit)
            .into_tuple()
            .all(conn).await?;

        if ids.is_empty() {
            return Ok((Vec::new(), total));
        }

        let rows = Alert::find()
            .find_also_related(account::Entity)
            .filter(alert::Column::Id.is_in(ids))
            .order_by_desc(alert::Column::Id)
            .all(conn).await?;

        let mut page = Vec::with_capacity(rows.len());
        for (alert, account) in rows {
            let account = account.ok_or_else(|| {
                AppError::Internal(format!("alert {} has no account row", alert.id))
            })?;
            page.push((alert, account));
        }

        Ok((page, total))
    }

    /// Soft deletes the live alert owned by `account_id` with this slug.
    pub async fn delete_alert_by_slug<C: ConnectionTrait>(
        &self,
        conn: &C,
        account_id: i64,
        slug: &str
    ) -> Result<()> {
        let now = Utc::now();
        let res = Alert::update_many()
            .set(alert::ActiveModel {
                deleted_at_unix: Set(now.timestamp()),
                updated_at: Set(now),
                ..Default::default()
            })
            .filter(alert::Column::Slug.eq(slug))
            .filter(alert::Column::AccountId.eq(account_id))
            .filter(alert::Column::DeletedAtUnix.eq(0))
            .exec(conn).await?;

        if res.rows_affected == 0 {
            return Err(AppError::NotFound);
        }
        Ok(())
    }

    /// Retires a fired alert. Only live rows still marked active move to
    /// triggered; anything else reports NotFound so a lost race is visible
    /// to the caller.
    pub async fn mark_alert_triggered<C: ConnectionTrait>(&self, conn: &C, id: i64) -> Result<()> {
        let res = Alert::update_many()
            .set(alert::ActiveModel {
                alert_status: Set(AlertStatus::Triggered.as_str().to_string()),
                updated_at: Set(Utc::now()),
                ..Default::default()
            })
            .filter(alert::Column::Id.eq(id))
            .filter(alert::Column::DeletedAtUnix.eq(0))
            .filter(alert::Column::AlertStatus.eq(AlertStatus::Active.as_str()))
            .exec(conn).await?;

        if res.rows_affected == 0 {
            return Err(AppError::NotFound);
        }
        Ok(())
    }
}
