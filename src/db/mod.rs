use std::time::Duration;

use sea_orm::{ entity::prelude::*, ConnectOptions, Database, DatabaseConnection, Set, SqlErr };

use crate::config::Config;
use crate::error::{ AppError, Result };

pub mod entity;
pub use entity::*;

mod alert_store;
pub use alert_store::{ AlertStore, ListAlertsCriteria, NewAlert };

const CONNECT_ATTEMPTS: u32 = 30;
const CONNECT_BACKOFF: Duration = Duration::from_millis(500);

/// Opens the connection pool, retrying while the database comes up.
pub async fn connect(config: &Config) -> Result<DatabaseConnection> {
    let mut options = ConnectOptions::new(&config.database_url);
    options
        .max_connections(config.db_max_connections)
        .min_connections(config.db_min_connections);

    let mut attempt = 0;
    loop {
        match Database::connect(options.clone()).await {
            Ok(db) => return Ok(db),
            Err(e) if attempt + 1 < CONNECT_ATTEMPTS => {
                attempt += 1;
                tracing::warn!(error = %e, attempt, "database not ready, retrying");
                tokio::time::sleep(CONNECT_BACKOFF).await;
            }
            Err(e) => return Err(AppError::Database(e)),
        }
    }
}

pub struct AccountStore {
    db: DatabaseConnection,
}

impl AccountStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn create(
        &self,
        username: String,
        email: String,
        device_token: String
    ) -> Result<entity::account::Model> {
        let now = chrono::Utc::now();
        let account = entity::account::ActiveModel {
            username: Set(username),
            email: Set(email),
            device_token: Set(device_token),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        match account.insert(&self.db).await {
            Ok(account) => Ok(account),
            Err(e) => {
                if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
                    return Err(AppError::KeyConflict("username".to_string()));
                }
                Err(AppError::Database(e))
            }
        }
    }

    pub async fn find_by_id(&self, id: i64) -> Result<entity::account::Model> {
        entity::account::Entity::find_by_id(id).one(&self.db).await?.ok_or(AppError::NotFound)
    }
}
