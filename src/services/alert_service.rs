use std::sync::Arc;

use chrono::{ DateTime, Utc };

use crate::db::entity::{ account, alert };
use crate::db::{ AlertStore, ListAlertsCriteria, NewAlert };
use crate::enums::{ AlertKind, AlertOp, AlertStatus };
use crate::error::{ AppError, Result };

const MIN_TITLE_LEN: usize = 5;
const MIN_PAIR_ADDRESS_LEN: usize = 20;

#[derive(Debug, Clone)]
pub struct CreateAlertRequest {
    pub account_id: i64,
    pub title: String,
    pub body: String,
    pub pair_address: String,
    pub alert_type: String,
    pub alert_value: String,
    pub alert_option: String,
    pub expiration_time: DateTime<Utc>,
    pub alert_actions: String,
}

#[derive(Clone)]
pub struct AlertService {
    store: Arc<AlertStore>,
}

impl AlertService {
    pub fn new(store: Arc<AlertStore>) -> Self {
        Self { store }
    }

    /// Create a new alert. The slug is derived from the title and stays
    /// taken until the alert is deleted.
    pub async fn create_alert(&self, req: CreateAlertRequest) -> Result<alert::Model> {
        validate(&req)?;

        let alert = NewAlert {
            slug: slugify(&req.title),
            title: req.title,
            body: req.body,
            pair_address: req.pair_address,
            alert_type: req.alert_type,
            alert_value: req.alert_value,
            alert_option: req.alert_option,
            expiration_time: req.expiration_time,
            alert_actions: req.alert_actions,
            alert_status: AlertStatus::Active,
            account_id: req.account_id,
        };

        self.store.save_alert(self.store.db(), alert).await
    }

    pub async fn alert_by_slug(&self, slug: &str) -> Result<(alert::Model, account::Model)> {
        self.store.find_alert_by_slug(self.store.db(), slug).await
    }

    pub async fn alerts(
        &self,
        criteria: &ListAlertsCriteria
    ) -> Result<(Vec<(alert::Model, account::Model)>, u64)> {
        self.store.find_alerts(self.store.db(), criteria).await
    }

    /// Delete an alert owned by `account_id`, inside a transaction.
    pub async fn delete_alert(&self, account_id: i64, slug: &str) -> Result<()> {
        let store = self.store.clone();
        let slug = slug.to_string();
        self.store.run_in_tx(move |txn| {
            Box::pin(async move { store.delete_alert_by_slug(txn, account_id, &slug).await })
        }).await
    }
}

fn validate(req: &CreateAlertRequest) -> Result<()> {
    if req.title.trim().len() < MIN_TITLE_LEN {
        return Err(
            AppError::InvalidInput(format!("Title must be at least {} characters", MIN_TITLE_LEN))
        );
    }
    if req.pair_address.len() < MIN_PAIR_ADDRESS_LEN {
        return Err(
            AppError::InvalidInput(
                format!("Pair address must be at least {} characters", MIN_PAIR_ADDRESS_LEN)
            )
        );
    }
    req.alert_type.parse::<AlertKind>()?;
    req.alert_option.parse::<AlertOp>()?;
    req.alert_value
        .parse::<f64>()
        .map_err(|_| {
            AppError::InvalidInput(format!("Invalid alert value: {}", req.alert_value))
        })?;
    Ok(())
}

/// Lowercased alphanumeric runs joined by single hyphens.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_hyphen = false;
    for c in title.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_hyphen = true;
        }
    }
    slug
}
