use std::sync::Arc;

pub mod account;
pub mod alert;

use crate::db::AccountStore;
use crate::services::AlertService;

#[derive(Clone)]
pub struct AppState {
    pub alert_service: Arc<AlertService>,
    pub account_store: Arc<AccountStore>,
}

impl AppState {
    pub fn new(alert_service: Arc<AlertService>, account_store: Arc<AccountStore>) -> Self {
        Self {
            alert_service,
            account_store,
        }
    }
}
