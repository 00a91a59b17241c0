use axum::{ extract::{ Path, Query, State }, http::StatusCode, Json };
use chrono::{ DateTime, Utc };
use serde::{ Deserialize, Serialize };

use crate::db::entity::{ account, alert };
use crate::db::ListAlertsCriteria;
use crate::error::Result;
use crate::services::CreateAlertRequest;

use super::AppState;

const DEFAULT_PAGE_LIMIT: u64 = 5;

// Requests and responses keep the alert wrapped in an envelope, matching
// the clients this service already has.

#[derive(Deserialize)]
pub struct SaveAlertBody {
    pub alert: SaveAlertRequest,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveAlertRequest {
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

#[derive(Serialize)]
pub struct AlertResponse {
    pub alert: AlertPayload,
}

#[derive(Serialize)]
pub struct AlertsResponse {
    pub alerts: Vec<AlertPayload>,
    #[serde(rename = "alertsCount")]
    pub alerts_count: u64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertPayload {
    pub slug: String,
    pub title: String,
    pub body: String,
    pub pair_address: String,
    pub alert_type: String,
    pub alert_value: String,
    pub alert_option: String,
    pub expiration_time: DateTime<Utc>,
    pub alert_actions: String,
    pub alert_status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account: Option<AccountPayload>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountPayload {
    pub id: i64,
    pub username: String,
    pub email: String,
}

impl AlertPayload {
    fn from_parts(alert: alert::Model, account: Option<account::Model>) -> Self {
        Self {
            slug: alert.slug,
            title: alert.title,
            body: alert.body,
            pair_address: alert.pair_address,
            alert_type: alert.alert_type,
            alert_value: alert.alert_value,
            alert_option: alert.alert_option,
            expiration_time: alert.expiration_time,
            alert_actions: alert.alert_actions,
            alert_status: alert.alert_status,
            created_at: alert.created_at,
            updated_at: alert.updated_at,
            account: account.map(|account| AccountPayload {
                id: account.id,
                username: account.username,
                email: account.email,
            }),
        }
    }
}

pub async fn save_alert(
    State(state): State<AppState>,
    Json(body): Json<SaveAlertBody>
) -> Result<(StatusCode, Json<AlertResponse>)> {
    let request = body.alert;
    // An unknown owner is NotFound here, not a foreign key error later.
    state.account_store.find_by_id(request.account_id).await?;
    let created = state.alert_service.create_alert(CreateAlertRequest {
        account_id: request.account_id,
        title: request.title,
        body: request.body,
        pair_address: request.pair_address,
        alert_type: request.alert_type,
        alert_value: request.alert_value,
        alert_option: request.alert_option,
        expiration_time: request.expiration_time,
        alert_actions: request.alert_actions,
    }).await?;

    Ok((
        StatusCode::CREATED,
        Json(AlertResponse { alert: AlertPayload::from_parts(created, None) }),
    ))
}

pub async fn alert_by_slug(
    State(state): State<AppState>,
    Path(slug): Path<String>
) -> Result<Json<AlertResponse>> {
    let (alert, account) = state.alert_service.alert_by_slug(&slug).await?;

    Ok(Json(AlertResponse { alert: AlertPayload::from_parts(alert, Some(account)) }))
}

#[derive(Deserialize)]
pub struct ListAlertsQuery {
    pub account: Option<i64>,
    #[serde(default)]
    pub offset: u64,
    pub limit: Option<u64>,
}

pub async fn alerts(
    State(state): State<AppState>,
    Query(query): Query<ListAlertsQuery>
) -> Result<Json<AlertsResponse>> {
    let criteria = ListAlertsCriteria {
        account: query.account,
        offset: query.offset,
        limit: query.limit.unwrap_or(DEFAULT_PAGE_LIMIT),
    };
    let (page, total) = state.alert_service.alerts(&criteria).await?;

    Ok(
        Json(AlertsResponse {
            alerts: page
                .into_iter()
                .map(|(alert, account)| AlertPayload::from_parts(alert, Some(account)))
                .collect(),
            alerts_count: total,
        })
    )
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteAlertQuery {
    pub account_id: i64,
}

pub async fn delete_alert(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(query): Query<DeleteAlertQuery>
) -> Result<StatusCode> {
    state.alert_service.delete_alert(query.account_id, &slug).await?;
    Ok(StatusCode::OK)
}
