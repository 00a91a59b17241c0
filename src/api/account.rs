use axum::{ extract::State, http::StatusCode, Json };
use serde::{ Deserialize, Serialize };

use crate::error::Result;

use super::AppState;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveAccountRequest {
    pub username: String,
    pub email: String,
    pub device_token: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountResponse {
    pub account: AccountPayload,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountPayload {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub device_token: String,
}

pub async fn save_account(
    State(state): State<AppState>,
    Json(request): Json<SaveAccountRequest>
) -> Result<(StatusCode, Json<AccountResponse>)> {
    let account = state.account_store.create(
        request.username,
        request.email,
        request.device_token
    ).await?;

    Ok((
        StatusCode::CREATED,
        Json(AccountResponse {
            account: AccountPayload {
                id: account.id,
                username: account.username,
                email: account.email,
                device_token: account.device_token,
            },
        }),
    ))
}
