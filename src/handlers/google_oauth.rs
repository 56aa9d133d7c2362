use crate::config::DEFAULT_USER_ID;
use crate::{NexusError, router::NexusState};
use axum::{
    Json,
    extract::{Query, State},
    response::{IntoResponse, Redirect},
};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{info, warn};

#[derive(Debug, Deserialize)]
pub struct AuthEntryQuery {
    pub user_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AuthCallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

/// GET /auth/google?user_id=.. -> redirects to Google's OAuth2 consent page.
pub async fn google_oauth_entry(
    State(state): State<NexusState>,
    Query(query): Query<AuthEntryQuery>,
) -> impl IntoResponse {
    let user_id = non_empty_or_default(query.user_id);
    let auth_url = state.oauth.authorize_url(&user_id);

    info!(user_id, "Dispatching OAuth redirect");
    Redirect::temporary(auth_url.as_str())
}

/// GET /auth/google/callback -> exchanges the code and stores the user's tokens.
pub async fn google_oauth_callback(
    State(state): State<NexusState>,
    Query(query): Query<AuthCallbackQuery>,
) -> Result<Json<Value>, NexusError> {
    if let Some(error) = query.error {
        return Err(NexusError::OauthFlowError(format!(
            "authorization was not granted: {error}"
        )));
    }
    let code = query
        .code
        .ok_or_else(|| NexusError::OauthFlowError("missing `code` in callback".to_string()))?;
    let user_id = non_empty_or_default(query.state);

    let grant = state.oauth.exchange_code(code).await?;
    if grant.refresh_token.is_none() {
        warn!(user_id, "OAuth response missing refresh_token; keeping any stored one");
    }

    state
        .store
        .upsert(&user_id, grant.access_token, grant.refresh_token, grant.expiry)
        .await?;

    info!(user_id, "OAuth callback stored credential");
    Ok(Json(json!({
        "status": "sheets connected successfully",
        "user": user_id,
    })))
}

fn non_empty_or_default(user_id: Option<String>) -> String {
    user_id
        .filter(|u| !u.is_empty())
        .unwrap_or_else(|| DEFAULT_USER_ID.to_string())
}
