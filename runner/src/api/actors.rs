//! Actor listing and input schema endpoints

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::Json;
use reqwest::Method;
use serde_json::Value;
use shared_types::{ActorInfo, ActorSummary, CredentialRequest, ListActorsResponse, SchemaResponse};
use tracing::{debug, info};

use super::{parse_body, require_credential, ApiError};
use crate::platform::{endpoints, unwrap_data};
use crate::schema::{self, ActorMetadata};
use crate::state::AppState;

/// POST /api/actors: actors owned by the caller
pub async fn list_actors(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<ListActorsResponse>, ApiError> {
    let request: CredentialRequest = parse_body(&body)?;
    let credential = require_credential(&headers, request.api_token.as_deref())?;

    let payload = state
        .platform
        .call(&endpoints::list_actors(), &credential, Method::GET, None)
        .await
        .into_result()
        .map_err(ApiError::upstream)?;

    let actors = unwrap_data(&payload)
        .get("items")
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(project_actor).collect())
        .unwrap_or_default();

    Ok(Json(ListActorsResponse { actors }))
}

/// POST /api/actors/{actor_id}/schema: effective input schema
pub async fn get_schema(
    State(state): State<Arc<AppState>>,
    Path(actor_id): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<SchemaResponse>, ApiError> {
    let request: CredentialRequest = parse_body(&body)?;
    let credential = require_credential(&headers, request.api_token.as_deref())?;

    let actor_endpoint = endpoints::actor(&actor_id);
    let build_endpoint = endpoints::default_build(&actor_id);
    let (actor, build) = tokio::join!(
        state
            .platform
            .call(&actor_endpoint, &credential, Method::GET, None),
        state
            .platform
            .call(&build_endpoint, &credential, Method::GET, None),
    );

    let actor = actor.into_result().map_err(ApiError::upstream)?;
    let default_build = match build.into_result() {
        Ok(payload) => Some(unwrap_data(&payload).clone()),
        Err((status_code, message)) => {
            debug!(actor_id = %actor_id, status_code, message = %message, "default build unavailable");
            None
        }
    };

    let metadata = ActorMetadata::new(unwrap_data(&actor).clone(), default_build);
    let schema = schema::resolve(&metadata);
    info!(
        actor_id = %actor_id,
        properties = schema.properties.len(),
        "resolved actor input schema"
    );

    Ok(Json(SchemaResponse {
        schema,
        actor_info: actor_info(&metadata.actor, &actor_id),
    }))
}

fn project_actor(item: &Value) -> Option<ActorSummary> {
    let text = |key: &str| item.get(key).and_then(Value::as_str).map(ToString::to_string);
    Some(ActorSummary {
        id: text("id")?,
        name: text("name").unwrap_or_default(),
        title: text("title"),
        description: text("description"),
        username: text("username"),
    })
}

fn actor_info(actor: &Value, actor_id: &str) -> ActorInfo {
    let text = |key: &str| actor.get(key).and_then(Value::as_str).map(ToString::to_string);
    ActorInfo {
        name: text("name").unwrap_or_else(|| actor_id.to_string()),
        title: text("title"),
        description: text("description"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_projection_keeps_listed_fields_only() {
        let item = json!({
            "id": "a1",
            "name": "scraper",
            "title": "Web Scraper",
            "username": "alice",
            "stats": { "totalRuns": 4 }
        });
        let summary = project_actor(&item).unwrap();
        assert_eq!(summary.id, "a1");
        assert_eq!(summary.name, "scraper");
        assert_eq!(summary.title.as_deref(), Some("Web Scraper"));
        assert!(summary.description.is_none());
        assert_eq!(summary.username.as_deref(), Some("alice"));

        assert!(project_actor(&json!({ "name": "no id" })).is_none());
    }

    #[test]
    fn test_actor_info_falls_back_to_id() {
        let info = actor_info(&json!({}), "alice~scraper");
        assert_eq!(info.name, "alice~scraper");
        assert!(info.title.is_none());
    }
}
