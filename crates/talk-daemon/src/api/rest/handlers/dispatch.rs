//! The single action-dispatch endpoint.
//!
//! Every request names an `action`. Parameters come from the query string,
//! a JSON object body, or both (body fields win). Successful responses are
//! `{success: true, ...payload}`; failures are rendered by [`ApiError`].

use super::params::*;
use crate::api::rest::state::AppState;
use crate::error::{ApiError, ApiResult};
use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{HeaderMap, Method},
    response::{IntoResponse, Response},
    Json,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::fmt::Display;
use std::str::FromStr;
use talk_core::{GroupDraft, HistoryQuery, IdeaDraft, TalkError};
use talk_types::{
    AccessLevel, Actor, GroupId, GroupPatch, IdeaCategory, IdeaId, IdeaSource, IdeaStatus, Role,
    UserId,
};
use tracing::{debug, info_span, Instrument};
use uuid::Uuid;

/// Actions understood by the dispatcher
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ApiAction {
    CreateGroup,
    UpdateGroup,
    DeleteGroup,
    JoinGroup,
    LeaveGroup,
    UpdateMember,
    GetGroup,
    ListGroups,
    Save,
    Edit,
    Delete,
    Promote,
    ToggleShareable,
    CreateLink,
    GetLinks,
    History,
}

impl ApiAction {
    pub fn parse(name: &str) -> Option<Self> {
        let action = match name {
            "create_group" => ApiAction::CreateGroup,
            "update_group" => ApiAction::UpdateGroup,
            "delete_group" => ApiAction::DeleteGroup,
            "join_group" => ApiAction::JoinGroup,
            "leave_group" => ApiAction::LeaveGroup,
            "update_member" => ApiAction::UpdateMember,
            "get_group" => ApiAction::GetGroup,
            "list_groups" => ApiAction::ListGroups,
            "save" => ApiAction::Save,
            "edit" => ApiAction::Edit,
            "delete" => ApiAction::Delete,
            "promote" => ApiAction::Promote,
            "toggle_shareable" => ApiAction::ToggleShareable,
            "create_link" => ApiAction::CreateLink,
            "get_links" => ApiAction::GetLinks,
            "history" => ApiAction::History,
            _ => return None,
        };
        Some(action)
    }

    /// Mutations must arrive as POST
    pub fn is_mutation(&self) -> bool {
        !matches!(
            self,
            ApiAction::GetGroup | ApiAction::ListGroups | ApiAction::GetLinks | ApiAction::History
        )
    }
}

/// Action-dispatch entry point
pub async fn dispatch(
    State(state): State<AppState>,
    method: Method,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
    body: Bytes,
) -> Response {
    let actor = state.identity.actor(&headers);
    let params = match merge_params(query, &body) {
        Ok(params) => params,
        Err(err) => return err.into_response(),
    };
    let name = params
        .get("action")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .trim()
        .to_string();

    let span = info_span!(
        "dispatch",
        action = %name,
        request_id = %Uuid::new_v4(),
        actor = %actor,
    );

    async move {
        match run(&state, &method, actor, &name, params).await {
            Ok(payload) => {
                debug!("action completed");
                Json(payload).into_response()
            }
            Err(err) => {
                debug!(code = err.status_and_code().1, error = %err, "action failed");
                err.into_response()
            }
        }
    }
    .instrument(span)
    .await
}

async fn run(
    state: &AppState,
    method: &Method,
    actor: Actor,
    name: &str,
    params: Map<String, Value>,
) -> ApiResult<Value> {
    let action = ApiAction::parse(name).ok_or_else(|| ApiError::UnknownAction(name.to_string()))?;
    if action.is_mutation() && method != Method::POST {
        return Err(ApiError::MethodNotAllowed(name.to_string()));
    }

    let talk = state.talk.as_ref();
    match action {
        ApiAction::CreateGroup => {
            let req: CreateGroupRequest = decode(params)?;
            let draft = GroupDraft {
                name: req.name,
                description: req.description.unwrap_or_default(),
                tags: req.tags.unwrap_or_default(),
                access_level: parse_opt::<AccessLevel>(req.access_level.as_deref())?
                    .unwrap_or_default(),
                parent_group_id: req.parent_group_id.map(GroupId::new),
            };
            let group = talk.groups().create_group(actor, draft).await?;
            success(json!({ "group_id": group.id, "group": group }))
        }
        ApiAction::UpdateGroup => {
            let req: UpdateGroupRequest = decode(params)?;
            let patch = GroupPatch {
                description: req.description,
                tags: req.tags,
                access_level: parse_opt(req.access_level.as_deref())?,
                status: parse_opt(req.status.as_deref())?,
            };
            let group = talk
                .groups()
                .update_group(actor, GroupId::new(req.group_id), patch)
                .await?;
            success(json!({ "group": group }))
        }
        ApiAction::DeleteGroup => {
            let req: GroupRef = decode(params)?;
            talk.groups()
                .delete_group(actor, GroupId::new(req.group_id))
                .await?;
            success(json!({ "group_id": req.group_id }))
        }
        ApiAction::JoinGroup => {
            let req: GroupRef = decode(params)?;
            let membership = talk
                .groups()
                .join_group(actor, GroupId::new(req.group_id))
                .await?;
            success(json!({
                "group_id": membership.group_id,
                "role": membership.role,
                "membership": membership,
            }))
        }
        ApiAction::LeaveGroup => {
            let req: GroupRef = decode(params)?;
            talk.groups()
                .leave_group(actor, GroupId::new(req.group_id))
                .await?;
            success(json!({ "group_id": req.group_id }))
        }
        ApiAction::UpdateMember => {
            let req: UpdateMemberRequest = decode(params)?;
            let role: Role = parse_opt(req.role.as_deref())?
                .ok_or_else(|| TalkError::validation("role is required"))?;
            let member = talk
                .groups()
                .update_member(
                    actor,
                    GroupId::new(req.group_id),
                    UserId::new(req.user_id),
                    role,
                )
                .await?;
            success(json!({
                "user_id": member.user_id,
                "role": member.role,
                "member": member,
            }))
        }
        ApiAction::GetGroup => {
            let req: GroupRef = decode(params)?;
            let detail = talk
                .views()
                .get_group(actor, GroupId::new(req.group_id))
                .await?;
            success(&detail)
        }
        ApiAction::ListGroups => {
            let req: ListGroupsRequest = decode(params)?;
            let groups = talk
                .views()
                .list_groups(actor, req.mine.unwrap_or(false))
                .await?;
            success(json!({ "groups": groups }))
        }
        ApiAction::Save => {
            let req: SaveRequest = decode(params)?;
            let content = req
                .content
                .ok_or_else(|| TalkError::validation("content is required"))?;
            let mut draft = IdeaDraft::new(GroupId::new(req.group_id), content);
            if let Some(category) = req.category.as_deref() {
                draft = draft.with_category(IdeaCategory::parse_lenient(category));
            }
            if let Some(source) = req.source.as_deref() {
                draft = draft.with_source(IdeaSource::parse_lenient(source));
            }
            if let Some(parent) = req.parent_id {
                draft = draft.reply_to(IdeaId::new(parent));
            }
            let idea = talk.ideas().save(actor, draft).await?;
            success(json!({ "id": idea.id, "idea": idea }))
        }
        ApiAction::Edit => {
            let req: EditRequest = decode(params)?;
            let content = req
                .content
                .ok_or_else(|| TalkError::validation("content is required"))?;
            let idea = talk
                .ideas()
                .edit(actor, IdeaId::new(req.idea_id), &content)
                .await?;
            success(json!({ "id": idea.id, "idea": idea }))
        }
        ApiAction::Delete => {
            let req: IdeaRef = decode(params)?;
            let idea = talk.ideas().delete(actor, IdeaId::new(req.idea_id)).await?;
            success(json!({ "id": idea.id, "idea": idea }))
        }
        ApiAction::Promote => {
            let req: PromoteRequest = decode(params)?;
            let status: IdeaStatus = parse_opt(req.status.as_deref())?
                .ok_or_else(|| TalkError::validation("status is required"))?;
            let idea = talk
                .ideas()
                .promote(actor, IdeaId::new(req.idea_id), status)
                .await?;
            success(json!({ "id": idea.id, "status": idea.status, "idea": idea }))
        }
        ApiAction::ToggleShareable => {
            let req: ToggleShareableRequest = decode(params)?;
            let idea = talk
                .ideas()
                .toggle_shareable(actor, IdeaId::new(req.idea_id), req.shareable)
                .await?;
            success(json!({ "id": idea.id, "shareable": idea.shareable, "idea": idea }))
        }
        ApiAction::CreateLink => {
            let req: CreateLinkRequest = decode(params)?;
            let link = talk
                .links()
                .create_link(
                    actor,
                    IdeaId::new(req.idea_id_a),
                    IdeaId::new(req.idea_id_b),
                    req.link_type.as_deref(),
                )
                .await?;
            success(json!({ "id": link.id, "link": link }))
        }
        ApiAction::GetLinks => {
            let req: IdeaRef = decode(params)?;
            let links = talk
                .links()
                .get_links(actor, IdeaId::new(req.idea_id))
                .await?;
            success(json!({ "idea_id": req.idea_id, "links": links }))
        }
        ApiAction::History => {
            let req: HistoryRequest = decode(params)?;
            let limit = match req.limit {
                Some(n) if n < 0 => {
                    return Err(TalkError::validation("limit must not be negative").into())
                }
                Some(n) => Some(usize::try_from(n).unwrap_or(usize::MAX)),
                None => None,
            };
            let query = HistoryQuery {
                group_id: req.group_id.map(GroupId::new),
                limit,
                category: parse_opt(req.category.as_deref())?,
            };
            let ideas = talk.views().history(actor, query).await?;
            success(json!({ "count": ideas.len(), "ideas": ideas }))
        }
    }
}

/// Query-string pairs overlaid with the fields of a JSON object body.
fn merge_params(
    query: HashMap<String, String>,
    body: &[u8],
) -> ApiResult<Map<String, Value>> {
    let mut params: Map<String, Value> = query
        .into_iter()
        .map(|(key, value)| (key, Value::String(value)))
        .collect();

    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(params);
    }
    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(fields)) => {
            params.extend(fields);
            Ok(params)
        }
        Ok(_) => Err(ApiError::Malformed(
            "request body must be a JSON object".into(),
        )),
        Err(err) => Err(ApiError::Malformed(format!("invalid JSON body: {err}"))),
    }
}

fn decode<T: DeserializeOwned>(params: Map<String, Value>) -> ApiResult<T> {
    serde_json::from_value(Value::Object(params)).map_err(|e| ApiError::Malformed(e.to_string()))
}

/// Parse an optional enum field; blank counts as absent.
fn parse_opt<T>(raw: Option<&str>) -> ApiResult<Option<T>>
where
    T: FromStr,
    T::Err: Display,
{
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => value
            .parse()
            .map(Some)
            .map_err(|e: T::Err| TalkError::validation(e.to_string()).into()),
    }
}

/// Wrap a payload object as `{success: true, ...payload}`.
fn success<T: Serialize>(payload: T) -> ApiResult<Value> {
    let mut body = Map::new();
    body.insert("success".into(), Value::Bool(true));
    match serde_json::to_value(payload) {
        Ok(Value::Object(fields)) => body.extend(fields),
        Ok(other) => {
            body.insert("data".into(), other);
        }
        Err(err) => {
            return Err(TalkError::Storage(talk_storage::StorageError::Serialization(
                err.to_string(),
            ))
            .into())
        }
    }
    Ok(Value::Object(body))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::create_router;
    use crate::config::ServerConfig;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use axum::Router;
    use tower::ServiceExt;

    fn test_router() -> Router {
        create_router(AppState::in_memory(), &ServerConfig::default())
    }

    async fn call(
        app: &Router,
        method: &str,
        uri: &str,
        user: Option<i64>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(user) = user {
            builder = builder.header("x-talk-user-id", user.to_string());
        }
        let body = match body {
            Some(json) => {
                builder = builder.header("content-type", "application/json");
                Body::from(serde_json::to_string(&json).unwrap())
            }
            None => Body::empty(),
        };
        let resp = app
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    async fn post(app: &Router, user: i64, body: Value) -> Value {
        call(app, "POST", "/talk/api", Some(user), Some(body)).await.1
    }

    #[test]
    fn action_names() {
        assert_eq!(ApiAction::parse("save"), Some(ApiAction::Save));
        assert_eq!(ApiAction::parse("history"), Some(ApiAction::History));
        assert_eq!(ApiAction::parse("SAVE"), None);
        assert!(ApiAction::Delete.is_mutation());
        assert!(!ApiAction::GetLinks.is_mutation());
    }

    #[test]
    fn body_fields_override_query() {
        let query = HashMap::from([
            ("action".to_string(), "get_group".to_string()),
            ("group_id".to_string(), "1".to_string()),
        ]);
        let params = merge_params(query, br#"{"group_id": 2}"#).unwrap();
        assert_eq!(params["action"], "get_group");
        assert_eq!(params["group_id"], 2);

        assert!(merge_params(HashMap::new(), b"[1, 2]").is_err());
        assert!(merge_params(HashMap::new(), b"{oops").is_err());
        assert!(merge_params(HashMap::new(), b"  ").unwrap().is_empty());
    }

    #[tokio::test]
    async fn group_and_idea_flow() {
        let app = test_router();

        let created = post(
            &app,
            1,
            json!({"action": "create_group", "name": "Harness", "tags": "test, harness"}),
        )
        .await;
        assert_eq!(created["success"], true);
        let group_id = created["group_id"].as_i64().unwrap();
        assert_eq!(created["group"]["tags"], json!(["test", "harness"]));

        let joined = post(&app, 2, json!({"action": "join_group", "group_id": group_id})).await;
        assert_eq!(joined["success"], true);
        assert_eq!(joined["role"], "member");

        let saved = post(
            &app,
            2,
            json!({"action": "save", "group_id": group_id, "content": "WiFi upgrades"}),
        )
        .await;
        assert_eq!(saved["success"], true);
        let idea_id = saved["id"].as_i64().unwrap();
        assert_eq!(saved["idea"]["status"], "raw");

        let hijack = post(
            &app,
            1,
            json!({"action": "edit", "idea_id": idea_id, "content": "mine now"}),
        )
        .await;
        assert_eq!(hijack["success"], false);
        assert_eq!(hijack["code"], "FORBIDDEN");

        let promoted = post(
            &app,
            2,
            json!({"action": "promote", "idea_id": idea_id, "status": "distilled"}),
        )
        .await;
        assert_eq!(promoted["status"], "distilled");

        let shared = post(&app, 2, json!({"action": "toggle_shareable", "idea_id": idea_id})).await;
        assert_eq!(shared["shareable"], true);

        let (status, detail) = call(
            &app,
            "GET",
            &format!("/talk/api?action=get_group&group_id={group_id}"),
            None,
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(detail["success"], true);
        assert_eq!(detail["group"]["member_count"], 2);
        assert_eq!(detail["ideas"].as_array().unwrap().len(), 1);

        let deleted = post(&app, 2, json!({"action": "delete", "idea_id": idea_id})).await;
        assert_eq!(deleted["success"], true);
        let again = post(&app, 2, json!({"action": "delete", "idea_id": idea_id})).await;
        assert_eq!(again["success"], false);
        assert_eq!(again["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn links_through_dispatch() {
        let app = test_router();
        let group = post(&app, 1, json!({"action": "create_group", "name": "Links"})).await;
        let group_id = group["group_id"].clone();
        let a = post(&app, 1, json!({"action": "save", "group_id": group_id, "content": "A"})).await;
        let b = post(&app, 1, json!({"action": "save", "group_id": group_id, "content": "B"})).await;

        let link = post(
            &app,
            1,
            json!({"action": "create_link", "idea_id_a": b["id"], "idea_id_b": a["id"]}),
        )
        .await;
        assert_eq!(link["success"], true);
        assert_eq!(link["link"]["link_type"], "related");
        assert_eq!(link["link"]["idea_id_a"], a["id"]);

        let dup = post(
            &app,
            1,
            json!({"action": "create_link", "idea_id_a": a["id"], "idea_id_b": b["id"], "link_type": "related"}),
        )
        .await;
        assert_eq!(dup["code"], "CONFLICT");

        let (_, links) = call(
            &app,
            "GET",
            &format!("/talk/api.php?action=get_links&idea_id={}", a["id"]),
            Some(1),
            None,
        )
        .await;
        assert_eq!(links["links"].as_array().unwrap().len(), 1);

        let (_, history) = call(
            &app,
            "GET",
            &format!("/talk/api?action=history&group_id={group_id}&limit=10"),
            Some(1),
            None,
        )
        .await;
        assert_eq!(history["count"], 2);
        assert_eq!(history["ideas"][0]["link_count"], 1);
    }

    #[tokio::test]
    async fn failures_are_reported_in_band() {
        let app = test_router();

        let (status, anonymous) = call(
            &app,
            "POST",
            "/talk/api",
            None,
            Some(json!({"action": "create_group", "name": "Nope"})),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(anonymous["success"], false);
        assert!(anonymous["error"].is_string());

        let (status, unknown) = call(&app, "POST", "/talk/api", Some(1), Some(json!({"action": "fly"}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(unknown["success"], false);

        let (status, via_get) = call(
            &app,
            "GET",
            "/talk/api?action=create_group&name=Sneaky",
            Some(1),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(via_get["success"], false);

        let missing = post(&app, 1, json!({"action": "join_group"})).await;
        assert_eq!(missing["code"], "VALIDATION_ERROR");

        let bad_role = post(
            &app,
            1,
            json!({"action": "update_member", "group_id": 1, "user_id": 2, "role": "admin"}),
        )
        .await;
        assert_eq!(bad_role["code"], "VALIDATION_ERROR");

        let empty = post(&app, 1, json!({"action": "create_group", "name": "   "})).await;
        assert_eq!(empty["code"], "VALIDATION_ERROR");
    }
}
