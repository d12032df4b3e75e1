use std::sync::Arc;

use axum::{
    extract::{Json, Path, State},
    http::HeaderMap,
    routing::{delete, get, post, put},
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{Map, Value, json};

use crate::service::app_state::{AppState, StateRouter, create_state_router};
use crate::store::admin::{
    Admin, AdminPermission, AdminRole, AdminStatus, NewAdmin, UpdateAdminData,
};
use crate::store::audit::{AuditAction, EntityType};
use crate::utils::{HttpResult, ID_GENERATOR};

use super::{BaseError, actor_id};

fn admin_metadata(admin: &Admin) -> Map<String, Value> {
    let mut metadata = Map::new();
    metadata.insert("name".to_string(), json!(admin.name));
    metadata.insert("email".to_string(), json!(admin.email));
    metadata.insert("role".to_string(), json!(admin.role));
    metadata.insert("status".to_string(), json!(admin.status));
    metadata.insert("permissions".to_string(), json!(admin.permissions));
    metadata
}

async fn list(State(app_state): State<Arc<AppState>>) -> Result<HttpResult<Vec<Admin>>, BaseError> {
    Ok(HttpResult::new(app_state.admins.list_all()?))
}

async fn get_admin(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<HttpResult<Admin>, BaseError> {
    Ok(HttpResult::new(app_state.admins.get_by_id(id)?))
}

#[derive(Deserialize)]
struct InsertPayload {
    pub name: String,
    pub email: String,
    pub role: Option<AdminRole>,
    pub status: Option<AdminStatus>,
    #[serde(default)]
    pub permissions: Vec<AdminPermission>,
}

async fn insert(
    State(app_state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<InsertPayload>,
) -> Result<HttpResult<Admin>, BaseError> {
    let current_time = Utc::now().timestamp_millis();
    let created = app_state.admins.create(NewAdmin {
        id: ID_GENERATOR.generate_id(),
        name: payload.name,
        email: payload.email,
        role: payload.role.unwrap_or_default(),
        status: payload.status.unwrap_or_default(),
        permissions: payload.permissions,
        created_at: current_time,
        updated_at: current_time,
    })?;

    app_state.audit.record_create(
        actor_id(&headers),
        EntityType::Admin,
        created.id,
        format!("Created admin: {}", created.name),
        admin_metadata(&created),
    );

    Ok(HttpResult::new(created))
}

async fn update_admin(
    State(app_state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateAdminData>,
) -> Result<HttpResult<Admin>, BaseError> {
    let old_admin = app_state.admins.get_by_id(id)?;

    // Demoting the last super admin would leave nobody able to manage admins.
    if old_admin.role == AdminRole::SuperAdmin
        && matches!(payload.role, Some(AdminRole::Admin))
        && app_state.admins.count_super_admins()? == 1
    {
        return Err(BaseError::ParamInvalid(Some(
            "cannot demote the last super admin".to_string(),
        )));
    }

    let current_time = Utc::now().timestamp_millis();
    let updated = app_state.admins.update(id, &payload, current_time)?;

    app_state.audit.record_update(
        actor_id(&headers),
        EntityType::Admin,
        id,
        format!("Updated admin: {}", updated.name),
        &old_admin,
        &updated,
    );

    Ok(HttpResult::new(updated))
}

async fn delete_admin(
    State(app_state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<HttpResult<()>, BaseError> {
    let admin = app_state.admins.get_by_id(id)?;

    if admin.role == AdminRole::SuperAdmin && app_state.admins.count_super_admins()? == 1 {
        return Err(BaseError::ParamInvalid(Some(
            "cannot delete the last super admin".to_string(),
        )));
    }

    let deleted = app_state.admins.delete(id)?;

    let mut metadata = Map::new();
    metadata.insert("name".to_string(), json!(deleted.name));
    metadata.insert("email".to_string(), json!(deleted.email));
    app_state.audit.record_delete(
        actor_id(&headers),
        EntityType::Admin,
        id,
        format!("Deleted admin: {}", deleted.name),
        metadata,
    );

    Ok(HttpResult::new(()))
}

#[derive(Deserialize)]
struct StatusPayload {
    pub status: AdminStatus,
}

async fn update_status(
    State(app_state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(payload): Json<StatusPayload>,
) -> Result<HttpResult<Admin>, BaseError> {
    let update_data = UpdateAdminData {
        status: Some(payload.status),
        ..Default::default()
    };
    let current_time = Utc::now().timestamp_millis();
    let updated = app_state.admins.update(id, &update_data, current_time)?;

    let mut metadata = Map::new();
    metadata.insert("status".to_string(), json!(payload.status));
    app_state.audit.record_action(
        AuditAction::UpdateStatus,
        actor_id(&headers),
        EntityType::Admin,
        id,
        format!("Updated status for admin: {}", updated.name),
        metadata,
    );

    Ok(HttpResult::new(updated))
}

#[derive(Deserialize)]
struct PermissionsPayload {
    pub permissions: Vec<AdminPermission>,
}

async fn update_permissions(
    State(app_state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(payload): Json<PermissionsPayload>,
) -> Result<HttpResult<Admin>, BaseError> {
    let update_data = UpdateAdminData {
        permissions: Some(payload.permissions.clone()),
        ..Default::default()
    };
    let current_time = Utc::now().timestamp_millis();
    let updated = app_state.admins.update(id, &update_data, current_time)?;

    let mut metadata = Map::new();
    metadata.insert("permissions".to_string(), json!(payload.permissions));
    app_state.audit.record_action(
        AuditAction::UpdatePermissions,
        actor_id(&headers),
        EntityType::Admin,
        id,
        format!("Updated permissions for admin: {}", updated.name),
        metadata,
    );

    Ok(HttpResult::new(updated))
}

pub fn create_admin_router() -> StateRouter {
    create_state_router().nest(
        "/admin",
        create_state_router()
            .route("/", post(insert))
            .route("/list", get(list))
            .route("/{id}", get(get_admin))
            .route("/{id}", put(update_admin))
            .route("/{id}", delete(delete_admin))
            .route("/{id}/status", put(update_status))
            .route("/{id}/permissions", put(update_permissions)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::usage::UsageService;
    use crate::store::admin::AdminStore;
    use crate::store::audit::AuditTrail;
    use crate::store::category::CategoryStore;
    use crate::store::provider::ProviderStore;
    use crate::store::seed;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use std::time::Duration;
    use tower::util::ServiceExt;

    fn test_state() -> Arc<AppState> {
        let state = Arc::new(AppState {
            providers: ProviderStore::new(),
            categories: CategoryStore::new(),
            admins: AdminStore::new(),
            audit: AuditTrail::new(),
            usage: UsageService::new(Duration::from_millis(10)),
        });
        seed::seed(&state);
        state
    }

    #[tokio::test]
    async fn test_cannot_delete_last_super_admin() {
        let state = test_state();
        let app = create_admin_router().with_state(state.clone());

        // The bootstrap admin is the only super admin.
        let response = app
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri("/admin/1")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(state.admins.get_by_id(1).is_ok());
    }

    #[tokio::test]
    async fn test_delete_super_admin_allowed_when_another_exists() {
        let state = test_state();
        let app = create_admin_router().with_state(state.clone());

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/admin/")
                    .header("content-type", "application/json")
                    .body(Body::from(
                        r#"{"name": "Jane Roe", "email": "jane@example.com", "role": "super_admin"}"#,
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri("/admin/1")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(state.admins.get_by_id(1).is_err());
    }
}
