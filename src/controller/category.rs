use std::sync::Arc;

use axum::{
    extract::{Json, Path, State},
    http::HeaderMap,
    routing::{delete, get, post, put},
};
use chrono::Utc;
use cyder_tools::log::warn;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::service::app_state::{AppState, StateRouter, create_state_router};
use crate::store::audit::EntityType;
use crate::store::category::{
    Category, NewCategory, OutputDefinition, PriceDetailField, SliderDefinition,
    UpdateCategoryData,
};
use crate::utils::{HttpResult, ID_GENERATOR};

use super::{BaseError, actor_id};

fn category_metadata(category: &Category) -> Map<String, Value> {
    let mut metadata = Map::new();
    metadata.insert("name".to_string(), json!(category.name));
    metadata
}

async fn list(
    State(app_state): State<Arc<AppState>>,
) -> Result<HttpResult<Vec<Category>>, BaseError> {
    Ok(HttpResult::new(app_state.categories.list_all()?))
}

async fn get_category(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<HttpResult<Category>, BaseError> {
    Ok(HttpResult::new(app_state.categories.get_by_id(id)?))
}

#[derive(Deserialize)]
struct InsertPayload {
    pub key: String,
    pub name: String,
    #[serde(default)]
    pub slider_definitions: Vec<SliderDefinition>,
    #[serde(default)]
    pub output_definitions: Vec<OutputDefinition>,
    #[serde(default)]
    pub price_detail_fields: Vec<PriceDetailField>,
}

async fn insert(
    State(app_state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<InsertPayload>,
) -> Result<HttpResult<Category>, BaseError> {
    if app_state.categories.get_by_key(&payload.key)?.is_some() {
        return Err(BaseError::ParamInvalid(Some(format!(
            "category key '{}' already exists",
            payload.key
        ))));
    }

    let current_time = Utc::now().timestamp_millis();
    let created = app_state.categories.create(NewCategory {
        id: ID_GENERATOR.generate_id(),
        category_key: payload.key,
        name: payload.name,
        slider_definitions: payload.slider_definitions,
        output_definitions: payload.output_definitions,
        price_detail_fields: payload.price_detail_fields,
        created_at: current_time,
        updated_at: current_time,
    })?;

    app_state.audit.record_create(
        actor_id(&headers),
        EntityType::Category,
        created.id,
        format!("Created category: {}", created.name),
        category_metadata(&created),
    );

    Ok(HttpResult::new(created))
}

async fn update_category(
    State(app_state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateCategoryData>,
) -> Result<HttpResult<Category>, BaseError> {
    let old_category = app_state.categories.get_by_id(id)?;

    let current_time = Utc::now().timestamp_millis();
    let updated = app_state.categories.update(id, &payload, current_time)?;

    app_state.audit.record_update(
        actor_id(&headers),
        EntityType::Category,
        id,
        format!("Updated category: {}", updated.name),
        &old_category,
        &updated,
    );

    Ok(HttpResult::new(updated))
}

#[derive(Serialize)]
struct DeleteCategoryResult {
    /// Providers still referencing the deleted category. They keep their
    /// configured shapes and the dangling category key.
    orphaned_providers: usize,
}

async fn delete_category(
    State(app_state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<HttpResult<DeleteCategoryResult>, BaseError> {
    let deleted = app_state.categories.delete(id)?;

    let orphaned = app_state
        .providers
        .count_by_category(&deleted.category_key)?;
    if orphaned > 0 {
        warn!(
            "category '{}' deleted while {} provider(s) still reference it",
            deleted.category_key, orphaned
        );
    }

    app_state.audit.record_delete(
        actor_id(&headers),
        EntityType::Category,
        id,
        format!("Deleted category: {}", deleted.name),
        category_metadata(&deleted),
    );

    Ok(HttpResult::new(DeleteCategoryResult {
        orphaned_providers: orphaned,
    }))
}

pub fn create_category_router() -> StateRouter {
    create_state_router().nest(
        "/category",
        create_state_router()
            .route("/", post(insert))
            .route("/list", get(list))
            .route("/{id}", get(get_category))
            .route("/{id}", put(update_category))
            .route("/{id}", delete(delete_category)),
    )
}
