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
use crate::service::formula::validate_formula;
use crate::store::audit::EntityType;
use crate::store::provider::{
    CustomField, NewProvider, Output, PriceDetail, PricingModel, Provider, ProviderStore, Slider,
    UnitPrice, UpdateProviderData, UsageMetric,
};
use crate::utils::{HttpResult, ID_GENERATOR};

use super::{BaseError, actor_id};

fn provider_metadata(provider: &Provider) -> Map<String, Value> {
    let mut metadata = Map::new();
    metadata.insert("name".to_string(), json!(provider.name));
    metadata.insert("provider".to_string(), json!(provider.vendor));
    metadata.insert("category".to_string(), json!(provider.category_key));
    metadata
}

/// Rejects outputs whose formulas reference anything that is not a slider
/// on the same provider. Empty formulas (freshly seeded shapes) pass.
fn check_output_formulas(outputs: &[Output], sliders: &[Slider]) -> Result<(), BaseError> {
    let names: Vec<String> = sliders.iter().map(|s| s.name.clone()).collect();
    for output in outputs {
        for formula in [&output.monthly_calculation, &output.yearly_calculation] {
            if formula.is_empty() {
                continue;
            }
            if !validate_formula(formula, &names) {
                return Err(BaseError::FormulaInvalid(Some(format!(
                    "formula for output '{}' does not evaluate against this provider's sliders",
                    output.name
                ))));
            }
        }
    }
    Ok(())
}

async fn list(State(app_state): State<Arc<AppState>>) -> Result<HttpResult<Vec<Provider>>, BaseError> {
    Ok(HttpResult::new(app_state.providers.list_all()?))
}

#[derive(Deserialize)]
struct InsertPayload {
    pub key: String,
    pub name: String,
    pub vendor: String,
    pub category: String,
    pub description: String,
    pub documentation_url: String,
    pub logo_url: String,
    pub pricing_model: Option<PricingModel>,
    pub featured: Option<bool>,
    pub usage_metric: UsageMetric,
    pub price_per_unit: Option<UnitPrice>,
}

async fn insert(
    State(app_state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<InsertPayload>,
) -> Result<HttpResult<Provider>, BaseError> {
    let category = app_state
        .categories
        .get_by_key(&payload.category)?
        .ok_or_else(|| {
            BaseError::ParamInvalid(Some(format!("unknown category '{}'", payload.category)))
        })?;

    let current_time = Utc::now().timestamp_millis();
    let mut new_provider = NewProvider {
        id: ID_GENERATOR.generate_id(),
        provider_key: payload.key,
        name: payload.name,
        vendor: payload.vendor,
        category_key: payload.category,
        description: payload.description,
        documentation_url: payload.documentation_url,
        logo_url: payload.logo_url,
        pricing_model: payload.pricing_model.unwrap_or_default(),
        featured: payload.featured.unwrap_or(false),
        usage_metric: payload.usage_metric,
        price_per_unit: payload.price_per_unit.unwrap_or_default(),
        sliders: Vec::new(),
        outputs: Vec::new(),
        price_details: Vec::new(),
        custom_fields: Vec::new(),
        created_at: current_time,
        updated_at: current_time,
    };
    ProviderStore::apply_category_template(&mut new_provider, &category);

    let created = app_state.providers.create(new_provider)?;

    app_state.audit.record_create(
        actor_id(&headers),
        EntityType::Provider,
        created.id,
        format!("Created API: {}", created.name),
        provider_metadata(&created),
    );

    Ok(HttpResult::new(created))
}

async fn get_provider(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<HttpResult<Provider>, BaseError> {
    Ok(HttpResult::new(app_state.providers.get_by_id(id)?))
}

#[derive(Deserialize)]
struct UpdatePayload {
    pub name: Option<String>,
    pub vendor: Option<String>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub documentation_url: Option<String>,
    pub logo_url: Option<String>,
    pub pricing_model: Option<PricingModel>,
    pub featured: Option<bool>,
    pub usage_metric: Option<UsageMetric>,
    pub price_per_unit: Option<UnitPrice>,
    pub sliders: Option<Vec<Slider>>,
    pub outputs: Option<Vec<Output>>,
    pub price_details: Option<Vec<PriceDetail>>,
    pub custom_fields: Option<Vec<CustomField>>,
}

async fn update_provider(
    State(app_state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(payload): Json<UpdatePayload>,
) -> Result<HttpResult<Provider>, BaseError> {
    let old_provider = app_state.providers.get_by_id(id)?;

    let mut update_data = UpdateProviderData {
        name: payload.name,
        vendor: payload.vendor,
        category_key: payload.category,
        description: payload.description,
        documentation_url: payload.documentation_url,
        logo_url: payload.logo_url,
        pricing_model: payload.pricing_model,
        featured: payload.featured,
        usage_metric: payload.usage_metric,
        price_per_unit: payload.price_per_unit,
        sliders: payload.sliders,
        outputs: payload.outputs,
        price_details: payload.price_details,
        custom_fields: payload.custom_fields,
    };

    // Re-assigning the category re-seeds the template shapes, dropping any
    // shapes carried in the same payload.
    let reassigned_category = update_data
        .category_key
        .clone()
        .filter(|key| *key != old_provider.category_key);
    if let Some(category_key) = reassigned_category {
        let category = app_state.categories.get_by_key(&category_key)?.ok_or_else(|| {
            BaseError::ParamInvalid(Some(format!("unknown category '{}'", category_key)))
        })?;
        update_data.sliders = Some(category.seed_sliders());
        update_data.outputs = Some(category.seed_outputs());
        update_data.price_details = Some(category.seed_price_details());
    }

    let final_sliders = update_data
        .sliders
        .clone()
        .unwrap_or_else(|| old_provider.sliders.clone());
    let final_outputs = update_data
        .outputs
        .clone()
        .unwrap_or_else(|| old_provider.outputs.clone());
    check_output_formulas(&final_outputs, &final_sliders)?;

    let current_time = Utc::now().timestamp_millis();
    let updated = app_state.providers.update(id, &update_data, current_time)?;

    app_state.audit.record_update(
        actor_id(&headers),
        EntityType::Provider,
        id,
        format!("Updated API: {}", updated.name),
        &old_provider,
        &updated,
    );

    Ok(HttpResult::new(updated))
}

async fn delete_provider(
    State(app_state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<HttpResult<()>, BaseError> {
    // A missing id fails here, so nothing is recorded for it.
    let deleted = app_state.providers.delete(id)?;
    app_state.usage.remove_override(id);

    app_state.audit.record_delete(
        actor_id(&headers),
        EntityType::Provider,
        id,
        format!("Deleted API: {}", deleted.name),
        provider_metadata(&deleted),
    );

    Ok(HttpResult::new(()))
}

#[derive(Deserialize)]
struct FeaturedPayload {
    pub featured: bool,
}

async fn set_featured(
    State(app_state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(payload): Json<FeaturedPayload>,
) -> Result<HttpResult<Provider>, BaseError> {
    let current_time = Utc::now().timestamp_millis();
    let updated = app_state
        .providers
        .set_featured(id, payload.featured, current_time)?;

    let mut metadata = provider_metadata(&updated);
    metadata.insert("featured".to_string(), json!(payload.featured));
    app_state.audit.record_action(
        crate::store::audit::AuditAction::ToggleFeatured,
        actor_id(&headers),
        EntityType::Provider,
        id,
        format!("Toggled featured for API: {}", updated.name),
        metadata,
    );

    Ok(HttpResult::new(updated))
}

#[derive(Deserialize)]
struct ValidateFormulaPayload {
    pub formula: String,
    pub slider_names: Vec<String>,
}

/// Form-edit-time formula check, used by the output editor before save.
async fn validate_output_formula(
    Json(payload): Json<ValidateFormulaPayload>,
) -> HttpResult<bool> {
    HttpResult::new(validate_formula(&payload.formula, &payload.slider_names))
}

pub fn create_provider_router() -> StateRouter {
    create_state_router().nest(
        "/provider",
        create_state_router()
            .route("/", post(insert))
            .route("/list", get(list))
            .route("/validate_formula", post(validate_output_formula))
            .route("/{id}", get(get_provider))
            .route("/{id}", put(update_provider))
            .route("/{id}", delete(delete_provider))
            .route("/{id}/featured", put(set_featured)),
    )
}
