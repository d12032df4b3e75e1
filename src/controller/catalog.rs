use std::sync::Arc;

use axum::{
    extract::{Json, Path, Query, State},
    routing::{delete, get, put},
};
use serde::{Deserialize, Serialize};

use crate::service::app_state::{AppState, StateRouter, create_state_router};
use crate::service::pricing::{self, OutputFallback, PriceQuote};
use crate::service::ranking::{self, CatalogQuery};
use crate::service::usage::UsageOverride;
use crate::store::provider::Provider;
use crate::utils::HttpResult;
use crate::utils::number_format::{format_compact, format_detail, parse_compact};

use super::BaseError;

#[derive(Serialize)]
struct CatalogEntry {
    #[serde(flatten)]
    provider: Provider,
    monthly_price: f64,
    yearly_price: f64,
    /// Compact inline label for the usage slider, e.g. "1M".
    usage_label: String,
}

/// Filtered, ordered catalog. Ordering reads the debounced ranking
/// snapshot; the per-card prices read the live values so a dragging slider
/// updates the displayed figure immediately.
async fn list(
    State(app_state): State<Arc<AppState>>,
    Query(query): Query<CatalogQuery>,
) -> Result<HttpResult<Vec<CatalogEntry>>, BaseError> {
    let providers = app_state.providers.list_all()?;
    let display = app_state.usage.display_snapshot();
    let ranking_snapshot = app_state.usage.ranking_snapshot();
    let sliders_active = display.has_active_sliders();

    let ordered = ranking::filter_and_sort(providers, &query, &ranking_snapshot, sliders_active);

    let entries = ordered
        .into_iter()
        .map(|provider| {
            let monthly = pricing::monthly_price(&provider, &display, OutputFallback::DisplayDefault);
            CatalogEntry {
                monthly_price: monthly,
                yearly_price: pricing::yearly_price(monthly),
                usage_label: format_compact(pricing::resolve_input_usage(&provider, &display)),
                provider,
            }
        })
        .collect();

    Ok(HttpResult::new(entries))
}

#[derive(Deserialize)]
struct EstimateQuery {
    input: Option<f64>,
    output: Option<f64>,
}

#[derive(Serialize)]
struct EstimateResult {
    #[serde(flatten)]
    quote: PriceQuote,
    /// Grouped-digit figures for the itemized cost breakdown.
    monthly_display: String,
    yearly_display: String,
}

/// Itemized quote for one provider. Explicit `input`/`output` quantities
/// act as an ephemeral override for this computation only.
async fn estimate(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Query(query): Query<EstimateQuery>,
) -> Result<HttpResult<EstimateResult>, BaseError> {
    let provider = app_state.providers.get_by_id(id)?;
    let mut snapshot = app_state.usage.display_snapshot();

    if query.input.is_some() || query.output.is_some() {
        let input = query
            .input
            .unwrap_or_else(|| pricing::resolve_input_usage(&provider, &snapshot));
        snapshot.overrides.insert(
            id,
            UsageOverride {
                input,
                output: query.output,
            },
        );
    }

    let quote = pricing::quote(&provider, &snapshot);
    Ok(HttpResult::new(EstimateResult {
        monthly_display: format_detail(quote.monthly),
        yearly_display: format_detail(quote.yearly),
        quote,
    }))
}

/// A usage quantity, either numeric or in the compact notation the usage
/// controls accept ("1.5m").
#[derive(Deserialize)]
#[serde(untagged)]
enum UsageValue {
    Number(f64),
    Text(String),
}

impl UsageValue {
    fn resolve(&self) -> Result<f64, BaseError> {
        match self {
            UsageValue::Number(value) => Ok(*value),
            UsageValue::Text(text) => parse_compact(text).ok_or_else(|| {
                BaseError::ParamInvalid(Some(format!("invalid usage value '{}'", text)))
            }),
        }
    }
}

#[derive(Deserialize)]
struct GlobalUsagePayload {
    input: Option<UsageValue>,
    output: Option<UsageValue>,
}

async fn set_global_usage(
    State(app_state): State<Arc<AppState>>,
    Json(payload): Json<GlobalUsagePayload>,
) -> Result<HttpResult<()>, BaseError> {
    let input = payload.input.as_ref().map(UsageValue::resolve).transpose()?;
    let output = payload
        .output
        .as_ref()
        .map(UsageValue::resolve)
        .transpose()?;
    app_state.usage.set_global_usage(input, output);
    Ok(HttpResult::new(()))
}

/// "Reset to defaults": clears the global sliders and every per-provider
/// override, deactivating slider state entirely.
async fn reset_usage(State(app_state): State<Arc<AppState>>) -> HttpResult<()> {
    app_state.usage.clear_all();
    HttpResult::new(())
}

#[derive(Deserialize)]
struct OverridePayload {
    input: f64,
    output: Option<f64>,
}

/// Sets a per-provider override. An input equal to the effective global
/// default (with no output value) clears the override instead of storing a
/// redundant one.
async fn set_usage_override(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(payload): Json<OverridePayload>,
) -> Result<HttpResult<Option<UsageOverride>>, BaseError> {
    let provider = app_state.providers.get_by_id(id)?;

    let effective_default = app_state
        .usage
        .global_input()
        .unwrap_or(provider.usage_metric.default_value);

    if payload.output.is_none() && payload.input == effective_default {
        app_state.usage.remove_override(id);
        return Ok(HttpResult::new(None));
    }

    let usage = UsageOverride {
        input: payload.input,
        output: payload.output,
    };
    app_state.usage.set_override(id, usage);
    Ok(HttpResult::new(Some(usage)))
}

async fn remove_usage_override(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<HttpResult<bool>, BaseError> {
    let _provider = app_state.providers.get_by_id(id)?;
    Ok(HttpResult::new(app_state.usage.remove_override(id)))
}

pub fn create_catalog_router() -> StateRouter {
    create_state_router().nest(
        "/catalog",
        create_state_router()
            .route("/list", get(list))
            .route("/usage", put(set_global_usage))
            .route("/usage", delete(reset_usage))
            .route("/{id}/estimate", get(estimate))
            .route("/{id}/usage", put(set_usage_override))
            .route("/{id}/usage", delete(remove_usage_override)),
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

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_list_returns_priced_catalog() {
        let app = create_catalog_router().with_state(test_state());
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/catalog/list?sort=price-asc")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        let entries = body["data"].as_array().unwrap();
        assert_eq!(entries.len(), 6);

        // AssemblyAI (100 min * 0.005 = 0.5/month) is the cheapest seed entry.
        assert_eq!(entries[0]["name"], "AssemblyAI");
        assert_eq!(entries[0]["monthly_price"], 0.5);
        // The split-rate token models land at the expensive end.
        assert_eq!(entries[5]["name"], "GPT-4");
        assert_eq!(entries[5]["monthly_price"], 78_000.0);
    }

    #[tokio::test]
    async fn test_category_filter_and_search() {
        let app = create_catalog_router().with_state(test_state());
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/catalog/list?category=text-generation&search=anthropic")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        let body = body_json(response).await;
        let entries = body["data"].as_array().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0]["name"], "Claude 2");
    }

    #[tokio::test]
    async fn test_estimate_matches_spec_example() {
        let app = create_catalog_router().with_state(test_state());
        // GPT-4 seed: input 0.03 / output 0.06, defaults 1M / 800k.
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/catalog/11/estimate")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        let body = body_json(response).await;
        assert_eq!(body["data"]["monthly"], 78_000.0);
        assert_eq!(body["data"]["yearly"], 936_000.0);
        assert_eq!(body["data"]["monthly_display"], "78,000");
        assert_eq!(body["data"]["yearly_display"], "936,000");
        let outputs = body["data"]["outputs"].as_array().unwrap();
        assert_eq!(outputs[0]["name"], "Input Cost");
        assert_eq!(outputs[0]["monthly"], 30_000.0);
    }

    #[tokio::test]
    async fn test_global_usage_accepts_compact_notation() {
        let state = test_state();
        let app = create_catalog_router().with_state(state.clone());

        let response = app
            .oneshot(
                Request::builder()
                    .method("PUT")
                    .uri("/catalog/usage")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"input": "1.5m"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let snapshot = state.usage.display_snapshot();
        assert_eq!(snapshot.global_input, Some(1_500_000.0));
    }

    #[tokio::test]
    async fn test_override_equal_to_default_is_cleared() {
        let state = test_state();
        let app = create_catalog_router().with_state(state.clone());

        // DALL-E 3 (id 13) default usage is 100.
        let response = app
            .oneshot(
                Request::builder()
                    .method("PUT")
                    .uri("/catalog/13/usage")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"input": 100.0}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(!state.usage.display_snapshot().has_active_sliders());
    }
}
