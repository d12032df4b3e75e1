use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    routing::get,
};

use crate::service::app_state::{AppState, StateRouter, create_state_router};
use crate::store::ListResult;
use crate::store::audit::{AuditLog, AuditLogQueryPayload};
use crate::utils::HttpResult;

use super::BaseError;

async fn list_audit_logs(
    State(app_state): State<Arc<AppState>>,
    Query(payload): Query<AuditLogQueryPayload>,
) -> HttpResult<ListResult<AuditLog>> {
    HttpResult::new(app_state.audit.list(&payload))
}

/// Activity detail view. The write path records every field of an update,
/// including unchanged ones; they are filtered out here.
async fn get_audit_log(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<HttpResult<AuditLog>, BaseError> {
    let mut entry = app_state
        .audit
        .get_by_id(id)
        .ok_or_else(|| BaseError::NotFound(Some(format!("audit log {} not found", id))))?;

    if let Some(changes) = &mut entry.changes {
        changes.retain(|change| change.before != change.after);
    }

    Ok(HttpResult::new(entry))
}

pub fn create_audit_log_router() -> StateRouter {
    create_state_router().nest(
        "/audit_log",
        create_state_router()
            .route("/list", get(list_audit_logs))
            .route("/{id}", get(get_audit_log)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::usage::UsageService;
    use crate::store::admin::AdminStore;
    use crate::store::audit::{AuditTrail, EntityType};
    use crate::store::category::CategoryStore;
    use crate::store::provider::ProviderStore;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde::Serialize;
    use std::time::Duration;
    use tower::util::ServiceExt;

    #[derive(Serialize)]
    struct Sample {
        name: String,
        count: i64,
    }

    fn test_state() -> Arc<AppState> {
        Arc::new(AppState {
            providers: ProviderStore::new(),
            categories: CategoryStore::new(),
            admins: AdminStore::new(),
            audit: AuditTrail::new(),
            usage: UsageService::new(Duration::from_millis(10)),
        })
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_detail_filters_no_op_changes() {
        let state = test_state();
        let old = Sample {
            name: "same".to_string(),
            count: 1,
        };
        let new = Sample {
            name: "same".to_string(),
            count: 2,
        };
        state.audit.record_update(
            1,
            EntityType::Provider,
            10,
            "Updated API: sample".to_string(),
            &old,
            &new,
        );

        let list = state.audit.list(&AuditLogQueryPayload::default());
        let entry_id = list.items()[0].id;
        // The stored entry keeps the no-op diff.
        assert_eq!(list.items()[0].changes.as_ref().unwrap().len(), 2);

        let app = create_audit_log_router().with_state(state);
        let response = app
            .oneshot(
                Request::builder()
                    .uri(format!("/audit_log/{}", entry_id))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        let changes = body["data"]["changes"].as_array().unwrap();
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0]["field"], "count");
    }
}
