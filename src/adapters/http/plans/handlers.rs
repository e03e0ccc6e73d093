//! HTTP handlers for the public plan catalog.

use std::sync::Arc;

use axum::extract::{Json, Path, State};
use axum::response::IntoResponse;

use crate::adapters::http::error::BillingApiError;
use crate::domain::billing::{BillingError, BillingPeriod, PlanCatalog};

use super::dto::{
    CalculatePriceRequest, ComparePlansRequest, ComparePlansResponse, ComparisonEntryResponse,
    PlanDetailResponse, PlanListResponse, PlanResponse, PriceQuoteResponse,
};

/// Shared state for the plan endpoints.
#[derive(Clone)]
pub struct PlansAppState {
    pub catalog: Arc<PlanCatalog>,
}

/// GET /api/plans
pub async fn list_plans(State(state): State<PlansAppState>) -> impl IntoResponse {
    Json(PlanListResponse::from_plans(state.catalog.list_active()))
}

/// GET /api/plans/:id
pub async fn get_plan(
    State(state): State<PlansAppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, BillingApiError> {
    let plan = state
        .catalog
        .get(&id)
        .ok_or_else(|| BillingError::plan_not_found(&id))?;

    Ok(Json(PlanDetailResponse {
        success: true,
        plan: PlanResponse::from(plan),
    }))
}

/// GET /api/plans/name/:name
pub async fn find_plans_by_name(
    State(state): State<PlansAppState>,
    Path(name): Path<String>,
) -> impl IntoResponse {
    Json(PlanListResponse::from_plans(state.catalog.find_by_name(&name)))
}

/// POST /api/plans/calculate-price
pub async fn calculate_price(
    State(state): State<PlansAppState>,
    Json(request): Json<CalculatePriceRequest>,
) -> Result<impl IntoResponse, BillingApiError> {
    if request.plan_id.trim().is_empty() {
        return Err(BillingError::invalid_field("plan_id", "is required").into());
    }

    let period = BillingPeriod::from_yearly_flag(request.is_yearly);
    let quote = state
        .catalog
        .calculate_price(&request.plan_id, period)
        .ok_or_else(|| BillingError::plan_not_found(&request.plan_id))?;

    Ok(Json(PriceQuoteResponse::from(quote)))
}

/// POST /api/plans/compare
pub async fn compare_plans(
    State(state): State<PlansAppState>,
    Json(request): Json<ComparePlansRequest>,
) -> Result<impl IntoResponse, BillingApiError> {
    let period = BillingPeriod::from_yearly_flag(request.is_yearly);

    let comparison = state.catalog.compare(&request.plan_ids, period)?;

    Ok(Json(ComparePlansResponse {
        success: true,
        plans: comparison
            .into_iter()
            .map(ComparisonEntryResponse::from)
            .collect(),
        billing_period: period.tag().to_string(),
    }))
}
