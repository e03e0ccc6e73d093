//! Axum router configuration for plan endpoints.

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{
    calculate_price, compare_plans, find_plans_by_name, get_plan, list_plans, PlansAppState,
};

/// Plan router for mounting at `/api/plans`. No authentication.
///
/// - `GET /` - Active plans, cheapest first
/// - `GET /:id` - One plan
/// - `GET /name/:name` - Name search
/// - `POST /calculate-price` - Price for a period
/// - `POST /compare` - Side-by-side comparison of 2 to 4 plans
pub fn plans_router() -> Router<PlansAppState> {
    Router::new()
        .route("/", get(list_plans))
        .route("/calculate-price", post(calculate_price))
        .route("/compare", post(compare_plans))
        .route("/name/:name", get(find_plans_by_name))
        .route("/:id", get(get_plan))
}
