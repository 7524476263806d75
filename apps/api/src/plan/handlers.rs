//! Axum route handlers for the Plan API.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::plan::PlanRow;
use crate::plan::assembler::{generate_daily_plan, PlanRequest};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct GeneratePlanRequest {
    pub profile_id: Option<Uuid>,
    #[serde(default)]
    pub needs: Vec<String>,
    pub primary_need: Option<String>,
    #[serde(default)]
    pub force_regeneration: bool,
    #[serde(default)]
    pub same_theme_for_all_meals: bool,
}

/// POST /api/v1/plans/generate
///
/// Full pipeline: safety filter → scored selection → cascade generation →
/// assembly. Always returns a usable plan unless the input is invalid or
/// the profile does not exist.
pub async fn handle_generate_plan(
    State(state): State<AppState>,
    Json(request): Json<GeneratePlanRequest>,
) -> Result<Json<Value>, AppError> {
    let profile_id = request
        .profile_id
        .filter(|id| !id.is_nil())
        .ok_or_else(|| AppError::Validation("profile_id is required".to_string()))?;

    let outcome = generate_daily_plan(
        &state,
        PlanRequest {
            profile_id,
            needs: request.needs,
            primary_need: request.primary_need,
            force_regeneration: request.force_regeneration,
            same_theme_for_all_meals: request.same_theme_for_all_meals,
        },
    )
    .await?;

    let plan = &outcome.plan;
    Ok(Json(json!({
        "success": true,
        "plan_id": outcome.plan_id,
        "plan": plan,
        "metadata": {
            "generated_at": plan.generated_at,
            "expires_at": plan.expires_at,
            "nutraceutical_count": plan.nutraceuticals.len(),
            "aromatherapy_count": plan.aromatherapy.len(),
            "routine_count": plan.routines.len(),
            "version": "1.0",
        }
    })))
}

/// GET /api/v1/plans/:id
///
/// Returns a persisted plan record.
pub async fn handle_get_plan(
    State(state): State<AppState>,
    Path(plan_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let row = sqlx::query_as::<_, PlanRow>("SELECT * FROM generated_plans WHERE id = $1")
        .bind(plan_id)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Plan {plan_id} not found")))?;

    Ok(Json(json!({
        "success": true,
        "plan_id": row.id,
        "plan": row.plan_json,
        "metadata": {
            "generated_at": row.generated_at,
            "expires_at": row.expires_at,
            "version": "1.0",
        }
    })))
}
