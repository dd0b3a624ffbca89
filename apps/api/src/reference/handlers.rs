use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;

use crate::classification::code::OccupationCode;
use crate::errors::AppError;
use crate::reference::ReferenceEntry;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct OccupationDetailResponse {
    #[serde(flatten)]
    pub entry: ReferenceEntry,
    pub occupation_link: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub occupation_description: Option<String>,
}

/// GET /api/v1/occupations/:code
pub async fn handle_get_occupation(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<OccupationDetailResponse>, AppError> {
    let code = OccupationCode::parse(&code).map_err(|e| AppError::Validation(e.to_string()))?;

    let entry = state
        .reference
        .by_code(&code)
        .ok_or_else(|| AppError::NotFound(format!("Occupation {code} not found")))?;

    Ok(Json(OccupationDetailResponse {
        entry: entry.clone(),
        occupation_link: code.link(),
        occupation_description: state
            .descriptions
            .as_deref()
            .and_then(|d| d.get(&code))
            .map(String::from),
    }))
}
