//! Handlers for patch generation and the patch registry.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::Json;
use patchwright_core::error::CoreError;
use patchwright_core::issue::IssueReference;
use patchwright_store::models::patch::{METADATA_EXTENSION, PATCH_EXTENSION};
use patchwright_store::repositories::PatchRepo;
use serde::Deserialize;

use crate::engine::GenerateRequest;
use crate::error::{AppError, AppResult};
use crate::query::PaginationParams;
use crate::response::{GenerateResponse, PatchListResponse};
use crate::state::AppState;

/// Request body of `POST /patches/generate`.
///
/// `owner`, `repo` and `issue_id` are required; a body without them is
/// rejected with 400 before any work starts.
#[derive(Debug, Deserialize)]
pub struct GeneratePatchBody {
    pub owner: String,
    pub repo: String,
    pub issue_id: u64,
    #[serde(default)]
    pub issue_title: String,
    #[serde(default)]
    pub issue_body: String,
    pub analysis: String,
    #[serde(default)]
    pub query: Option<String>,
}

impl From<GeneratePatchBody> for GenerateRequest {
    fn from(body: GeneratePatchBody) -> Self {
        GenerateRequest {
            issue: IssueReference {
                owner: body.owner,
                repo: body.repo,
                issue_id: body.issue_id,
                title: body.issue_title,
                body: body.issue_body,
            },
            analysis: body.analysis,
            query: body.query,
        }
    }
}

/// POST /patches/generate
///
/// Domain outcomes (`not_generated`, `failed`, `warning`) are 200 responses;
/// only malformed input (400) and registry failures (500) are errors.
pub async fn generate_patch(
    State(state): State<AppState>,
    payload: Result<Json<GeneratePatchBody>, JsonRejection>,
) -> AppResult<impl IntoResponse> {
    let Json(body) = payload?;
    tracing::info!(
        owner = %body.owner,
        repo = %body.repo,
        issue_id = body.issue_id,
        "Generating patch",
    );

    let record = state.engine.generate(body.into()).await?;

    Ok(Json(GenerateResponse::from_record(&state.registry, record)))
}

/// GET /patches
///
/// Newest first. `total_count` counts every record, not just the page.
pub async fn list_patches(
    State(state): State<AppState>,
    params: Result<Query<PaginationParams>, QueryRejection>,
) -> AppResult<impl IntoResponse> {
    let Query(params) = params?;
    let listings = PatchRepo::list(&state.registry).await?;
    let total_count = listings.len();

    Ok(Json(PatchListResponse {
        status: "success",
        patches: params.apply(listings),
        total_count,
    }))
}

/// GET /patches/{name}
///
/// `name` is a record id, optionally with its `.patch` or `.json` suffix.
pub async fn get_patch(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> AppResult<impl IntoResponse> {
    let id = record_id(&name);
    let record = PatchRepo::find_by_id(&state.registry, id)
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::NotFound {
                entity: "Patch",
                id: name.clone(),
            })
        })?;

    Ok(Json(record))
}

/// Strip a listing suffix from `name`.
fn record_id(name: &str) -> &str {
    [PATCH_EXTENSION, METADATA_EXTENSION]
        .iter()
        .find_map(|ext| {
            name.strip_suffix(ext)
                .and_then(|rest| rest.strip_suffix('.'))
        })
        .unwrap_or(name)
}
