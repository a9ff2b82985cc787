//! HTTP endpoint handlers. These are thin wrappers that forward to the catalog
//! store or the question generator. Each handler is instrumented and logs its
//! parameters and basic result info.

use std::sync::Arc;

use axum::{
  extract::{rejection::JsonRejection, Path, State},
  Json,
};
use tracing::{info, instrument};

use crate::catalog::{GENERATED_QUESTION_LIMIT, REFERENCE_QUESTION_LIMIT};
use crate::domain::*;
use crate::error::ApiError;
use crate::protocol::{HealthOut, RootOut, ROOT_MESSAGE};
use crate::state::AppState;

type ApiResult<T> = Result<Json<T>, ApiError>;

#[instrument(level = "info")]
pub async fn http_root() -> Json<RootOut> { Json(RootOut { message: ROOT_MESSAGE }) }

#[instrument(level = "info")]
pub async fn http_health() -> Json<HealthOut> { Json(HealthOut { ok: true }) }

#[instrument(level = "info", skip(state))]
pub async fn http_get_exams(State(state): State<Arc<AppState>>) -> ApiResult<Vec<Exam>> {
  Ok(Json(state.catalog.list_exams().await.map_err(ApiError::fetch("exams"))?))
}

#[instrument(level = "info", skip(state))]
pub async fn http_get_courses(
  State(state): State<Arc<AppState>>,
  Path(exam_id): Path<String>,
) -> ApiResult<Vec<Course>> {
  Ok(Json(state.catalog.list_courses(&exam_id).await.map_err(ApiError::fetch("courses"))?))
}

#[instrument(level = "info", skip(state))]
pub async fn http_get_subjects(
  State(state): State<Arc<AppState>>,
  Path(course_id): Path<String>,
) -> ApiResult<Vec<Subject>> {
  Ok(Json(state.catalog.list_subjects(&course_id).await.map_err(ApiError::fetch("subjects"))?))
}

#[instrument(level = "info", skip(state))]
pub async fn http_get_units(
  State(state): State<Arc<AppState>>,
  Path(subject_id): Path<String>,
) -> ApiResult<Vec<Unit>> {
  Ok(Json(state.catalog.list_units(&subject_id).await.map_err(ApiError::fetch("units"))?))
}

#[instrument(level = "info", skip(state))]
pub async fn http_get_chapters(
  State(state): State<Arc<AppState>>,
  Path(unit_id): Path<String>,
) -> ApiResult<Vec<Chapter>> {
  Ok(Json(state.catalog.list_chapters(&unit_id).await.map_err(ApiError::fetch("chapters"))?))
}

#[instrument(level = "info", skip(state))]
pub async fn http_get_topics(
  State(state): State<Arc<AppState>>,
  Path(chapter_id): Path<String>,
) -> ApiResult<Vec<Topic>> {
  Ok(Json(state.catalog.list_topics(&chapter_id).await.map_err(ApiError::fetch("topics"))?))
}

#[instrument(level = "info", skip(state))]
pub async fn http_get_parts(
  State(state): State<Arc<AppState>>,
  Path(course_id): Path<String>,
) -> ApiResult<Vec<Part>> {
  Ok(Json(state.catalog.list_parts(&course_id).await.map_err(ApiError::fetch("parts"))?))
}

#[instrument(level = "info", skip(state))]
pub async fn http_get_slots(
  State(state): State<Arc<AppState>>,
  Path(course_id): Path<String>,
) -> ApiResult<Vec<Slot>> {
  Ok(Json(state.catalog.list_slots(&course_id).await.map_err(ApiError::fetch("slots"))?))
}

#[instrument(level = "info", skip(state))]
pub async fn http_get_existing_questions(
  State(state): State<Arc<AppState>>,
  Path(topic_id): Path<String>,
) -> ApiResult<Vec<ReferenceQuestion>> {
  let rows = state
    .catalog
    .list_reference_questions(&topic_id, REFERENCE_QUESTION_LIMIT)
    .await
    .map_err(ApiError::fetch("existing questions"))?;
  Ok(Json(rows))
}

#[instrument(level = "info", skip(state))]
pub async fn http_get_generated_questions(
  State(state): State<Arc<AppState>>,
  Path(topic_id): Path<String>,
) -> ApiResult<Vec<GeneratedQuestion>> {
  let rows = state
    .catalog
    .list_generated_questions(&topic_id, GENERATED_QUESTION_LIMIT)
    .await
    .map_err(ApiError::fetch("generated questions"))?;
  Ok(Json(rows))
}

#[instrument(level = "info", skip_all)]
pub async fn http_post_generate_question(
  State(state): State<Arc<AppState>>,
  body: Result<Json<GenerationRequest>, JsonRejection>,
) -> ApiResult<GeneratedQuestion> {
  let Json(req) = body.map_err(|e| ApiError::BadRequest(e.body_text()))?;
  let question = state.generator.generate(&req).await?;
  info!(target: "question_maker", id = %question.id, topic_id = %question.topic_id, question_type = %question.question_type, "HTTP generate-question served");
  Ok(Json(question))
}
