// src/handlers/placement.rs

use std::str::FromStr;

use axum::{
    Extension, Json,
    extract::{Query, State},
    response::IntoResponse,
};
use serde::Deserialize;
use sqlx::PgPool;
use validator::Validate;

use crate::{
    bank::QuestionBank,
    config::DEFAULT_LOCALE,
    engine::placement::{PlacementSession, classify_run},
    error::AppError,
    models::{
        level::Level,
        placement::{PlacementQuestionsResponse, SubmitPlacementRequest},
    },
    store::AttemptStore,
    utils::jwt::Claims,
};

#[derive(Debug, Deserialize)]
pub struct PlacementParams {
    pub locale: Option<String>,
}

/// Serves one adaptive placement run: up to 20 questions climbing from A1 to
/// C1, options freshly shuffled so repeated runs see different orderings.
/// The run is scored client-side, hence the correct index in the payload.
pub async fn placement_questions(
    State(pool): State<PgPool>,
    Query(params): Query<PlacementParams>,
) -> Result<impl IntoResponse, AppError> {
    let locale = params.locale.unwrap_or_else(|| DEFAULT_LOCALE.to_string());

    let bank = QuestionBank::new(pool);
    let corpus = bank.placement_corpus().await?;

    let mut rng = rand::thread_rng();
    let mut session = PlacementSession::new(corpus, &mut rng);
    let questions = session.select_questions(&mut rng, &locale, DEFAULT_LOCALE);

    Ok(Json(PlacementQuestionsResponse { questions }))
}

/// Records a finished client-scored placement run.
///
/// Persistence is best-effort: the client already holds the authoritative
/// result, so storage failures are logged and the request still succeeds.
pub async fn submit_placement_results(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<SubmitPlacementRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = req.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let user_id = claims.user_id();

    let outcome = match Level::from_str(&req.level) {
        Ok(level) => {
            // The client result is authoritative; reclassify only to flag
            // drift between the submitted answers and the claimed level.
            let reclassified = classify_run(&req.answers);
            if reclassified != level {
                tracing::warn!(
                    user_id,
                    claimed = %level,
                    reclassified = %reclassified,
                    "client-reported placement level disagrees with its answer sheet"
                );
            }

            let store = AttemptStore::new(pool);
            store.record_placement_result(user_id, level, &req).await
        }
        Err(_) => Err(AppError::InvalidLevel(req.level.clone())),
    };

    if let Err(e) = outcome {
        tracing::warn!(user_id, "failed to record placement result: {}", e);
    }

    Ok(Json(serde_json::json!({ "recorded": true })))
}
