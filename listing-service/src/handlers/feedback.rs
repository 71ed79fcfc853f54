use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use futures::TryStreamExt;
use mongodb::{bson::doc, options::FindOptions};
use service_core::error::AppError;

use crate::{
    dtos::{
        engagement::{CreateFeedbackRequest, FeedbackResponse},
        ListResponse,
    },
    middleware::CurrentUser,
    models::{role::access, Feedback},
    utils::ValidatedJson,
    AppState,
};

pub async fn submit_feedback(
    State(state): State<AppState>,
    user: CurrentUser,
    ValidatedJson(req): ValidatedJson<CreateFeedbackRequest>,
) -> Result<impl IntoResponse, AppError> {
    user.require(access::EVERYONE)?;

    let feedback = Feedback::new(
        user.user_id.clone(),
        user.email.clone(),
        req.feedback_type,
        req.message,
    );
    state.db.feedback().insert_one(&feedback, None).await?;

    tracing::info!(feedback_id = %feedback.feedback_id, "Feedback received");
    Ok((StatusCode::CREATED, Json(FeedbackResponse::from(feedback))))
}

/// Admins read all feedback, everyone else their own.
pub async fn list_feedback(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<impl IntoResponse, AppError> {
    user.require(access::EVERYONE)?;

    let filter = if user.is_admin() {
        doc! {}
    } else {
        doc! { "user_id": &user.user_id }
    };
    let options = FindOptions::builder().sort(doc! { "created_at": -1 }).build();
    let entries: Vec<Feedback> = state
        .db
        .feedback()
        .find(filter, options)
        .await?
        .try_collect()
        .await?;

    let items: Vec<FeedbackResponse> = entries.into_iter().map(Into::into).collect();
    Ok(Json(ListResponse::from(items)))
}
