//! Review form endpoint

use axum::{
    extract::{rejection::FormRejection, Path, State},
    response::{IntoResponse, Redirect, Response},
    Form,
};
use cinema_common::ReviewForm;
use tracing::warn;

use crate::error::{ApiError, ApiResult};
use crate::review_workflow::{self, Submission};
use crate::AppState;

/// POST /review/:movie_id/
///
/// Redirects (303) to the movie page whether or not the review was stored,
/// unless strict mode turns a dropped submission into a 422. A body that is
/// not a readable urlencoded form counts as an empty form.
pub async fn submit_review(
    State(state): State<AppState>,
    Path(movie_id): Path<i64>,
    form: Result<Form<ReviewForm>, FormRejection>,
) -> ApiResult<Response> {
    let form = match form {
        Ok(Form(form)) => form,
        Err(rejection) => {
            warn!("Unreadable review form for movie {}: {}", movie_id, rejection.body_text());
            ReviewForm::default()
        }
    };

    let outcome = review_workflow::submit_review(&state.db, movie_id, &form).await?;

    match outcome.submission {
        Submission::Dropped(errors) if state.reject_invalid_reviews => {
            Err(ApiError::InvalidReview(errors))
        }
        _ => Ok(Redirect::to(&outcome.redirect_to).into_response()),
    }
}
