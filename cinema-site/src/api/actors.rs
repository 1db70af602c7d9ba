//! Public actor page

use axum::{
    extract::{Path, State},
    Json,
};
use cinema_common::db::{self, actors::Credit, Actor, Movie};
use serde::Serialize;

use crate::error::{ApiError, ApiResult};
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct ActorDetailResponse {
    #[serde(flatten)]
    pub actor: Actor,
    /// Published movies the person acts in
    pub acted_in: Vec<Movie>,
    /// Published movies the person directs
    pub directed: Vec<Movie>,
}

/// GET /actor/:name/
pub async fn actor_detail(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> ApiResult<Json<ActorDetailResponse>> {
    let actor = db::actors::get_actor_by_name(&state.db, &name)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("actor {}", name)))?;

    let acted_in = db::actors::filmography(&state.db, actor.id, Credit::Actor).await?;
    let directed = db::actors::filmography(&state.db, actor.id, Credit::Director).await?;

    Ok(Json(ActorDetailResponse {
        actor,
        acted_in,
        directed,
    }))
}
