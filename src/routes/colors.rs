//! Palette lookup endpoint.
//!
//! GET /api/v1/color?prompt=<id>
//!
//! Pure function of the prompt id; needs no store state. Hosts that render
//! their own decorations use this to stay color-consistent with everyone
//! else.
//!
//! Used by: external renderers and debugging

use axum::{extract::Query, routing::get, Json, Router};
use serde::Deserialize;

use crate::blame::color;
use crate::models::ColorResponse;

pub fn routes() -> Router {
    Router::new().route("/api/v1/color", get(get_color))
}

#[derive(Debug, Deserialize)]
struct ColorQuery {
    prompt: String,
}

async fn get_color(Query(query): Query<ColorQuery>) -> Json<ColorResponse> {
    let color_index = color::color_index(&query.prompt);
    Json(ColorResponse {
        prompt_id: query.prompt,
        color_index,
        color: color::color_hex(color_index).to_string(),
    })
}
