//! Dashboard page

use axum::response::Html;

/// Single-page dashboard; talks to the JSON API under `/api`
pub async fn index() -> Html<&'static str> {
    Html(include_str!("../../assets/index.html"))
}
