use rocket::{http::Status, serde::json::Json, Request};
use serde::Serialize;

pub mod github;
pub use github::github_comment;

/// JSON envelope every route answers with, success or failure.
#[derive(Debug, Serialize)]
pub struct Msg {
    pub msg: String,
}

pub fn msg(text: impl Into<String>) -> Json<Msg> {
    Json(Msg { msg: text.into() })
}

#[rocket::get("/ping")]
pub fn ping() -> Json<Msg> {
    msg("pong")
}

/// Keeps guard and router rejections (wrong content type, oversized payload, unknown
/// route) inside the JSON envelope instead of rocket's default HTML pages.
#[rocket::catch(default)]
pub fn fallback(status: Status, _request: &Request) -> (Status, Json<Msg>) {
    (status, msg(status.reason_lossy()))
}
