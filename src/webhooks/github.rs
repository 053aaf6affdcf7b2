use std::io;

use anyhow::anyhow;
use regex::Regex;
use rocket::{
    data::{ByteUnit, FromData},
    http::{ContentType, Status},
    request::{FromRequest, Outcome},
    serde::json::Json,
    Data, Request, State,
};
use serde::Deserialize;
use tracing::{debug, error, trace};

pub mod events;
mod signing;

use crate::{
    config::BridgeConfig,
    jenkins,
    webhooks::{msg, Msg},
};
use events::IssueCommentEvent;

const X_GITHUB_EVENT: &str = "X-GitHub-Event";
const X_HUB_SIGNATURE: &str = "X-Hub-Signature";

/// Header values the pipeline branches on before anything gets parsed.
pub struct WebhookHeaders {
    event: Option<String>,
    signature: Option<String>,
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for WebhookHeaders {
    type Error = std::convert::Infallible;

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let headers = request.headers();
        Outcome::Success(WebhookHeaders {
            event: headers.get_one(X_GITHUB_EVENT).map(str::to_owned),
            signature: headers.get_one(X_HUB_SIGNATURE).map(str::to_owned),
        })
    }
}

/// Request body exactly as received. GitHub signs the raw bytes, so verification has to
/// happen before any deserialization touches them.
pub struct RawPayload(pub String);

const LIMIT: ByteUnit = ByteUnit::Mebibyte(1);

#[rocket::async_trait]
impl<'r> FromData<'r> for RawPayload {
    type Error = anyhow::Error;

    async fn from_data(request: &'r Request<'_>, data: Data<'r>) -> rocket::data::Outcome<'r, Self> {
        trace!("received payload on GitHub webhook endpoint: {:?}", request);

        // connectivity probes are answered from the header alone, whatever the body
        // looks like, so none of the body validation below may get in their way
        if request.headers().get_one(X_GITHUB_EVENT) == Some("ping") {
            return rocket::data::Outcome::Success(RawPayload(String::new()));
        }

        let json_ct = ContentType::new("application", "json");
        if request.content_type() != Some(&json_ct) {
            trace!(
                "content type `{:?}` wasn't json, stopping here...",
                request.content_type()
            );
            return rocket::data::Outcome::Error((Status::BadRequest, anyhow!("wrong content type")));
        }

        let size_limit = request.limits().get("json").unwrap_or(LIMIT);
        let content = match data.open(size_limit).into_string().await {
            Ok(s) if s.is_complete() => s.into_inner(),
            Ok(_) => {
                let eof = io::ErrorKind::UnexpectedEof;
                trace!("payload was too big");
                return rocket::data::Outcome::Error((
                    Status::PayloadTooLarge,
                    io::Error::new(eof, "data limit exceeded").into(),
                ));
            }
            Err(e) => return rocket::data::Outcome::Error((Status::BadRequest, e.into())),
        };

        rocket::data::Outcome::Success(RawPayload(content))
    }
}

#[derive(Debug, Deserialize)]
struct ActionProbe {
    action: Option<String>,
}

/// Cheap probe for the payload's `action` field, used by the pre-authentication filter.
/// An undecodable body reports `true` so the request still has to pass signature
/// verification before a real parse error surfaces.
fn action_is_created(payload: &str) -> bool {
    match serde_json::from_str::<ActionProbe>(payload) {
        Ok(probe) => probe.action.as_deref() == Some("created"),
        Err(_) => true,
    }
}

/// Anchored match: the pattern has to match a prefix of the comment, so
/// `test this please go` triggers while `lol test this please` stays inert.
fn comment_matches(pattern: &Regex, comment: &str) -> bool {
    pattern.find(comment).map_or(false, |m| m.start() == 0)
}

/// The whole validation and trigger pipeline, run once per inbound webhook:
/// ping short-circuit, non-create filter, signature verification, comment match,
/// Jenkins trigger. All outcomes collapse into the `{"msg": ...}` envelope.
#[rocket::post("/v1/github/comment", data = "<payload>")]
pub async fn github_comment(
    headers: WebhookHeaders,
    payload: RawPayload,
    config: &State<BridgeConfig>,
) -> (Status, Json<Msg>) {
    if headers.event.as_deref() == Some("ping") {
        return (Status::Ok, msg("pong"));
    }

    // Edited and deleted comments are benign notifications, acknowledged before any
    // signature work happens.
    if headers.signature.is_some() && !action_is_created(&payload.0) {
        debug!("discarding non create event");
        return (Status::Ok, msg("discarding all non create events"));
    }

    if let Err(err) = signing::verify(
        config.github_secret.as_deref(),
        headers.signature.as_deref(),
        payload.0.as_bytes(),
    ) {
        debug!("rejecting request: {}", err);
        return (err.status(), msg(err.to_string()));
    }

    let event: IssueCommentEvent = match serde_json::from_str(&payload.0) {
        Ok(event) => event,
        Err(err) => {
            debug!("couldn't decode issue_comment payload: {}", err);
            return (Status::BadRequest, msg("couldn't decode payload"));
        }
    };

    debug!(
        "received create event for PR {} from {} with comment {:?}",
        event.issue.number, event.sender.login, event.comment.body
    );

    if !comment_matches(&config.trigger_pattern, &event.comment.body) {
        return (Status::Ok, msg("regex did not match"));
    }

    debug!("regex passed");

    match jenkins::trigger_build(config.inner(), event.issue.number).await {
        Ok(_) => (Status::Ok, msg("request processed")),
        Err(err) => {
            error!("failed to trigger Jenkins build: {}", err);
            (
                Status::InternalServerError,
                msg(format!("Error processing event: {}", err)),
            )
        }
    }
}
