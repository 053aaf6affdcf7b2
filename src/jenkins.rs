//! The two-step Jenkins trigger protocol: fetch a fresh crumb from the crumb issuer, then
//! POST the build request for the PR job.

use reqwest::StatusCode;
use thiserror::Error;
use tracing::debug;
use url::Url;

use crate::config::BridgeConfig;

const CRUMB_HEADER: &str = "Jenkins-Crumb";

/// Failures of a single trigger attempt. One attempt per webhook, no retries; the route
/// handler collapses all of these into a 500.
#[derive(Debug, Error)]
pub enum TriggerError {
    #[error("error getting crumbs, reason: {reason} status code: {status}")]
    CrumbFetch { status: u16, reason: &'static str },
    #[error("no crumb in issuer response")]
    CrumbMissing,
    #[error("error triggering Jenkins job for PR: {pr} reason: {reason} status code: {status}")]
    BuildSubmit {
        pr: u64,
        status: u16,
        reason: &'static str,
    },
    #[error("jenkins URL cannot hold job path segments")]
    BaseUrl,
    #[error("jenkins request failed: {0}")]
    Http(#[from] reqwest::Error),
}

fn reason(status: StatusCode) -> &'static str {
    status.canonical_reason().unwrap_or("unknown")
}

fn crumb_url(config: &BridgeConfig) -> Result<Url, TriggerError> {
    let mut url = config.jenkins_url.clone();
    url.path_segments_mut()
        .map_err(|_| TriggerError::BaseUrl)?
        .pop_if_empty()
        .extend(["crumbIssuer", "api", "json"]);
    Ok(url)
}

fn trigger_url(config: &BridgeConfig, pr: u64) -> Result<Url, TriggerError> {
    let mut url = config.jenkins_url.clone();
    url.path_segments_mut()
        .map_err(|_| TriggerError::BaseUrl)?
        .pop_if_empty()
        .extend([
            "job",
            config.jenkins_org.as_str(),
            "job",
            config.jenkins_project.as_str(),
            "job",
        ])
        .push(&format!("PR-{}", pr))
        .push(if config.jenkins_build_params.is_some() {
            "buildWithParameters"
        } else {
            "build"
        });

    if let Some(params) = &config.jenkins_build_params {
        url.set_query(Some(params));
    }

    Ok(url)
}

async fn fetch_crumb(
    client: &reqwest::Client,
    config: &BridgeConfig,
) -> Result<String, TriggerError> {
    let endpoint = crumb_url(config)?;
    debug!("crumb endpoint {}", endpoint);

    let mut request = client.get(endpoint);
    if let Some((username, password)) = config.jenkins_auth() {
        request = request.basic_auth(username, Some(password));
    }

    let response = request.send().await?;
    let status = response.status();
    if status != StatusCode::OK {
        return Err(TriggerError::CrumbFetch {
            status: status.as_u16(),
            reason: reason(status),
        });
    }

    let body: serde_json::Value = response.json().await?;
    body.get("crumb")
        .and_then(|crumb| crumb.as_str())
        .map(str::to_owned)
        .ok_or(TriggerError::CrumbMissing)
}

async fn submit_build(
    client: &reqwest::Client,
    config: &BridgeConfig,
    crumb: &str,
    pr: u64,
) -> Result<String, TriggerError> {
    let endpoint = trigger_url(config, pr)?;
    debug!("trigger endpoint {}", endpoint);

    let mut request = client.post(endpoint).header(CRUMB_HEADER, crumb);
    if let Some((username, password)) = config.jenkins_auth() {
        request = request.basic_auth(username, Some(password));
    }

    let response = request.send().await?;
    let status = response.status();
    if status != StatusCode::CREATED {
        return Err(TriggerError::BuildSubmit {
            pr,
            status: status.as_u16(),
            reason: reason(status),
        });
    }

    Ok(response.text().await?)
}

/// Runs one trigger attempt for the given PR. The crumb is fetched fresh every time and
/// both calls go through one client that is released when the attempt returns.
pub async fn trigger_build(config: &BridgeConfig, pr: u64) -> Result<String, TriggerError> {
    let client = reqwest::Client::new();
    let crumb = fetch_crumb(&client, config).await?;
    submit_build(&client, config, &crumb, pr).await
}
