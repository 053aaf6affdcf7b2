use regex::Regex;
use serde::Deserialize;
use url::Url;

#[derive(Debug, Deserialize)]
pub struct BridgeConfig {
    /// Base URL of the Jenkins instance builds are triggered on
    pub jenkins_url: Url,
    /// Username for Jenkins basic auth. Credentials are only attached to outgoing requests
    /// when both username and password are configured.
    #[serde(default)]
    pub jenkins_username: Option<String>,
    /// Password for Jenkins basic auth
    #[serde(default)]
    pub jenkins_password: Option<String>,
    /// GitHub organization, first `job/` segment of the Jenkins job path
    pub jenkins_org: String,
    /// Project (repository) name, second `job/` segment of the Jenkins job path
    pub jenkins_project: String,
    /// Pattern a comment has to start with to trigger a build
    #[serde(with = "serde_regex", default = "default_trigger_pattern")]
    pub trigger_pattern: Regex,
    /// Query string passed to `buildWithParameters`. When unset the plain `build` endpoint
    /// is used instead.
    #[serde(default)]
    pub jenkins_build_params: Option<String>,
    /// Shared secret GitHub signs webhook payloads with. Leaving this unset rejects every
    /// signed request.
    #[serde(default)]
    pub github_secret: Option<String>,
    /// Commenters allowed to trigger builds. Accepted for forward compatibility but not
    /// enforced: any correctly signed comment can trigger.
    #[serde(default)]
    pub github_whitelist: Vec<String>,
}

impl BridgeConfig {
    /// Basic auth credentials for Jenkins, if both halves are configured.
    pub fn jenkins_auth(&self) -> Option<(&str, &str)> {
        match (&self.jenkins_username, &self.jenkins_password) {
            (Some(username), Some(password)) => Some((username, password)),
            _ => None,
        }
    }
}

fn default_trigger_pattern() -> Regex {
    Regex::new(r"test\W+this\W+please").expect("this should never fail")
}
