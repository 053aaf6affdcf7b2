use serde::Deserialize;

/// The slice of GitHub's `issue_comment` payload the bridge consumes. PR comments arrive
/// as issue comments, so the PR number lives under `issue.number`. The payload's `action`
/// field is only ever read from the raw body, before signature verification.
#[derive(Debug, Deserialize)]
pub struct IssueCommentEvent {
    pub issue: Issue,
    pub comment: Comment,
    pub sender: GitHubUser,
}

#[derive(Debug, Deserialize)]
pub struct Issue {
    pub number: u64,
}

#[derive(Debug, Deserialize)]
pub struct Comment {
    pub body: String,
}

#[derive(Debug, Deserialize)]
pub struct GitHubUser {
    pub login: String,
}
