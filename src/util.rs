/// Small helpers shared by the configuration layer and the API client.
///
/// IMPORTANT:
/// - No collector logic should live here.
/// - Everything in this module is pure and deterministic.

/// Splits an `owner/name` repository identifier.
///
/// Returns `None` unless there is exactly one `/` with a non-empty
/// part on each side.
///
/// Examples:
/// - "octo/app"     -> Some(("octo", "app"))
/// - "octo"         -> None
/// - "octo/app/x"   -> None
pub fn split_repository(repo: &str) -> Option<(&str, &str)> {
    let (owner, name) = repo.split_once('/')?;
    if owner.is_empty() || name.is_empty() || name.contains('/') {
        return None;
    }
    Some((owner, name))
}

/// `/repos/{repo}/actions/runners`
pub fn runners_path(repo: &str) -> String {
    format!("/repos/{}/actions/runners", repo)
}

/// `/repos/{repo}/actions/runs`
pub fn runs_path(repo: &str) -> String {
    format!("/repos/{}/actions/runs", repo)
}

/// `/repos/{repo}/actions/workflows`
pub fn workflows_path(repo: &str) -> String {
    format!("/repos/{}/actions/workflows", repo)
}

/// `/repos/{repo}/actions/workflows/{workflow_id}/runs`
pub fn workflow_runs_path(repo: &str, workflow_id: u64) -> String {
    format!("/repos/{}/actions/workflows/{}/runs", repo, workflow_id)
}
