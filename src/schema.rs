use serde::{Deserialize, Deserializer};

// ------------------------------------------------------------
// GitHub Actions REST response types
// ------------------------------------------------------------
//
// Only the fields the collectors publish are decoded; everything
// else in the payload is ignored.
//
// String fields GitHub may send as `null` (conclusion before a run
// finishes, head_branch for some events, ...) decode to "" so that
// the status mapping and label values never see a missing value.
//
// `total_count` is kept for logging. Emptiness is always decided by
// the decoded item list, never by the count.
//

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Option::unwrap_or_default)
}

// ------------------------------------------------------------
// GET /repos/{repo}/actions/runners
// ------------------------------------------------------------

#[derive(Debug, Deserialize, Clone, Default)]
pub struct RunnersPage {
    #[serde(default)]
    pub total_count: u64,

    #[serde(default)]
    pub runners: Vec<Runner>,
}

/// A self-hosted runner registered on a repository.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct Runner {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub name: String,

    #[serde(default, deserialize_with = "null_as_empty")]
    pub os: String,

    /// "online" or "offline"
    #[serde(default, deserialize_with = "null_as_empty")]
    pub status: String,
}

impl Runner {
    pub fn is_online(&self) -> bool {
        self.status == "online"
    }
}

// ------------------------------------------------------------
// GET /repos/{repo}/actions/runs
// ------------------------------------------------------------

#[derive(Debug, Deserialize, Clone, Default)]
pub struct JobRunsPage {
    #[serde(default)]
    pub total_count: u64,

    #[serde(default)]
    pub workflow_runs: Vec<JobRun>,
}

/// One workflow run as listed by the repository-wide runs endpoint.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct JobRun {
    pub id: u64,

    #[serde(default, deserialize_with = "null_as_empty")]
    pub head_branch: String,

    #[serde(default)]
    pub run_number: u64,

    #[serde(default, deserialize_with = "null_as_empty")]
    pub event: String,

    #[serde(default, deserialize_with = "null_as_empty")]
    pub status: String,

    #[serde(default, deserialize_with = "null_as_empty")]
    pub conclusion: String,

    #[serde(default, deserialize_with = "null_as_empty")]
    pub updated_at: String,
}

// ------------------------------------------------------------
// GET /repos/{repo}/actions/workflows
// ------------------------------------------------------------

#[derive(Debug, Deserialize, Clone, Default)]
pub struct WorkflowsPage {
    #[serde(default)]
    pub total_count: u64,

    #[serde(default)]
    pub workflows: Vec<Workflow>,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct Workflow {
    pub id: u64,

    #[serde(default, deserialize_with = "null_as_empty")]
    pub name: String,

    /// "active", "disabled_manually", ...
    #[serde(default, deserialize_with = "null_as_empty")]
    pub state: String,
}

// ------------------------------------------------------------
// GET /repos/{repo}/actions/workflows/{workflow_id}/runs
// ------------------------------------------------------------
//
// GitHub returns runs newest first. Index 0 is treated as the
// latest run without comparing timestamps.
//
#[derive(Debug, Deserialize, Clone, Default)]
pub struct WorkflowRunsPage {
    #[serde(default)]
    pub total_count: u64,

    #[serde(default)]
    pub workflow_runs: Vec<WorkflowRun>,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct WorkflowRun {
    pub id: u64,

    #[serde(default, deserialize_with = "null_as_empty")]
    pub head_branch: String,

    #[serde(default, deserialize_with = "null_as_empty")]
    pub event: String,

    #[serde(default, deserialize_with = "null_as_empty")]
    pub status: String,

    #[serde(default, deserialize_with = "null_as_empty")]
    pub conclusion: String,

    #[serde(default, deserialize_with = "null_as_empty")]
    pub created_at: String,

    #[serde(default, deserialize_with = "null_as_empty")]
    pub updated_at: String,

    /// Browser URL of the run
    #[serde(rename = "html_url", default, deserialize_with = "null_as_empty")]
    pub url: String,
}
