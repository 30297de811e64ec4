use std::fmt;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{Parser, ValueEnum};
use serde::Deserialize;

use crate::util;

/// Public GitHub REST endpoint. Enterprise installations override it.
pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// Seconds between two cycles of the same collector.
pub const DEFAULT_REFRESH_SECS: u64 = 30;

/// Port of the `/metrics` endpoint.
pub const DEFAULT_PORT: u16 = 9999;

// ------------------------------------------------------------
// Failure policy
// ------------------------------------------------------------
//
// Decides what a collector does when a single fetch fails.
//
// - isolate: log, count, skip that repository / workflow, keep going
// - fatal:   abort the cycle and take the whole process down
//
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Failures are confined to the repository or workflow that failed.
    #[default]
    Isolate,

    /// The first failed fetch terminates the exporter.
    Fatal,
}

// ------------------------------------------------------------
// Command line
// ------------------------------------------------------------
//
// Every flag can also be supplied through the environment.
// Flags win over the optional JSON file.
//
#[derive(Parser, Debug, Default)]
#[command(name = "github-actions-exporter", version)]
#[command(about = "Exports GitHub Actions runner, job and workflow state as Prometheus gauges")]
pub struct Cli {
    /// Optional JSON configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Access token sent as `Authorization: token <value>`
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub github_token: Option<String>,

    /// Repositories to watch, `owner/name`, comma separated
    #[arg(long, env = "GITHUB_REPOS", value_delimiter = ',')]
    pub github_repos: Vec<String>,

    /// Refresh interval in seconds
    #[arg(long, env = "GITHUB_REFRESH")]
    pub github_refresh: Option<u64>,

    /// Base URL of the GitHub REST API
    #[arg(long, env = "GITHUB_API_URL")]
    pub github_api_url: Option<String>,

    /// Listening port of the metrics endpoint
    #[arg(long, env = "PORT")]
    pub port: Option<u16>,

    /// What to do when a fetch fails
    #[arg(long, env = "FAILURE_POLICY", value_enum)]
    pub failure_policy: Option<FailurePolicy>,
}

// ------------------------------------------------------------
// JSON file layout
// ------------------------------------------------------------
//
// Example:
//
// {
//   "github": {
//     "token": "ghp_...",
//     "repositories": ["owner/app", "owner/lib"],
//     "refresh": 60
//   },
//   "port": 9999,
//   "failure_policy": "isolate"
// }
//
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct FileConfig {
    pub github: GithubFileConfig,
    pub port: Option<u16>,
    pub failure_policy: Option<FailurePolicy>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct GithubFileConfig {
    pub token: Option<String>,
    pub repositories: Vec<String>,
    pub refresh: Option<u64>,
    pub api_url: Option<String>,
}

// ------------------------------------------------------------
// Resolved configuration
// ------------------------------------------------------------

/// Validated runtime configuration shared read-only by all collectors.
#[derive(Debug, Clone)]
pub struct Config {
    pub github: GithubConfig,

    /// Port of the metrics endpoint
    pub port: u16,

    pub failure_policy: FailurePolicy,
}

#[derive(Clone)]
pub struct GithubConfig {
    /// Secret, never logged
    pub token: String,

    /// Repositories in `owner/name` form, processed in this order
    pub repositories: Vec<String>,

    /// Sleep between two cycles
    pub refresh: Duration,

    /// API base URL without trailing slash
    pub api_url: String,
}

impl fmt::Debug for GithubConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GithubConfig")
            .field("token", &"<redacted>")
            .field("repositories", &self.repositories)
            .field("refresh", &self.refresh)
            .field("api_url", &self.api_url)
            .finish()
    }
}

impl Config {
    /// Reads the optional file named by `--config` and merges the
    /// command line on top of it.
    pub fn load(cli: Cli) -> Result<Self> {
        let file = match &cli.config {
            Some(path) => {
                let data = fs::read_to_string(path)
                    .with_context(|| format!("reading config file {}", path.display()))?;
                serde_json::from_str(&data)
                    .with_context(|| format!("parsing config file {}", path.display()))?
            }
            None => FileConfig::default(),
        };

        Self::resolve(cli, file)
    }

    /// Merges both sources, applies defaults and validates the result.
    pub fn resolve(cli: Cli, file: FileConfig) -> Result<Self> {
        let repositories = if cli.github_repos.is_empty() {
            file.github.repositories
        } else {
            cli.github_repos
        };

        let repositories: Vec<String> = repositories
            .iter()
            .map(|r| r.trim())
            .filter(|r| !r.is_empty())
            .map(str::to_string)
            .collect();

        let token = cli
            .github_token
            .or(file.github.token)
            .unwrap_or_default();

        let refresh = cli
            .github_refresh
            .or(file.github.refresh)
            .unwrap_or(DEFAULT_REFRESH_SECS);

        let api_url = cli
            .github_api_url
            .or(file.github.api_url)
            .unwrap_or_else(|| DEFAULT_API_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        let port = cli.port.or(file.port).unwrap_or(DEFAULT_PORT);

        let failure_policy = cli
            .failure_policy
            .or(file.failure_policy)
            .unwrap_or_default();

        if repositories.is_empty() {
            bail!("no repositories configured (--github-repos / GITHUB_REPOS)");
        }
        for repo in &repositories {
            if util::split_repository(repo).is_none() {
                bail!("invalid repository '{}', expected owner/name", repo);
            }
        }
        if token.trim().is_empty() {
            bail!("no access token configured (--github-token / GITHUB_TOKEN)");
        }
        if refresh == 0 {
            bail!("refresh interval must be at least one second");
        }
        if port == 0 {
            bail!("port must be positive");
        }

        Ok(Self {
            github: GithubConfig {
                token,
                repositories,
                refresh: Duration::from_secs(refresh),
                api_url,
            },
            port,
            failure_policy,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cli_with(repos: &[&str], token: &str) -> Cli {
        Cli {
            github_token: Some(token.to_string()),
            github_repos: repos.iter().map(|r| r.to_string()).collect(),
            ..Cli::default()
        }
    }

    #[test]
    fn defaults_apply_when_only_required_values_given() {
        let cfg = Config::resolve(cli_with(&["octo/app"], "secret"), FileConfig::default()).unwrap();

        assert_eq!(cfg.github.repositories, vec!["octo/app"]);
        assert_eq!(cfg.github.refresh, Duration::from_secs(DEFAULT_REFRESH_SECS));
        assert_eq!(cfg.github.api_url, DEFAULT_API_URL);
        assert_eq!(cfg.port, DEFAULT_PORT);
        assert_eq!(cfg.failure_policy, FailurePolicy::Isolate);
    }

    #[test]
    fn command_line_wins_over_file() {
        let file: FileConfig = serde_json::from_str(
            r#"{
                "github": {
                    "token": "from-file",
                    "repositories": ["file/repo"],
                    "refresh": 120,
                    "api_url": "https://ghe.example.com/api/v3/"
                },
                "port": 8080,
                "failure_policy": "fatal"
            }"#,
        )
        .unwrap();

        let mut cli = cli_with(&["cli/repo"], "from-cli");
        cli.port = Some(9100);

        let cfg = Config::resolve(cli, file).unwrap();

        assert_eq!(cfg.github.token, "from-cli");
        assert_eq!(cfg.github.repositories, vec!["cli/repo"]);
        assert_eq!(cfg.github.refresh, Duration::from_secs(120));
        assert_eq!(cfg.github.api_url, "https://ghe.example.com/api/v3");
        assert_eq!(cfg.port, 9100);
        assert_eq!(cfg.failure_policy, FailurePolicy::Fatal);
    }

    #[test]
    fn blank_repository_entries_are_dropped() {
        let cfg = Config::resolve(cli_with(&[" octo/app ", "", "octo/lib"], "t"), FileConfig::default())
            .unwrap();
        assert_eq!(cfg.github.repositories, vec!["octo/app", "octo/lib"]);
    }

    #[test]
    fn rejects_malformed_repository() {
        let err = Config::resolve(cli_with(&["octo"], "t"), FileConfig::default()).unwrap_err();
        assert!(err.to_string().contains("octo"));
    }

    #[test]
    fn rejects_missing_token_and_repositories() {
        assert!(Config::resolve(cli_with(&["octo/app"], " "), FileConfig::default()).is_err());
        assert!(Config::resolve(cli_with(&[], "t"), FileConfig::default()).is_err());
    }

    #[test]
    fn rejects_zero_refresh() {
        let mut cli = cli_with(&["octo/app"], "t");
        cli.github_refresh = Some(0);
        assert!(Config::resolve(cli, FileConfig::default()).is_err());
    }

    #[test]
    fn token_is_redacted_in_debug_output() {
        let cfg = Config::resolve(cli_with(&["octo/app"], "ghp_topsecret"), FileConfig::default())
            .unwrap();
        let printed = format!("{:?}", cfg);
        assert!(!printed.contains("ghp_topsecret"));
        assert!(printed.contains("<redacted>"));
    }

    #[test]
    fn parses_comma_separated_repositories_flag() {
        let cli = Cli::try_parse_from([
            "github-actions-exporter",
            "--github-repos",
            "octo/app,octo/lib",
            "--failure-policy",
            "fatal",
        ])
        .unwrap();

        assert_eq!(cli.github_repos, vec!["octo/app", "octo/lib"]);
        assert_eq!(cli.failure_policy, Some(FailurePolicy::Fatal));
    }
}
