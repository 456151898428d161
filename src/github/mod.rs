//! Retrieval of repository tarballs and workflow artifacts from GitHub.
//!
//! The [`GitHub`] client is an ordinary value: its [`Config`] is resolved
//! once when it is built, and it is passed to whatever needs it.

pub mod env;

use log::{debug, warn};
use serde::Deserialize;
use std::io::Cursor;

use crate::archive::{Extraction, extract};
use crate::error::{Error, Result};
use crate::io::{Auth, HttpTransport, Request, Response, Transport};
use crate::matcher::{MatchAll, Matcher};
use crate::path::StripDepth;

/// Page size used when listing run artifacts.
const ARTIFACTS_PER_PAGE: usize = 100;

/// Client configuration, resolved once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// API base URL, always ending with `/`.
    pub api_url: String,
    /// Token used to authorize requests; anonymous when `None`.
    pub token: Option<String>,
}

impl Config {
    pub fn new(api_url: impl Into<String>, token: Option<String>) -> Self {
        let mut api_url = api_url.into();
        if !api_url.ends_with('/') {
            api_url.push('/');
        }
        Self {
            api_url,
            token: token.filter(|t| !t.is_empty()),
        }
    }

    /// Reads `GITHUB_API_URL` and the token from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Resolves the configuration through `lookup`.
    ///
    /// The token comes from `GITHUB_TOKEN`, falling back to the action
    /// inputs `github-token` and `token` (`INPUT_GITHUB-TOKEN`,
    /// `INPUT_TOKEN`).
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_url = lookup("GITHUB_API_URL")
            .filter(|url| !url.is_empty())
            .unwrap_or_else(|| "https://api.github.com".to_string());

        let token = lookup("GITHUB_TOKEN")
            .filter(|t| !t.is_empty())
            .or_else(|| {
                ["github-token", "token"].iter().find_map(|input| {
                    lookup(&format!("INPUT_{}", input.to_uppercase()))
                        .map(|t| t.trim().to_string())
                        .filter(|t| !t.is_empty())
                })
            });

        Self::new(api_url, token)
    }

    /// URL of the tarball of `owner/repo` at `branch`.
    pub fn tarball_url(&self, owner: &str, repo: &str, branch: &str) -> String {
        format!("{}repos/{owner}/{repo}/tarball/{branch}", self.api_url)
    }

    pub fn run_artifacts_url(&self, owner: &str, repo: &str, run_id: u64, page: usize) -> String {
        format!(
            "{}repos/{owner}/{repo}/actions/runs/{run_id}/artifacts?per_page={ARTIFACTS_PER_PAGE}&page={page}",
            self.api_url
        )
    }

    pub fn artifact_download_url(&self, owner: &str, repo: &str, artifact_id: u64) -> String {
        format!(
            "{}repos/{owner}/{repo}/actions/artifacts/{artifact_id}/zip",
            self.api_url
        )
    }
}

/// Workflow run artifact as listed by the API.
#[derive(Debug, Clone, Deserialize)]
pub struct Artifact {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub size_in_bytes: u64,
    #[serde(default)]
    pub expired: bool,
}

#[derive(Debug, Deserialize)]
struct ArtifactList {
    total_count: usize,
    artifacts: Vec<Artifact>,
}

/// GitHub client running both retrieval flows.
pub struct GitHub<T = HttpTransport> {
    config: Config,
    transport: T,
}

impl GitHub<HttpTransport> {
    /// Client configured from the environment, talking HTTP.
    pub fn from_env() -> Result<Self> {
        Ok(Self::new(Config::from_env(), HttpTransport::new()?))
    }
}

impl<T: Transport> GitHub<T> {
    pub fn new(config: Config, transport: T) -> Self {
        Self { config, transport }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn basic_auth(&self) -> Auth {
        self.config
            .token
            .clone()
            .map_or(Auth::Anonymous, Auth::Basic)
    }

    fn bearer_auth(&self) -> Auth {
        self.config
            .token
            .clone()
            .map_or(Auth::Anonymous, Auth::Bearer)
    }

    /// Downloads the files of `owner/repo` at `branch` accepted by `include`.
    ///
    /// Paths are relative to the repository root. This is best effort: any
    /// failure is logged as a warning and yields `None`.
    pub async fn download_selected_repository_files<M>(
        &self,
        owner: &str,
        repo: &str,
        branch: &str,
        include: &M,
    ) -> Option<Extraction>
    where
        M: Matcher + ?Sized,
    {
        match self.download_repository(owner, repo, branch, include).await {
            Ok(files) => Some(files),
            Err(err) => {
                warn!("failed to download repository: {err}");
                None
            }
        }
    }

    async fn download_repository<M>(
        &self,
        owner: &str,
        repo: &str,
        branch: &str,
        include: &M,
    ) -> Result<Extraction>
    where
        M: Matcher + ?Sized,
    {
        let url = self.config.tarball_url(owner, repo, branch);
        debug!("downloading tarball for repo: {url}");

        let resp = self
            .transport
            .get(Request::get(url.clone(), self.basic_auth()))
            .await?;
        if resp.status != 200 {
            return Err(Error::Status {
                url,
                status: resp.status,
            });
        }

        extract_response(resp, StripDepth::REPOSITORY_TARBALL, include)
    }

    /// Downloads every file of the artifact `name` of the current run.
    ///
    /// The repository and run id are read from `GITHUB_REPOSITORY` and
    /// `GITHUB_RUN_ID` at call time.
    pub async fn download_artifact(&self, name: &str) -> Result<Extraction> {
        self.download_artifact_for(&env::repository(), env::run_id(), name)
            .await
    }

    /// Downloads every file of the artifact `name` of run `run_id` in
    /// `repository` (`owner/name`). Entry names are kept as stored.
    pub async fn download_artifact_for(
        &self,
        repository: &str,
        run_id: u64,
        name: &str,
    ) -> Result<Extraction> {
        let (owner, repo) = split_repository(repository)?;

        let artifact = self
            .find_artifact(owner, repo, run_id, name)
            .await?
            .ok_or_else(|| Error::ArtifactNotFound {
                name: name.to_string(),
                run_id,
                repository: repository.to_string(),
            })?;
        debug!(
            "found artifact {} (id {}, {} bytes)",
            artifact.name, artifact.id, artifact.size_in_bytes
        );

        let location = self.artifact_location(owner, repo, artifact.id).await?;
        let resp = self
            .transport
            .get(Request::get(location.clone(), self.bearer_auth()))
            .await?;
        if !resp.is_success() {
            return Err(Error::Status {
                url: location,
                status: resp.status,
            });
        }

        extract_response(resp, StripDepth::NONE, &MatchAll)
    }

    /// Pages through the run's artifacts until one named `name` shows up.
    async fn find_artifact(
        &self,
        owner: &str,
        repo: &str,
        run_id: u64,
        name: &str,
    ) -> Result<Option<Artifact>> {
        let mut seen = 0;
        for page in 1.. {
            let url = self.config.run_artifacts_url(owner, repo, run_id, page);
            let resp = self
                .transport
                .get(Request::get(url.clone(), self.bearer_auth()))
                .await?;
            if !resp.is_success() {
                return Err(Error::Status {
                    url,
                    status: resp.status,
                });
            }

            let list: ArtifactList = serde_json::from_slice(&resp.body)?;
            let count = list.artifacts.len();
            if let Some(artifact) = list.artifacts.into_iter().find(|a| a.name == name) {
                return Ok(Some(artifact));
            }

            seen += count;
            if count < ARTIFACTS_PER_PAGE || seen >= list.total_count {
                break;
            }
        }
        Ok(None)
    }

    /// Resolves the short-lived download URL the API redirects to.
    async fn artifact_location(&self, owner: &str, repo: &str, artifact_id: u64) -> Result<String> {
        let url = self.config.artifact_download_url(owner, repo, artifact_id);
        let resp = self
            .transport
            .get(Request::get(url.clone(), self.bearer_auth()).without_redirects())
            .await?;

        let redirect = (300..400).contains(&resp.status);
        let success = resp.is_success();
        match resp.location {
            Some(location) if redirect => Ok(location),
            _ if !redirect && !success => Err(Error::Status {
                url,
                status: resp.status,
            }),
            _ => Err(Error::MissingRedirect(url)),
        }
    }
}

fn split_repository(repository: &str) -> Result<(&str, &str)> {
    match repository.split_once('/') {
        Some((owner, repo)) if !owner.is_empty() && !repo.is_empty() => Ok((owner, repo)),
        _ => Err(Error::InvalidRepository(repository.to_string())),
    }
}

fn extract_response<M>(resp: Response, strip: StripDepth, include: &M) -> Result<Extraction>
where
    M: Matcher + ?Sized,
{
    let content_type = resp.content_type.unwrap_or_default();
    extract(Cursor::new(resp.body), &content_type, strip, include)
}
