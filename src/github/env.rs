//! GitHub Actions default environment variables.
//!
//! Every accessor reads the process environment when called; nothing is
//! cached. See
//! <https://docs.github.com/en/actions/reference/variables-reference#default-environment-variables>.

fn github_env(name: &str) -> String {
    std::env::var(format!("GITHUB_{name}")).unwrap_or_default()
}

fn github_env_number(name: &str) -> u64 {
    parse_number(&github_env(name))
}

/// Unset or malformed numbers read as 0.
fn parse_number(value: &str) -> u64 {
    value.parse().unwrap_or(0)
}

fn with_default(value: String, default: &str) -> String {
    if value.is_empty() {
        default.to_string()
    } else {
        value
    }
}

/// Name of the running workflow.
pub fn workflow() -> String {
    github_env("WORKFLOW")
}

/// Unique number of the run within the repository, stable across re-runs.
pub fn run_id() -> u64 {
    github_env_number("RUN_ID")
}

/// Number of the run for this particular workflow, starting at 1.
pub fn run_number() -> u64 {
    github_env_number("RUN_NUMBER")
}

/// Identifier of the running action.
pub fn action() -> String {
    github_env("ACTION")
}

/// Whether the process runs inside GitHub Actions.
pub fn actions() -> bool {
    github_env("ACTIONS") == "true"
}

/// Person or app that initiated the workflow, e.g. `octocat`.
pub fn actor() -> String {
    github_env("ACTOR")
}

/// Owner and repository name, e.g. `octocat/Hello-World`.
pub fn repository() -> String {
    github_env("REPOSITORY")
}

pub fn event_name() -> String {
    github_env("EVENT_NAME")
}

/// Path of the file holding the webhook event payload.
pub fn event_path() -> String {
    github_env("EVENT_PATH")
}

pub fn workspace() -> String {
    github_env("WORKSPACE")
}

/// Commit SHA that triggered the workflow.
pub fn sha() -> String {
    github_env("SHA")
}

/// Branch or tag ref that triggered the workflow, e.g. `refs/heads/main`.
pub fn git_ref() -> String {
    github_env("REF")
}

/// Head branch, only set for pull request events.
pub fn head_ref() -> String {
    github_env("HEAD_REF")
}

/// Base branch, only set for pull request events.
pub fn base_ref() -> String {
    github_env("BASE_REF")
}

pub fn server_url() -> String {
    with_default(github_env("SERVER_URL"), "https://github.com")
}

pub fn api_url() -> String {
    with_default(github_env("API_URL"), "https://api.github.com")
}

pub fn graphql_url() -> String {
    with_default(github_env("GRAPHQL_URL"), "https://api.github.com/graphql")
}
