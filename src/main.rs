//! Main entry point for the ghextract CLI application.
//!
//! Runs one of the retrieval flows and lists or pipes the selected files.

use anyhow::{Context, Result, bail};
use chrono::{DateTime, Utc};
use clap::Parser;
use std::time::SystemTime;
use tokio::io::AsyncWriteExt;

use ghextract::cli::Command;
use ghextract::github::env;
use ghextract::{AnyOfPatterns, Cli, ExtractedFile, GitHub, MatchAll};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(cli.log_filter()))
        .init();

    let github = GitHub::from_env()?;

    let files = match &cli.command {
        Command::Tarball {
            repository,
            branch,
            include,
        } => {
            let (owner, repo) = repository
                .split_once('/')
                .filter(|(owner, repo)| !owner.is_empty() && !repo.is_empty())
                .with_context(|| format!("invalid repository {repository:?}, expected OWNER/REPO"))?;

            let files = if include.is_empty() {
                github
                    .download_selected_repository_files(owner, repo, branch, &MatchAll)
                    .await
            } else {
                let patterns = AnyOfPatterns::new(include);
                if patterns.is_empty() {
                    bail!("none of the include patterns compiled");
                }
                github
                    .download_selected_repository_files(owner, repo, branch, &patterns)
                    .await
            };

            match files {
                Some(files) => files,
                None => bail!("failed to download {repository} at {branch}"),
            }
        }
        Command::Artifact {
            name,
            repository,
            run_id,
        } => {
            let repository = repository.clone().unwrap_or_else(env::repository);
            let run_id = run_id.unwrap_or_else(env::run_id);
            github
                .download_artifact_for(&repository, run_id, name)
                .await
                .with_context(|| format!("failed to download artifact {name}"))?
        }
    };

    let mut files: Vec<&ExtractedFile> = files.values().collect();
    files.sort_by(|a, b| a.path.cmp(&b.path));

    if cli.pipe {
        pipe_files(&files).await
    } else {
        list_files(&files, cli.verbose);
        Ok(())
    }
}

/// Write file contents to stdout, each preceded by a marker when there are several.
async fn pipe_files(files: &[&ExtractedFile]) -> Result<()> {
    let mut stdout = tokio::io::stdout();
    let show_filename = files.len() > 1;

    for file in files {
        if show_filename {
            stdout
                .write_all(format!("--- {} ---\n", file.path).as_bytes())
                .await?;
        }
        stdout.write_all(&file.data).await?;
    }
    stdout.flush().await?;

    Ok(())
}

/// List extracted files, either one name per line or as a table.
fn list_files(files: &[&ExtractedFile], verbose: bool) {
    if !verbose {
        for file in files {
            println!("{}", file.path);
        }
        return;
    }

    println!(
        "{:>10}  {:>6}  {:>10}  {:>5}  Name",
        "Length", "Mode", "Date", "Time"
    );
    println!("{}", "-".repeat(60));

    let mut total = 0u64;
    for file in files {
        let mode = file
            .metadata
            .mode
            .map(|m| format!("{:06o}", m & 0o777_777))
            .unwrap_or_else(|| "-".to_string());
        let (date, time) = file
            .metadata
            .modified
            .map(format_timestamp)
            .unwrap_or_else(|| ("-".to_string(), "-".to_string()));

        println!(
            "{:>10}  {:>6}  {:>10}  {:>5}  {}",
            file.metadata.size, mode, date, time, file.path
        );
        total += file.metadata.size;
    }

    println!("{}", "-".repeat(60));
    println!("{:>10}  {} files, {}", total, files.len(), format_size(total));
}

/// UTC `YYYY-MM-DD` and `HH:MM` of `time`.
fn format_timestamp(time: SystemTime) -> (String, String) {
    let time = DateTime::<Utc>::from(time);
    (
        time.format("%Y-%m-%d").to_string(),
        time.format("%H:%M").to_string(),
    )
}

fn format_size(size: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;

    if size >= MB {
        format!("{:.2} MB", size as f64 / MB as f64)
    } else if size >= KB {
        format!("{:.2} KB", size as f64 / KB as f64)
    } else {
        format!("{} bytes", size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_format_timestamp() {
        let at = |secs| SystemTime::UNIX_EPOCH + Duration::from_secs(secs);
        assert_eq!(
            format_timestamp(at(0)),
            ("1970-01-01".to_string(), "00:00".to_string())
        );
        assert_eq!(
            format_timestamp(at(1_700_000_000)),
            ("2023-11-14".to_string(), "22:13".to_string())
        );
        assert_eq!(
            format_timestamp(at(951_782_400)),
            ("2000-02-29".to_string(), "00:00".to_string())
        );
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(12), "12 bytes");
        assert_eq!(format_size(2048), "2.00 KB");
        assert_eq!(format_size(3 * 1024 * 1024), "3.00 MB");
    }
}
