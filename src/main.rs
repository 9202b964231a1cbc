//! CLI entry point for the MRV rater.
//!
//! Provides subcommands for converting a yearly EU MRV publication into the
//! static site's JSON views, and for checking the regulator's API for newly
//! published versions.

mod infra;
mod services;

use crate::infra::emsa::client::EmsaClient;
use crate::services::report_catalog::ReportCatalog;
use anyhow::{Context, Result, bail};
use chrono::Utc;
use clap::{Parser, Subcommand};
use mrv_rater::config::Config;
use mrv_rater::output::{print_json, print_pretty, write_atomic};
use mrv_rater::pipeline::{ConvertOptions, convert};
use mrv_rater::updates::{CheckSummary, VersionState};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "mrv_rater")]
#[command(about = "Turns EU MRV ship-emission publications into ranked JSON views", long_about = None)]
struct Cli {
    /// Optional JSON config (registry mapping, company groups, tracked years)
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert one year's spreadsheet into JSON views
    Convert {
        /// Reporting year of the spreadsheet (2020-2024)
        #[arg(short, long)]
        year: u16,

        /// Spreadsheet (.xlsx/.xls/.xlsb/.ods) or CSV export of the sheet
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Directory the JSON views are written to
        #[arg(short, long, default_value = "json")]
        output_dir: PathBuf,

        /// Worksheet name (default: "<year> Full ERs")
        #[arg(long)]
        sheet: Option<String>,

        /// Port-of-registry → country mapping (JSON object)
        #[arg(long, value_name = "FILE")]
        registry_map: Option<PathBuf>,

        /// Print the run report as JSON
        #[arg(long, default_value_t = false)]
        report: bool,
    },
    /// Check the MRV API for new versions of the yearly publications
    CheckUpdates {
        /// File remembering the last seen version per year
        #[arg(short, long, default_value = "json/mrv_versions.json")]
        state: PathBuf,

        /// Directory to download updated spreadsheets to
        #[arg(short, long, default_value = "data")]
        download_dir: PathBuf,

        /// Only report updates, do not download
        #[arg(long, default_value_t = false)]
        no_download: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/mrv_rater.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("mrv_rater.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };

    match cli.command {
        Commands::Convert {
            year,
            input,
            output_dir,
            sheet,
            registry_map,
            report,
        } => {
            let registries = config.registries(registry_map.as_deref())?;
            let groups = config.company_groups();
            info!(registries = registries.len(), "Configuration loaded");

            let opts = ConvertOptions {
                year,
                input,
                output_dir,
                sheet,
            };
            let run = convert(&opts, &registries, &groups)
                .with_context(|| format!("converting {}", opts.input.display()))?;

            print_pretty(&run);
            if report {
                println!("{}", serde_json::to_string_pretty(&run)?);
            }

            if !run.is_success() {
                for failure in &run.views_failed {
                    error!(view = failure.view, error = %failure.error, "View not published");
                }
                bail!("{} view(s) failed for {}", run.views_failed.len(), year);
            }
        }
        Commands::CheckUpdates {
            state,
            download_dir,
            no_download,
        } => {
            let client = EmsaClient::new()?;
            check_updates(
                &client,
                &state,
                &download_dir,
                &config.tracked_years(),
                !no_download,
            )
            .await?;
        }
    }

    Ok(())
}

/// Compares the published versions against the saved state, downloads what
/// changed, then saves the new state.
#[tracing::instrument(skip(catalog, tracked_years), fields(state = %state_path.display()))]
async fn check_updates<C: ReportCatalog>(
    catalog: &C,
    state_path: &Path,
    download_dir: &Path,
    tracked_years: &[u16],
    download: bool,
) -> Result<()> {
    info!("Checking MRV for updates");
    let listing = catalog.list_files().await?;

    let current = VersionState::from_listing(&listing, tracked_years);
    let saved = VersionState::load(state_path);
    let updates = saved.updates_since(&current);

    if updates.is_empty() {
        info!("No updates found");
        return Ok(());
    }

    info!(count = updates.len(), "Updates found");
    let mut downloaded = Vec::new();
    let mut failed = 0;
    for update in &updates {
        info!(update = %update, "Publication updated");
        if !download {
            continue;
        }
        match catalog.download(update).await {
            Ok(body) => {
                let path = write_atomic(download_dir, &update.download_file_name(), &body)?;
                downloaded.push(path.display().to_string());
            }
            Err(e) => {
                warn!(year = %update.year, error = %e, "Download failed");
                failed += 1;
            }
        }
    }

    print_json(&CheckSummary {
        checked_at: Utc::now(),
        updates,
        downloaded,
    })?;

    // Keep the old state so failed downloads are retried next run
    if failed > 0 {
        bail!("{failed} download(s) failed, version state not saved");
    }

    current.save(state_path)?;
    info!("State saved");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use mrv_rater::updates::{Listing, Update};

    const LISTING: &str = r#"{
        "results": [
            {"reportingPeriod": 2024, "version": 173, "generationDate": "2026-02-07", "fileName": "2024-v173"},
            {"reportingPeriod": 2023, "version": 210, "generationDate": "2025-11-01", "fileName": "2023-v210"}
        ]
    }"#;

    const TRACKED: &[u16] = &[2023, 2024];

    /// Serves [`LISTING`]; downloads for `failing_year` return an error.
    struct FakeCatalog {
        failing_year: Option<&'static str>,
    }

    #[async_trait::async_trait]
    impl ReportCatalog for FakeCatalog {
        async fn list_files(&self) -> Result<Listing> {
            Ok(Listing::parse(LISTING.as_bytes())?)
        }

        async fn download(&self, update: &Update) -> Result<Bytes> {
            if self.failing_year == Some(update.year.as_str()) {
                bail!("HTTP 503 for {}", update.year);
            }
            Ok(Bytes::from(format!("workbook v{}", update.new_version)))
        }
    }

    fn current_state() -> VersionState {
        VersionState::from_listing(&Listing::parse(LISTING.as_bytes()).unwrap(), TRACKED)
    }

    #[tokio::test]
    async fn test_state_saved_after_all_downloads() {
        let dir = tempfile::tempdir().unwrap();
        let state = dir.path().join("json").join("mrv_versions.json");
        let downloads = dir.path().join("data");
        let catalog = FakeCatalog { failing_year: None };

        check_updates(&catalog, &state, &downloads, TRACKED, true)
            .await
            .unwrap();

        assert_eq!(VersionState::load(&state), current_state());
        let body = std::fs::read_to_string(downloads.join("2024-v173.xlsx")).unwrap();
        assert_eq!(body, "workbook v173");
        assert!(downloads.join("2023-v210.xlsx").exists());
    }

    #[tokio::test]
    async fn test_failed_download_keeps_old_state() {
        let dir = tempfile::tempdir().unwrap();
        let state = dir.path().join("mrv_versions.json");
        let downloads = dir.path().join("data");

        let mut old = current_state();
        old.0.remove("2023");
        if let Some(info) = old.0.get_mut("2024") {
            info.version = mrv_rater::updates::Version::Number(170);
        }
        old.save(&state).unwrap();
        let before = std::fs::read(&state).unwrap();

        let catalog = FakeCatalog {
            failing_year: Some("2023"),
        };
        let result = check_updates(&catalog, &state, &downloads, TRACKED, true).await;

        assert!(result.is_err());
        assert_eq!(std::fs::read(&state).unwrap(), before);
        assert_eq!(VersionState::load(&state).updates_since(&current_state()).len(), 2);
        assert!(downloads.join("2024-v173.xlsx").exists());
        assert!(!downloads.join("2023-v210.xlsx").exists());
    }

    #[tokio::test]
    async fn test_no_updates_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let state = dir.path().join("mrv_versions.json");
        let downloads = dir.path().join("data");
        current_state().save(&state).unwrap();
        let before = std::fs::read(&state).unwrap();

        let catalog = FakeCatalog {
            failing_year: Some("2024"),
        };
        check_updates(&catalog, &state, &downloads, TRACKED, true)
            .await
            .unwrap();

        assert_eq!(std::fs::read(&state).unwrap(), before);
        assert!(!downloads.exists());
    }

    #[tokio::test]
    async fn test_report_only_still_saves_state() {
        let dir = tempfile::tempdir().unwrap();
        let state = dir.path().join("mrv_versions.json");
        let downloads = dir.path().join("data");
        let catalog = FakeCatalog {
            failing_year: Some("2024"),
        };

        check_updates(&catalog, &state, &downloads, TRACKED, false)
            .await
            .unwrap();

        assert_eq!(VersionState::load(&state), current_state());
        assert!(!downloads.exists());
    }
}
