use crate::catalog::{InMemoryCatalog, SiteCatalog};
use crate::cli::args::{measurement_query, site_query, Cli, Commands, SelectionArgs};
use crate::error::ExportError;
use crate::export::ExportPipeline;
use crate::processors::EmptyResultPolicy;
use crate::settings::ExportSettings;
use crate::utils::progress::ProgressReporter;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{info, warn};

pub async fn run(cli: Cli) -> Result<()> {
    init_logging(cli.verbose, cli.quiet, cli.log_file.as_deref())?;

    match cli.command {
        Commands::Export {
            selection,
            output,
            source_root,
            temp_base,
            max_workers,
            empty_result,
        } => {
            let mut settings = ExportSettings::load(cli.config.as_deref())
                .context("Failed to load settings")?;
            apply_overrides(&mut settings, source_root, temp_base, max_workers, empty_result);

            run_export(settings, selection, output, cli.quiet).await?;
        }

        Commands::Sites {
            catalog,
            bounds,
            start_date,
            end_date,
            recompute_spans,
        } => {
            let mut catalog = load_catalog(&catalog)?;
            if recompute_spans {
                catalog.recompute_span_dates();
            }

            let sites = catalog.list_sites(&site_query(bounds, start_date, end_date))?;
            info!("{} sites matched", sites.len());
            println!("{}", serde_json::to_string_pretty(&sites)?);
        }

        Commands::Measurements {
            catalog,
            sites,
            bounds,
            start_date,
            end_date,
            reading,
        } => {
            let catalog = load_catalog(&catalog)?;
            let query = measurement_query(sites, bounds, start_date, end_date, reading);

            let measurements = catalog.site_measurements(&query)?;
            info!("{} measurements matched", measurements.len());
            println!("{}", serde_json::to_string_pretty(&measurements)?);
        }
    }

    Ok(())
}

fn apply_overrides(
    settings: &mut ExportSettings,
    source_root: Option<PathBuf>,
    temp_base: Option<PathBuf>,
    max_workers: Option<usize>,
    empty_result: Option<EmptyResultPolicy>,
) {
    if let Some(root) = source_root {
        settings.source_root = root;
    }
    if let Some(base) = temp_base {
        settings.temp_base = base;
    }
    if let Some(workers) = max_workers {
        settings.max_workers = workers.max(1);
    }
    if let Some(policy) = empty_result {
        settings.empty_result = policy;
    }
}

async fn run_export(
    settings: ExportSettings,
    selection: SelectionArgs,
    output: Option<PathBuf>,
    quiet: bool,
) -> Result<()> {
    info!(
        "Exporting from {} (staging under {}, {} workers)",
        settings.source_root.display(),
        settings.temp_base.display(),
        settings.max_workers
    );

    let deadline = settings.deadline();
    let pipeline = ExportPipeline::new(settings);
    let cancel = pipeline.cancellation();
    let raw = selection.into_raw();

    let mut task = tokio::task::spawn_blocking(move || {
        let progress = ProgressReporter::new_spinner("Preparing export...", quiet);
        let result = pipeline.export(raw, Some(&progress));
        match &result {
            Ok(_) => progress.finish_with_message("Export complete"),
            Err(_) => progress.finish_with_message("Export failed"),
        }
        result
    });

    let outcome = match tokio::time::timeout(deadline, &mut task).await {
        Ok(joined) => joined.map_err(ExportError::from)?,
        Err(_) => {
            warn!("Export exceeded {}s deadline, cancelling", deadline.as_secs());
            cancel.cancel();
            // Wait for the pipeline to unwind so its working directory is gone
            task.await.map_err(ExportError::from)?
        }
    };

    let (response, summary) = match outcome {
        Ok(done) => done,
        Err(e) if e.is_client_error() => {
            return Err(anyhow::Error::new(e).context("Rejected export parameters"))
        }
        Err(e) => return Err(anyhow::Error::new(e).context("Export failed")),
    };

    let output = output.unwrap_or_else(|| PathBuf::from(&response.filename));
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    tokio::fs::write(&output, &response.body)
        .await
        .with_context(|| format!("Failed to write {}", output.display()))?;

    println!("{}", summary.summary());
    println!(
        "Wrote {} ({} bytes, {})",
        output.display(),
        response.len(),
        response.content_disposition()
    );
    Ok(())
}

fn load_catalog(path: &Path) -> Result<InMemoryCatalog> {
    InMemoryCatalog::from_json_file(path)
        .with_context(|| format!("Failed to load catalog {}", path.display()))
}

fn init_logging(verbose: bool, quiet: bool, log_file: Option<&Path>) -> Result<()> {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let level = if verbose {
        "debug"
    } else if quiet {
        "warn"
    } else {
        "info"
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("man_export={}", level)));

    let file_layer = match log_file {
        Some(path) => {
            let file = std::fs::File::create(path)
                .with_context(|| format!("Failed to create log file {}", path.display()))?;
            Some(
                fmt::layer()
                    .with_ansi(false)
                    .with_target(false)
                    .with_writer(Mutex::new(file)),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_level(true)
                .with_writer(std::io::stderr)
                .compact(),
        )
        .with(file_layer)
        .try_init()
        .context("Failed to initialise logging")?;

    Ok(())
}
