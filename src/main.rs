use anyhow::{Context, Result};
use clap::Parser;
use skyblock_flipper::{
    aggregator::Scanner,
    cli::{Cli, Command, ExportFormat},
    config::AppConfig,
    models::FlipCandidate,
    report, utils,
};
use std::fs::File;
use std::io::{self, BufWriter, Write};

fn print_flips(flips: &[FlipCandidate], limit: Option<usize>) {
    let shown = &flips[..limit.unwrap_or(flips.len()).min(flips.len())];
    print!("{}", report::render_flips(shown));
    if shown.len() < flips.len() {
        println!("... {} more", flips.len() - shown.len());
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    utils::init_logging();
    let cli = Cli::parse();

    let config = AppConfig::load()?;
    tracing::info!(
        api_base = %config.api_base,
        api_key = config.api_key.is_some(),
        data_dir = %config.data_dir.display(),
        "[INIT] skyblock-flipper starting"
    );
    let scanner = Scanner::new(config)?;

    match cli.command {
        Command::Scan(args) => {
            let outcome = match scanner.scan(&args.options()).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    tracing::error!(error = %e, "[SCAN] scan failed");
                    return Err(e).context("failed to fetch market data");
                }
            };
            print_flips(&outcome.flips, args.limit);
            tracing::info!(
                from_cache = outcome.from_cache,
                snapshot_age_secs = outcome.snapshot_age_secs,
                "[SCAN] done"
            );
        }
        Command::Item { name, refresh } => {
            let (entry, _) = scanner.snapshot(refresh).await?;
            print!(
                "{}",
                report::render_observations(&name, &entry.payload.item_observations(&name))
            );
        }
        Command::Last { limit } => match scanner.last_flips()? {
            Some(entry) => {
                let saved = chrono::DateTime::from_timestamp_millis(entry.timestamp_ms)
                    .map(|t| t.to_rfc3339())
                    .unwrap_or_default();
                println!("Last scan: {}", saved);
                print_flips(&entry.payload, limit);
            }
            None => println!("No saved results; run `scan` first."),
        },
        Command::Export(args) => {
            let entry = scanner
                .last_flips()?
                .context("no saved results; run `scan` first")?;
            let mut writer: Box<dyn Write> = match &args.output {
                Some(path) => Box::new(BufWriter::new(
                    File::create(path).with_context(|| format!("creating {}", path.display()))?,
                )),
                None => Box::new(io::stdout().lock()),
            };
            match args.format {
                ExportFormat::Csv => report::write_csv(&mut writer, &entry.payload, !args.no_sources)?,
                ExportFormat::Json => report::write_json(&mut writer, &entry.payload)?,
            }
            writer.flush()?;
            if let Some(path) = &args.output {
                tracing::info!(rows = entry.payload.len(), path = %path.display(), "[EXPORT] written");
            }
        }
    }

    Ok(())
}
