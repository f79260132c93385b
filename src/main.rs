use std::path::Path;

use env_logger::Env;
use raspador::{
    configuration::{get_configuration, Settings},
    services::{run_scrape, Droid, RunLog, ScrapeOutcome, SheetSink},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let configuration = get_configuration().expect("Failed to read configuration.");

    let log = RunLog::create(&configuration.output.log_dir)?;
    clean_previous_run(&configuration, &log);

    let droid = Droid::new(&configuration.scraper.webdriver_url).await?;
    let mut sink = SheetSink::new(configuration.output.sheet_path.clone());

    let outcome = run_scrape(&droid, &configuration, &mut sink, &log).await;

    // The session is released on every exit path of the loop above.
    if let Err(e) = droid.quit().await {
        log.line(&format!("Failed to close the browser session: {:?}", e));
    }
    match outcome {
        ScrapeOutcome::Done => log.line("Browser closed. Scrape finished."),
        ScrapeOutcome::Failed => log.line("Browser closed. Scrape ended early."),
    }

    Ok(())
}

/// Removes the previous run's sheet and HTML snapshots so each run starts from
/// a clean slate. The log directory is kept: log files are timestamped per run.
fn clean_previous_run(configuration: &Settings, log: &RunLog) {
    log.line("Cleaning up files from previous runs...");

    let html_dir = Path::new(&configuration.output.html_dir);
    if html_dir.exists() {
        match std::fs::remove_dir_all(html_dir) {
            Ok(()) => log.line(&format!(
                "Directory '{}' and its contents removed.",
                html_dir.display()
            )),
            Err(e) => log.line(&format!(
                "Failed to remove directory '{}': {:?}",
                html_dir.display(),
                e
            )),
        }
    }

    let sheet = Path::new(&configuration.output.sheet_path);
    if sheet.exists() {
        match std::fs::remove_file(sheet) {
            Ok(()) => log.line(&format!("File '{}' removed.", sheet.display())),
            Err(e) => log.line(&format!(
                "Failed to remove file '{}': {:?}",
                sheet.display(),
                e
            )),
        }
    }

    log.line("Cleanup finished.");
}
