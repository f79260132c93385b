use std::fs;
use std::path::Path;
use std::time::Duration;

use thirtyfour::By;

use crate::{
    configuration::Settings,
    services::{extract_items, Droid, RunLog, SheetSink, WaitOutcome},
};

const START_DATE_INPUT_ID: &str = "txtDataInicioCotacao";
const END_DATE_INPUT_ID: &str = "txtDataFimCotacao";
const SEARCH_BUTTON_ID: &str = "btnPesquisar";
const RESULTS_TABLE_ID: &str = "tblResultadoListaCount";
const NEXT_BUTTON_ID: &str = "tblResultadoListaCount_next";
const DISABLED_MARKER: &str = "disabled";

// Both endings mean the result set is exhausted, but the run log keeps them
// apart: the control leaving the DOM and the control never becoming clickable
// are different site behaviors.
const NEXT_CONTROL_MISSING: &str = "Next page control not found. Assuming no more pages.";
const NEXT_CONTROL_WAIT_EXPIRED: &str =
    "Timed out waiting for the next page control to become clickable. Assuming no more pages.";

/// Pagination loop states. `Extracting` carries the page source captured while
/// the page was ready, so extraction never re-reads a page that may already be
/// re-rendering.
enum ScrapeState {
    Searching,
    PageReady,
    Extracting(String),
    Advancing,
    Done,
    Failed,
}

#[derive(Debug, PartialEq)]
pub enum ScrapeOutcome {
    /// The next-page control reported itself disabled after the last page.
    Done,
    /// The run ended early: control missing, wait expired, or a driver error.
    /// Already logged; the caller only has to release the session.
    Failed,
}

/// The next control stays present on the last page and flags the end of the
/// result set through its class attribute.
pub fn next_control_is_disabled(class_attr: Option<&str>) -> bool {
    class_attr.map(|c| c.contains(DISABLED_MARKER)).unwrap_or(false)
}

/// Runs the full scrape: search, then extract/persist/advance one page at a
/// time until the next-page control is disabled or goes missing. Never
/// panics and never returns an error; every failure path degrades to a logged
/// terminal state so the caller can release the driver unconditionally.
pub async fn run_scrape(
    droid: &Droid,
    settings: &Settings,
    sink: &mut SheetSink,
    log: &RunLog,
) -> ScrapeOutcome {
    let timeout = Duration::from_secs(settings.scraper.wait_timeout_secs);
    let render_pause = Duration::from_secs(settings.scraper.render_pause_secs);

    let mut state = ScrapeState::Searching;
    let mut page: u32 = 1;

    loop {
        state = match state {
            ScrapeState::Searching => match open_search(droid, settings, timeout, log).await {
                Ok(next) => next,
                Err(e) => {
                    log.line(&format!("Critical error during search: {:?}", e));
                    ScrapeState::Failed
                }
            },
            ScrapeState::PageReady => {
                log.line(&format!("Collecting data from page {}...", page));
                match droid.page_source().await {
                    Ok(html) => {
                        if let Err(e) = save_page_html(&settings.output.html_dir, page, &html, log)
                        {
                            log.line(&format!("Failed to save page {} HTML: {:?}", page, e));
                        }
                        ScrapeState::Extracting(html)
                    }
                    Err(e) => {
                        log.line(&format!("Failed to capture page {} source: {:?}", page, e));
                        ScrapeState::Failed
                    }
                }
            }
            ScrapeState::Extracting(html) => {
                let records = extract_items(&html, log);
                if records.is_empty() {
                    log.line(&format!("No items found on page {} to add to the sheet.", page));
                } else {
                    match sink.append_batch(&records, log) {
                        Ok(()) => log.line(&format!(
                            "{} items from page {} added to the sheet.",
                            records.len(),
                            page
                        )),
                        Err(e) => log.line(&format!(
                            "Failed to persist the batch from page {}: {:?}",
                            page, e
                        )),
                    }
                }
                ScrapeState::Advancing
            }
            ScrapeState::Advancing => {
                match droid.find_clickable(By::Id(NEXT_BUTTON_ID), timeout).await {
                    Ok(WaitOutcome::Missing) => {
                        log.line(NEXT_CONTROL_MISSING);
                        ScrapeState::Failed
                    }
                    Ok(WaitOutcome::TimedOut) => {
                        log.line(NEXT_CONTROL_WAIT_EXPIRED);
                        ScrapeState::Failed
                    }
                    Ok(WaitOutcome::Found(button)) => match button.attr("class").await {
                        Ok(class_attr) => {
                            if next_control_is_disabled(class_attr.as_deref()) {
                                log.line("No more pages. Finishing scrape.");
                                ScrapeState::Done
                            } else {
                                log.line(&format!("Clicking through to page {}...", page + 1));
                                match button.click().await {
                                    Ok(()) => {
                                        tokio::time::sleep(render_pause).await;
                                        page += 1;
                                        ScrapeState::PageReady
                                    }
                                    Err(e) => {
                                        log.line(&format!(
                                            "Failed to click the next page control: {:?}",
                                            e
                                        ));
                                        ScrapeState::Failed
                                    }
                                }
                            }
                        }
                        Err(e) => {
                            log.line(&format!(
                                "Failed to read the next page control class: {:?}",
                                e
                            ));
                            ScrapeState::Failed
                        }
                    },
                    Err(e) => {
                        log.line(&format!("Critical error while paginating: {:?}", e));
                        ScrapeState::Failed
                    }
                }
            }
            ScrapeState::Done => return ScrapeOutcome::Done,
            ScrapeState::Failed => return ScrapeOutcome::Failed,
        };
    }
}

/// Loads the search page, fills the date range, fires the search and waits for
/// the results table to become visible.
async fn open_search(
    droid: &Droid,
    settings: &Settings,
    timeout: Duration,
    log: &RunLog,
) -> anyhow::Result<ScrapeState> {
    log.line("Starting the Comprasnet scrape...");
    droid.goto(&settings.scraper.site_url).await?;
    log.line("Site loaded.");

    log.line(&format!("Filling start date: {}", settings.scraper.start_date));
    let WaitOutcome::Found(start_input) = droid
        .find_visible(By::Id(START_DATE_INPUT_ID), timeout)
        .await?
    else {
        log.line("Timed out waiting for the start date field. Ending run.");
        return Ok(ScrapeState::Failed);
    };
    start_input
        .send_keys(settings.scraper.start_date.as_str())
        .await?;

    log.line(&format!("Filling end date: {}", settings.scraper.end_date));
    let WaitOutcome::Found(end_input) = droid
        .find_visible(By::Id(END_DATE_INPUT_ID), timeout)
        .await?
    else {
        log.line("Timed out waiting for the end date field. Ending run.");
        return Ok(ScrapeState::Failed);
    };
    end_input
        .send_keys(settings.scraper.end_date.as_str())
        .await?;

    log.line("Clicking the search button...");
    let WaitOutcome::Found(search_button) = droid
        .find_clickable(By::Id(SEARCH_BUTTON_ID), timeout)
        .await?
    else {
        log.line("Timed out waiting for the search button. Ending run.");
        return Ok(ScrapeState::Failed);
    };
    search_button.click().await?;
    log.line("Search button clicked.");

    log.line("Waiting for the results table to load...");
    match droid.find_visible(By::Id(RESULTS_TABLE_ID), timeout).await? {
        WaitOutcome::Found(_) => {
            log.line("Results table loaded.");
            Ok(ScrapeState::PageReady)
        }
        WaitOutcome::Missing | WaitOutcome::TimedOut => {
            log.line("Results table never became visible. Ending run.");
            Ok(ScrapeState::Failed)
        }
    }
}

/// Snapshot of each visited page, kept alongside the sheet for auditing.
fn save_page_html(html_dir: &str, page: u32, source: &str, log: &RunLog) -> std::io::Result<()> {
    let dir = Path::new(html_dir);
    if !dir.exists() {
        fs::create_dir_all(dir)?;
        log.line(&format!("Directory created: {}", html_dir));
    }

    let path = dir.join(format!("pagina_{}.html", page));
    fs::write(&path, source)?;
    log.line(&format!("HTML saved to {}", path.display()));

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{next_control_is_disabled, NEXT_CONTROL_MISSING, NEXT_CONTROL_WAIT_EXPIRED};

    #[test]
    fn missing_and_expired_next_control_log_apart() {
        assert_ne!(NEXT_CONTROL_MISSING, NEXT_CONTROL_WAIT_EXPIRED);
        assert!(NEXT_CONTROL_MISSING.contains("not found"));
        assert!(NEXT_CONTROL_WAIT_EXPIRED.contains("Timed out"));
        assert!(NEXT_CONTROL_MISSING.ends_with("Assuming no more pages."));
        assert!(NEXT_CONTROL_WAIT_EXPIRED.ends_with("Assuming no more pages."));
    }

    #[test]
    fn disabled_class_ends_pagination() {
        assert!(next_control_is_disabled(Some(
            "paginate_button next disabled"
        )));
    }

    #[test]
    fn enabled_class_keeps_paginating() {
        assert!(!next_control_is_disabled(Some("paginate_button next")));
    }

    #[test]
    fn missing_class_attribute_keeps_paginating() {
        assert!(!next_control_is_disabled(None));
    }
}
