use std::time::{Duration, Instant};

use thirtyfour::error::WebDriverError;
use thirtyfour::prelude::*;

const POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Result of a bounded wait. `Missing` and `TimedOut` both leave the caller
/// without an element, but they are distinct site behaviors: the element
/// never entered the DOM, or it is present and never reached the waited-for
/// condition. Callers log them apart.
pub enum WaitOutcome {
    Found(WebElement),
    /// Never appeared in the DOM within the timeout.
    Missing,
    /// Appeared, but never became visible/clickable before the deadline.
    TimedOut,
}

/// Wrapper around the WebDriver session. Bounded waits return a `WaitOutcome`
/// instead of erroring, so a wait timeout stays a value the pagination loop
/// can branch on.
pub struct Droid {
    pub driver: WebDriver,
}

impl Droid {
    pub async fn new(webdriver_url: &str) -> anyhow::Result<Self> {
        let caps = DesiredCapabilities::chrome();

        let driver = WebDriver::new(webdriver_url, caps).await?;
        driver.maximize_window().await?;

        Ok(Droid { driver })
    }

    pub async fn goto(&self, url: &str) -> Result<(), WebDriverError> {
        self.driver.goto(url).await
    }

    pub async fn page_source(&self) -> Result<String, WebDriverError> {
        self.driver.source().await
    }

    /// Waits up to `timeout` for an element to exist and become visible.
    pub async fn find_visible(
        &self,
        by: By,
        timeout: Duration,
    ) -> Result<WaitOutcome, WebDriverError> {
        let deadline = Instant::now() + timeout;
        let query = self.driver.query(by.clone()).wait(timeout, POLL_INTERVAL);
        if !query.exists().await? {
            return Ok(WaitOutcome::Missing);
        }

        let element = self.driver.find(by).await?;
        match element
            .wait_until()
            .wait(time_left(deadline), POLL_INTERVAL)
            .displayed()
            .await
        {
            Ok(()) => Ok(WaitOutcome::Found(element)),
            Err(WebDriverError::Timeout(_)) => Ok(WaitOutcome::TimedOut),
            Err(e) => Err(e),
        }
    }

    /// Waits up to `timeout` for an element to exist and become clickable.
    pub async fn find_clickable(
        &self,
        by: By,
        timeout: Duration,
    ) -> Result<WaitOutcome, WebDriverError> {
        let deadline = Instant::now() + timeout;
        let query = self.driver.query(by.clone()).wait(timeout, POLL_INTERVAL);
        if !query.exists().await? {
            return Ok(WaitOutcome::Missing);
        }

        let element = self.driver.find(by).await?;
        match element
            .wait_until()
            .wait(time_left(deadline), POLL_INTERVAL)
            .clickable()
            .await
        {
            Ok(()) => Ok(WaitOutcome::Found(element)),
            Err(WebDriverError::Timeout(_)) => Ok(WaitOutcome::TimedOut),
            Err(e) => Err(e),
        }
    }

    pub async fn quit(self) -> Result<(), WebDriverError> {
        self.driver.quit().await
    }
}

/// Both wait phases share one deadline so a single call never blocks for more
/// than the configured timeout.
fn time_left(deadline: Instant) -> Duration {
    deadline.saturating_duration_since(Instant::now())
}

#[cfg(test)]
mod tests {
    use super::time_left;
    use std::time::{Duration, Instant};

    #[test]
    fn time_left_saturates_at_zero_once_expired() {
        let deadline = Instant::now();
        std::thread::sleep(Duration::from_millis(5));

        assert_eq!(time_left(deadline), Duration::ZERO);
    }

    #[test]
    fn time_left_never_exceeds_the_remaining_window() {
        let deadline = Instant::now() + Duration::from_secs(60);

        assert!(time_left(deadline) <= Duration::from_secs(60));
    }
}
