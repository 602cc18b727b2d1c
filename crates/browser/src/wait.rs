use std::future::Future;
use std::time::Duration;

use tokio::time::{sleep, Instant};

use crate::driver::{BrowserDriver, DriverError, ElementRef};

/// Bounded polling wait, the equivalent of an explicit WebDriver wait.
#[derive(Clone, Copy, Debug)]
pub struct Waiter {
    timeout: Duration,
    poll_interval: Duration,
}

impl Waiter {
    pub fn new(timeout: Duration, poll_interval: Duration) -> Self {
        Self { timeout, poll_interval }
    }

    /// Polls `probe` until it yields a value. Transient lookup errors and
    /// `Ok(None)` keep polling; other errors end the wait immediately. The probe
    /// always runs at least once.
    pub async fn until<T, F, Fut>(&self, what: &str, mut probe: F) -> Result<T, DriverError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<Option<T>, DriverError>>,
    {
        let deadline = Instant::now() + self.timeout;
        loop {
            match probe().await {
                Ok(Some(value)) => return Ok(value),
                Ok(None) => {}
                Err(error) if error.is_transient() => {}
                Err(error) => return Err(error),
            }

            if Instant::now() >= deadline {
                return Err(DriverError::Timeout {
                    what: what.to_owned(),
                    timeout_ms: u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX),
                });
            }
            sleep(self.poll_interval).await;
        }
    }

    pub async fn presence(
        &self,
        driver: &dyn BrowserDriver,
        css: &str,
    ) -> Result<ElementRef, DriverError> {
        self.until(&format!("presence of `{css}`"), move || async move {
            driver.find_element(css).await.map(Some)
        })
        .await
    }

    pub async fn visible(
        &self,
        driver: &dyn BrowserDriver,
        css: &str,
    ) -> Result<ElementRef, DriverError> {
        self.until(&format!("visibility of `{css}`"), move || async move {
            let element = driver.find_element(css).await?;
            Ok(driver.is_displayed(&element).await?.then_some(element))
        })
        .await
    }

    pub async fn clickable(
        &self,
        driver: &dyn BrowserDriver,
        css: &str,
    ) -> Result<ElementRef, DriverError> {
        self.until(&format!("`{css}` to be clickable"), move || async move {
            let element = driver.find_element(css).await?;
            let ready = driver.is_displayed(&element).await? && driver.is_enabled(&element).await?;
            Ok(ready.then_some(element))
        })
        .await
    }
}
