use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{info, warn};

use slotwatch_core::config::AppConfig;
use slotwatch_core::domain::booking::PersonalSchedule;
use slotwatch_core::errors::SourceError;
use slotwatch_core::source::{FetchOutcome, ScheduleSource};

use crate::driver::{BrowserDriver, DriverError};
use crate::session::{RemoteCalendarSession, SessionSettings};
use crate::webdriver::{BrowserOptions, WebDriverClient};

/// Creates fresh browser sessions.
#[async_trait]
pub trait DriverConnector: Send + Sync {
    async fn connect(&self) -> Result<Box<dyn BrowserDriver>, DriverError>;
}

pub struct WebDriverConnector {
    http: Client,
    webdriver_url: String,
    options: BrowserOptions,
}

impl WebDriverConnector {
    pub fn new(http: Client, webdriver_url: impl Into<String>, options: BrowserOptions) -> Self {
        Self { http, webdriver_url: webdriver_url.into(), options }
    }
}

#[async_trait]
impl DriverConnector for WebDriverConnector {
    async fn connect(&self) -> Result<Box<dyn BrowserDriver>, DriverError> {
        let client =
            WebDriverClient::connect(self.http.clone(), &self.webdriver_url, &self.options).await?;
        Ok(Box::new(client))
    }
}

/// [`ScheduleSource`] backed by a real browser. Every call gets its own
/// session, which is closed on every exit path, cancellation included.
pub struct BrowserScheduleSource {
    connector: Arc<dyn DriverConnector>,
    settings: Arc<SessionSettings>,
}

impl BrowserScheduleSource {
    pub fn new(connector: Arc<dyn DriverConnector>, settings: SessionSettings) -> Self {
        Self { connector, settings: Arc::new(settings) }
    }

    pub fn from_config(config: &AppConfig, http: Client) -> Self {
        let connector = WebDriverConnector::new(
            http,
            config.browser.webdriver_url.clone(),
            BrowserOptions { headless: config.browser.headless },
        );
        Self::new(Arc::new(connector), SessionSettings::from_config(&config.site, &config.browser))
    }

    async fn start(&self) -> Result<RemoteCalendarSession, SourceError> {
        let driver =
            self.connector.connect().await.map_err(|error| SourceError::Session(error.to_string()))?;
        let session = RemoteCalendarSession::new(driver, Arc::clone(&self.settings));

        match session.open().await {
            Ok(()) => Ok(session),
            Err(error) => {
                release(session).await;
                Err(SourceError::Auth(error.to_string()))
            }
        }
    }
}

async fn release(session: RemoteCalendarSession) {
    if let Err(error) = session.close().await {
        warn!(
            event_name = "browser.session_close_failed",
            error = %error,
            "failed to close browser session"
        );
    }
}

#[async_trait]
impl ScheduleSource for BrowserScheduleSource {
    async fn fetch_availability(&self) -> Result<FetchOutcome, SourceError> {
        let mut session = self.start().await?;
        let outcome = session.fetch_availability().await;
        release(session).await;

        info!(
            event_name = "browser.availability_fetched",
            termination = outcome.termination.as_str(),
            dates_checked = outcome.snapshot.dates_checked(),
            slots = outcome.snapshot.slot_count(),
            "availability fetched"
        );
        Ok(outcome)
    }

    async fn fetch_personal_schedule(&self) -> Result<PersonalSchedule, SourceError> {
        let session = self.start().await?;
        let result = session.fetch_personal_schedule().await;
        release(session).await;

        result.map_err(|error| SourceError::Remote(error.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;

    use slotwatch_core::errors::SourceError;
    use slotwatch_core::source::{ScheduleSource, Termination};

    use super::{BrowserScheduleSource, DriverConnector};
    use crate::driver::{BrowserDriver, DriverError};
    use crate::testing::{test_settings, FakeDriver, FakeSite};

    struct FakeConnector {
        driver: Option<Arc<FakeDriver>>,
        connects: AtomicUsize,
    }

    #[async_trait]
    impl DriverConnector for FakeConnector {
        async fn connect(&self) -> Result<Box<dyn BrowserDriver>, DriverError> {
            self.connects.fetch_add(1, Ordering::SeqCst);
            match &self.driver {
                Some(driver) => Ok(Box::new(Arc::clone(driver))),
                None => Err(DriverError::Http("connection refused".to_owned())),
            }
        }
    }

    fn source(site: Option<FakeSite>) -> (BrowserScheduleSource, Option<Arc<FakeDriver>>) {
        let driver = site.map(|site| Arc::new(FakeDriver::new(site)));
        let connector = FakeConnector { driver: driver.clone(), connects: AtomicUsize::new(0) };
        (BrowserScheduleSource::new(Arc::new(connector), test_settings()), driver)
    }

    #[tokio::test]
    async fn successful_fetch_closes_its_session() {
        let site = FakeSite {
            dates: vec![("12".to_owned(), vec![("10:00", "10:00")])],
            ..FakeSite::logged_out()
        };
        let (source, driver) = source(Some(site));
        let driver = driver.expect("driver");

        let outcome = source.fetch_availability().await.expect("fetch");

        assert_eq!(outcome.termination, Termination::AllDatesChecked);
        assert_eq!(outcome.snapshot.slot_count(), 1);
        assert_eq!(driver.state().quits, 1);
    }

    #[tokio::test]
    async fn failed_login_still_closes_the_session() {
        let (source, driver) = source(Some(FakeSite { login_form: false, ..FakeSite::logged_out() }));
        let driver = driver.expect("driver");

        let error = source.fetch_availability().await.expect_err("login fails");

        assert_eq!(error.class(), "auth");
        assert_eq!(driver.state().quits, 1);
    }

    #[tokio::test]
    async fn cancelled_fetch_still_quits_the_browser() {
        let site = FakeSite { stall_navigation: true, ..FakeSite::logged_out() };
        let (source, driver) = source(Some(site));
        let driver = driver.expect("driver");

        let cancelled =
            tokio::time::timeout(Duration::from_millis(50), source.fetch_availability()).await;
        assert!(cancelled.is_err(), "fetch stalls in login");
        tokio::time::sleep(Duration::from_millis(5)).await;

        assert_eq!(driver.state().quits, 1);
    }

    #[tokio::test]
    async fn unreachable_driver_is_a_session_error() {
        let (source, _) = source(None);

        let error = source.fetch_personal_schedule().await.expect_err("no driver");

        assert!(matches!(error, SourceError::Session(ref message) if message.contains("refused")));
    }

    #[tokio::test]
    async fn personal_schedule_closes_its_session() {
        let (source, driver) = source(Some(FakeSite::logged_out()));
        let driver = driver.expect("driver");

        source.fetch_personal_schedule().await.expect("schedule");

        assert_eq!(driver.state().quits, 1);
    }
}
