use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use tracing::{debug, info, warn};

use slotwatch_core::config::{BrowserConfig, SiteConfig};
use slotwatch_core::domain::booking::PersonalSchedule;
use slotwatch_core::domain::slot::DayTimes;
use slotwatch_core::source::FetchOutcome;

use crate::driver::{BrowserDriver, DriverError};
use crate::enumerate::{CalendarPage, DateCell, DateEnumerator};
use crate::schedule::{date_label, parse_booking_row};
use crate::selectors::SiteSelectors;
use crate::wait::Waiter;

/// Everything a session needs to log in and walk the calendar.
#[derive(Clone, Debug)]
pub struct SessionSettings {
    pub calendar_url: String,
    pub phone: String,
    pub password: SecretString,
    pub max_rounds: u32,
    pub wait_timeout: Duration,
    pub poll_interval: Duration,
    pub selectors: SiteSelectors,
}

impl SessionSettings {
    pub fn from_config(site: &SiteConfig, browser: &BrowserConfig) -> Self {
        Self {
            calendar_url: site.calendar_url.clone(),
            phone: site.phone.clone(),
            password: site.password.clone(),
            max_rounds: browser.max_rounds,
            wait_timeout: Duration::from_secs(browser.wait_timeout_secs),
            poll_interval: Duration::from_millis(browser.poll_interval_ms),
            selectors: SiteSelectors::default(),
        }
    }
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("login failed while trying to {step}: {source}")]
    Auth { step: &'static str, source: DriverError },
    #[error(transparent)]
    Driver(#[from] DriverError),
}

/// One logged-in browser session against the calendar site.
///
/// Dropping a session that was never closed (a cancelled fetch, say) still
/// quits the remote browser from a spawned task.
pub struct RemoteCalendarSession {
    driver: Arc<dyn BrowserDriver>,
    settings: Arc<SessionSettings>,
    waiter: Waiter,
    closed: bool,
}

impl RemoteCalendarSession {
    pub fn new(driver: Box<dyn BrowserDriver>, settings: Arc<SessionSettings>) -> Self {
        let waiter = Waiter::new(settings.wait_timeout, settings.poll_interval);
        Self { driver: Arc::from(driver), settings, waiter, closed: false }
    }

    /// Logs in and opens the scheduling view.
    pub async fn open(&self) -> Result<(), SessionError> {
        let driver = self.driver.as_ref();
        let selectors = &self.settings.selectors;
        let auth = |step: &'static str| move |source| SessionError::Auth { step, source };

        driver.navigate(&self.settings.calendar_url).await.map_err(auth("open the login page"))?;

        let phone = self
            .waiter
            .presence(driver, &selectors.phone_input)
            .await
            .map_err(auth("find the phone field"))?;
        driver.send_keys(&phone, &self.settings.phone).await.map_err(auth("type the phone"))?;

        let password = self
            .waiter
            .presence(driver, &selectors.password_input)
            .await
            .map_err(auth("find the password field"))?;
        driver
            .send_keys(&password, self.settings.password.expose_secret())
            .await
            .map_err(auth("type the password"))?;

        let submit = self
            .waiter
            .clickable(driver, &selectors.submit_button)
            .await
            .map_err(auth("submit the login form"))?;
        driver.click(&submit).await.map_err(auth("submit the login form"))?;

        let link = self
            .waiter
            .clickable(driver, &selectors.schedule_link)
            .await
            .map_err(auth("open the scheduling view"))?;
        driver.click(&link).await.map_err(auth("open the scheduling view"))?;

        info!(event_name = "browser.logged_in", "logged in to the calendar site");
        Ok(())
    }

    pub async fn fetch_availability(&mut self) -> FetchOutcome {
        let enumerator = DateEnumerator::new(self.settings.max_rounds);
        enumerator.run(self).await
    }

    /// Reads the operator's own bookings from the scheduling view.
    pub async fn fetch_personal_schedule(&self) -> Result<PersonalSchedule, SessionError> {
        let driver = self.driver.as_ref();
        let selectors = &self.settings.selectors;

        let table = match self.waiter.presence(driver, &selectors.bookings_table).await {
            Ok(table) => table,
            Err(error) if error.is_timeout() => {
                debug!(event_name = "browser.bookings_missing", "bookings table not rendered");
                return Ok(PersonalSchedule::NoBookings);
            }
            Err(error) => return Err(error.into()),
        };

        let rows = driver.find_child_elements(&table, &selectors.table_row).await?;
        let mut bookings = Vec::new();
        for row in rows.iter().skip(1) {
            let cells = driver.find_child_elements(row, &selectors.table_cell).await?;
            let mut texts = Vec::with_capacity(cells.len());
            for cell in &cells {
                texts.push(driver.text(cell).await?);
            }
            if let Some(booking) = parse_booking_row(&texts) {
                bookings.push(booking);
            }
        }

        Ok(PersonalSchedule::Bookings(bookings))
    }

    /// Ends the browser session.
    pub async fn close(mut self) -> Result<(), DriverError> {
        let result = self.driver.quit().await;
        self.closed = true;
        result
    }
}

impl Drop for RemoteCalendarSession {
    fn drop(&mut self) {
        if self.closed {
            return;
        }

        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!(
                event_name = "browser.session_leaked",
                "session dropped outside a runtime; remote browser left open"
            );
            return;
        };

        info!(event_name = "browser.session_quit_on_drop", "session dropped unclosed; quitting it");
        let driver = Arc::clone(&self.driver);
        runtime.spawn(async move {
            if let Err(error) = driver.quit().await {
                warn!(
                    event_name = "browser.session_close_failed",
                    error = %error,
                    "failed to quit a dropped browser session"
                );
            }
        });
    }
}

#[async_trait]
impl CalendarPage for RemoteCalendarSession {
    async fn open_picker(&mut self) -> Result<(), DriverError> {
        let driver = self.driver.as_ref();
        let selectors = &self.settings.selectors;

        let input = self.waiter.clickable(driver, &selectors.date_input).await?;
        driver.click(&input).await?;
        self.waiter.visible(driver, &selectors.date_picker).await.map(|_| ())
    }

    async fn date_cells(&mut self) -> Result<Vec<DateCell>, DriverError> {
        let driver = self.driver.as_ref();
        let selectors = &self.settings.selectors;

        let picker = self.waiter.presence(driver, &selectors.date_picker).await?;
        let headers = driver.find_child_elements(&picker, &selectors.month_header).await?;
        let month = match headers.first() {
            Some(header) => Some(driver.text(header).await?),
            None => None,
        };
        let elements = driver.find_child_elements(&picker, &selectors.date_cell).await?;

        let mut cells = Vec::with_capacity(elements.len());
        for element in elements {
            let day = driver.text(&element).await?;
            if !day.trim().is_empty() {
                cells.push(DateCell { label: date_label(&day, month.as_deref()), element });
            }
        }
        Ok(cells)
    }

    async fn inspect_date(&mut self, cell: &DateCell) -> Result<DayTimes, DriverError> {
        let driver = self.driver.as_ref();
        let selectors = &self.settings.selectors;

        driver.click(&cell.element).await?;

        let select = match self.waiter.clickable(driver, &selectors.time_select).await {
            Ok(select) => select,
            Err(error) if error.is_timeout() => return Ok(DayTimes::NoTimes),
            Err(error) => return Err(error),
        };
        driver.click(&select).await?;

        match self.waiter.presence(driver, &selectors.loaded_time_option).await {
            Ok(_) => {}
            Err(error) if error.is_timeout() => return Ok(DayTimes::NoTimes),
            Err(error) => return Err(error),
        }

        let options = driver.find_child_elements(&select, &selectors.time_option).await?;
        let mut labels = Vec::with_capacity(options.len());
        for option in &options {
            let value = driver.attribute(option, "value").await?.unwrap_or_default();
            if value.trim().is_empty() {
                continue;
            }
            let text = driver.text(option).await?.trim().to_owned();
            if text != selectors.time_placeholder {
                labels.push(text);
            }
        }

        Ok(DayTimes::from_labels(labels))
    }

    async fn reset(&mut self) -> Result<(), DriverError> {
        let driver = self.driver.as_ref();
        driver.navigate(&self.settings.calendar_url).await?;
        self.waiter.clickable(driver, &self.settings.selectors.date_input).await.map(|_| ())
    }
}
