//! In-memory stand-in for a WebDriver session over a tiny model of the site.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;

use crate::driver::{BrowserDriver, DriverError, ElementRef};
use crate::selectors::SiteSelectors;
use crate::session::SessionSettings;

pub const PLACEHOLDER: &str = "Выберите время";

pub fn test_settings() -> SessionSettings {
    SessionSettings {
        calendar_url: "https://calendar.test/driving-record".to_owned(),
        phone: "+70000000000".to_owned(),
        password: "secret".to_owned().into(),
        max_rounds: 10,
        wait_timeout: Duration::from_millis(30),
        poll_interval: Duration::from_millis(2),
        selectors: SiteSelectors::default(),
    }
}

#[derive(Clone, Debug)]
pub struct FakeSite {
    pub login_form: bool,
    pub schedule_link: bool,
    /// Date label with its `(value, text)` time options.
    pub dates: Vec<(String, Vec<(&'static str, &'static str)>)>,
    /// Bookings table rows (header included) as cell texts; `None` renders no table.
    pub bookings: Option<Vec<Vec<String>>>,
    /// Picker header text; `None` renders no month header.
    pub month: Option<&'static str>,
    /// Navigation never completes, like a hung remote browser.
    pub stall_navigation: bool,
}

impl FakeSite {
    pub fn logged_out() -> Self {
        Self {
            login_form: true,
            schedule_link: true,
            dates: Vec::new(),
            bookings: None,
            month: None,
            stall_navigation: false,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct FakeState {
    pub typed: Vec<(String, String)>,
    pub clicks: Vec<String>,
    pub navigations: Vec<String>,
    pub quits: usize,
    picker_open: bool,
    selected_date: Option<String>,
}

pub struct FakeDriver {
    site: FakeSite,
    selectors: SiteSelectors,
    state: Mutex<FakeState>,
}

impl FakeDriver {
    pub fn new(site: FakeSite) -> Self {
        Self { site, selectors: SiteSelectors::default(), state: Mutex::new(FakeState::default()) }
    }

    pub fn state(&self) -> FakeState {
        self.lock().clone()
    }

    fn lock(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn selected_options(&self) -> Vec<(&'static str, &'static str)> {
        let state = self.lock();
        state
            .selected_date
            .as_ref()
            .and_then(|label| self.site.dates.iter().find(|(date, _)| date == label))
            .map(|(_, options)| options.clone())
            .unwrap_or_default()
    }

    fn is_present(&self, css: &str) -> bool {
        let s = &self.selectors;
        if css == s.phone_input || css == s.password_input || css == s.submit_button {
            self.site.login_form
        } else if css == s.schedule_link {
            self.site.schedule_link
        } else if css == s.date_input {
            true
        } else if css == s.date_picker {
            self.lock().picker_open
        } else if css == s.time_select {
            !self.selected_options().is_empty()
        } else if css == s.loaded_time_option {
            self.selected_options().iter().any(|(value, _)| !value.is_empty())
        } else if css == s.bookings_table {
            self.site.bookings.is_some()
        } else {
            false
        }
    }

    fn index(id: &str, prefix: &str) -> Option<usize> {
        id.strip_prefix(prefix).and_then(|rest| rest.parse().ok())
    }

    fn cell_text(&self, id: &str) -> Option<String> {
        let (row, col) = id.strip_prefix("cell:")?.split_once(':')?;
        let (row, col): (usize, usize) = (row.parse().ok()?, col.parse().ok()?);
        self.site.bookings.as_ref()?.get(row)?.get(col).cloned()
    }
}

#[async_trait]
impl BrowserDriver for Arc<FakeDriver> {
    async fn navigate(&self, url: &str) -> Result<(), DriverError> {
        if self.site.stall_navigation {
            std::future::pending::<()>().await;
        }
        let mut state = self.lock();
        state.navigations.push(url.to_owned());
        state.picker_open = false;
        state.selected_date = None;
        Ok(())
    }

    async fn find_element(&self, css: &str) -> Result<ElementRef, DriverError> {
        if self.is_present(css) {
            Ok(ElementRef::new(css))
        } else {
            Err(DriverError::NoSuchElement(css.to_owned()))
        }
    }

    async fn find_child_elements(
        &self,
        parent: &ElementRef,
        css: &str,
    ) -> Result<Vec<ElementRef>, DriverError> {
        let s = &self.selectors;
        let ids: Vec<String> = if parent.as_str() == s.date_picker && css == s.date_cell {
            self.site.dates.iter().map(|(label, _)| format!("date:{label}")).collect()
        } else if parent.as_str() == s.date_picker && css == s.month_header {
            self.site.month.map(|_| "month".to_owned()).into_iter().collect()
        } else if parent.as_str() == s.time_select && css == s.time_option {
            (0..self.selected_options().len()).map(|i| format!("option:{i}")).collect()
        } else if parent.as_str() == s.bookings_table && css == s.table_row {
            let rows = self.site.bookings.as_ref().map_or(0, Vec::len);
            (0..rows).map(|i| format!("row:{i}")).collect()
        } else if let Some(row) = FakeDriver::index(parent.as_str(), "row:") {
            let cols =
                self.site.bookings.as_ref().and_then(|rows| rows.get(row)).map_or(0, Vec::len);
            (0..cols).map(|col| format!("cell:{row}:{col}")).collect()
        } else {
            Vec::new()
        };
        Ok(ids.into_iter().map(ElementRef::new).collect())
    }

    async fn click(&self, element: &ElementRef) -> Result<(), DriverError> {
        let mut state = self.lock();
        let id = element.as_str();
        if id == self.selectors.date_input {
            state.picker_open = true;
        } else if let Some(label) = id.strip_prefix("date:") {
            state.selected_date = Some(label.to_owned());
            state.picker_open = false;
        } else if id != self.selectors.time_select {
            state.clicks.push(id.to_owned());
        }
        Ok(())
    }

    async fn send_keys(&self, element: &ElementRef, text: &str) -> Result<(), DriverError> {
        self.lock().typed.push((element.as_str().to_owned(), text.to_owned()));
        Ok(())
    }

    async fn text(&self, element: &ElementRef) -> Result<String, DriverError> {
        let id = element.as_str();
        if let Some(label) = id.strip_prefix("date:") {
            return Ok(label.to_owned());
        }
        if id == "month" {
            return Ok(self.site.month.unwrap_or_default().to_owned());
        }
        if let Some(i) = FakeDriver::index(id, "option:") {
            let options = self.selected_options();
            return Ok(options.get(i).map(|(_, text)| (*text).to_owned()).unwrap_or_default());
        }
        self.cell_text(id).ok_or_else(|| DriverError::NoSuchElement(id.to_owned()))
    }

    async fn attribute(
        &self,
        element: &ElementRef,
        name: &str,
    ) -> Result<Option<String>, DriverError> {
        match (FakeDriver::index(element.as_str(), "option:"), name) {
            (Some(i), "value") => {
                Ok(self.selected_options().get(i).map(|(value, _)| (*value).to_owned()))
            }
            _ => Ok(None),
        }
    }

    async fn is_displayed(&self, _element: &ElementRef) -> Result<bool, DriverError> {
        Ok(true)
    }

    async fn is_enabled(&self, _element: &ElementRef) -> Result<bool, DriverError> {
        Ok(true)
    }

    async fn quit(&self) -> Result<(), DriverError> {
        self.lock().quits += 1;
        Ok(())
    }
}
