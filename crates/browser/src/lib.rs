//! Browser automation against the driving-school calendar site.
//!
//! [`BrowserScheduleSource`] is the entry point: it opens a WebDriver session
//! per call, logs in, walks the date picker and always closes the session.

pub mod driver;
pub mod enumerate;
pub mod schedule;
pub mod selectors;
pub mod session;
pub mod source;
pub mod wait;
pub mod webdriver;

#[cfg(test)]
pub(crate) mod testing;

pub use driver::{BrowserDriver, DriverError, ElementRef};
pub use enumerate::{CalendarPage, DateCell, DateEnumerator};
pub use selectors::SiteSelectors;
pub use session::{RemoteCalendarSession, SessionError, SessionSettings};
pub use source::{BrowserScheduleSource, DriverConnector, WebDriverConnector};
pub use wait::Waiter;
pub use webdriver::{probe_status, BrowserOptions, DriverStatus, WebDriverClient};
