use async_trait::async_trait;
use thiserror::Error;

/// Opaque handle to an element inside the current page.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ElementRef(pub String);

impl ElementRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DriverError {
    #[error("timed out after {timeout_ms}ms waiting for {what}")]
    Timeout { what: String, timeout_ms: u64 },
    #[error("element is no longer attached to the page")]
    StaleElement,
    #[error("no such element: {0}")]
    NoSuchElement(String),
    #[error("element not interactable: {0}")]
    NotInteractable(String),
    #[error("webdriver session is gone: {0}")]
    InvalidSession(String),
    #[error("webdriver error `{error}`: {message}")]
    Protocol { error: String, message: String },
    #[error("webdriver transport failed: {0}")]
    Http(String),
}

impl DriverError {
    /// Errors a bounded wait keeps polling through.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::StaleElement | Self::NoSuchElement(_) | Self::NotInteractable(_))
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// Maps a W3C error code (the `value.error` field of a failed command).
    pub fn from_w3c(error: &str, message: &str) -> Self {
        match error {
            "stale element reference" => Self::StaleElement,
            "no such element" => Self::NoSuchElement(message.to_owned()),
            "element not interactable" | "element click intercepted" => {
                Self::NotInteractable(message.to_owned())
            }
            "invalid session id" | "session not created" => {
                Self::InvalidSession(message.to_owned())
            }
            "timeout" | "script timeout" => {
                Self::Timeout { what: message.to_owned(), timeout_ms: 0 }
            }
            other => Self::Protocol { error: other.to_owned(), message: message.to_owned() },
        }
    }
}

/// Minimal browser automation surface the calendar session needs. Selectors are
/// CSS selectors.
#[async_trait]
pub trait BrowserDriver: Send + Sync {
    async fn navigate(&self, url: &str) -> Result<(), DriverError>;
    async fn find_element(&self, css: &str) -> Result<ElementRef, DriverError>;
    async fn find_child_elements(
        &self,
        parent: &ElementRef,
        css: &str,
    ) -> Result<Vec<ElementRef>, DriverError>;
    async fn click(&self, element: &ElementRef) -> Result<(), DriverError>;
    async fn send_keys(&self, element: &ElementRef, text: &str) -> Result<(), DriverError>;
    async fn text(&self, element: &ElementRef) -> Result<String, DriverError>;
    async fn attribute(
        &self,
        element: &ElementRef,
        name: &str,
    ) -> Result<Option<String>, DriverError>;
    async fn is_displayed(&self, element: &ElementRef) -> Result<bool, DriverError>;
    async fn is_enabled(&self, element: &ElementRef) -> Result<bool, DriverError>;
    /// Ends the browser session. Further calls fail with `InvalidSession`.
    async fn quit(&self) -> Result<(), DriverError>;
}
