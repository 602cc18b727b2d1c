//! W3C WebDriver client over plain HTTP (chromedriver, geckodriver, Selenium).

use async_trait::async_trait;
use reqwest::{Client, Method, Response};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use crate::driver::{BrowserDriver, DriverError, ElementRef};

/// Key under which W3C drivers return element references.
pub const ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735466cecf";

/// Chrome flags for running inside containers without a display.
const HEADLESS_CHROME_ARGS: [&str; 4] =
    ["--headless", "--no-sandbox", "--disable-dev-shm-usage", "--disable-gpu"];

#[derive(Clone, Debug)]
pub struct BrowserOptions {
    pub headless: bool,
}

impl BrowserOptions {
    pub fn capabilities(&self) -> Value {
        let args: Vec<&str> = if self.headless {
            HEADLESS_CHROME_ARGS.to_vec()
        } else {
            HEADLESS_CHROME_ARGS.iter().copied().filter(|arg| *arg != "--headless").collect()
        };

        json!({
            "capabilities": {
                "alwaysMatch": {
                    "browserName": "chrome",
                    "goog:chromeOptions": { "args": args }
                }
            }
        })
    }
}

/// Readiness reported by `GET /status`.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct DriverStatus {
    pub ready: bool,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Deserialize)]
struct Envelope {
    value: Value,
}

#[derive(Debug, Deserialize)]
struct W3cError {
    error: String,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct NewSession {
    #[serde(rename = "sessionId")]
    session_id: String,
}

pub struct WebDriverClient {
    http: Client,
    base_url: String,
    session_id: String,
}

impl WebDriverClient {
    /// Starts a new browser session on the driver at `base_url`.
    pub async fn connect(
        http: Client,
        base_url: &str,
        options: &BrowserOptions,
    ) -> Result<Self, DriverError> {
        let base_url = base_url.trim_end_matches('/').to_owned();
        let response = http
            .post(format!("{base_url}/session"))
            .json(&options.capabilities())
            .send()
            .await
            .map_err(|error| DriverError::Http(error.to_string()))?;
        let value = unwrap_response(response).await?;
        let session: NewSession = serde_json::from_value(value).map_err(|error| {
            DriverError::Protocol { error: "invalid new session".to_owned(), message: error.to_string() }
        })?;

        debug!(
            event_name = "browser.session_created",
            session_id = %session.session_id,
            "webdriver session created"
        );
        Ok(Self { http, base_url, session_id: session.session_id })
    }

    async fn command(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<Value, DriverError> {
        let url = format!("{}/session/{}{}", self.base_url, self.session_id, path);
        let mut request = self.http.request(method, url);
        if let Some(body) = body {
            request = request.json(&body);
        }
        let response =
            request.send().await.map_err(|error| DriverError::Http(error.to_string()))?;
        unwrap_response(response).await
    }

    async fn post(&self, path: &str, body: Value) -> Result<Value, DriverError> {
        self.command(Method::POST, path, Some(body)).await
    }

    async fn get(&self, path: &str) -> Result<Value, DriverError> {
        self.command(Method::GET, path, None).await
    }
}

/// Asks the driver whether it can create new sessions.
pub async fn probe_status(http: &Client, base_url: &str) -> Result<DriverStatus, DriverError> {
    let response = http
        .get(format!("{}/status", base_url.trim_end_matches('/')))
        .send()
        .await
        .map_err(|error| DriverError::Http(error.to_string()))?;
    let value = unwrap_response(response).await?;
    serde_json::from_value(value).map_err(|error| DriverError::Protocol {
        error: "invalid status".to_owned(),
        message: error.to_string(),
    })
}

async fn unwrap_response(response: Response) -> Result<Value, DriverError> {
    let status = response.status();
    let envelope: Envelope =
        response.json().await.map_err(|error| DriverError::Http(error.to_string()))?;

    if status.is_success() {
        return Ok(envelope.value);
    }

    match serde_json::from_value::<W3cError>(envelope.value) {
        Ok(failure) => Err(DriverError::from_w3c(&failure.error, &failure.message)),
        Err(_) => Err(DriverError::Http(format!("webdriver answered {status}"))),
    }
}

fn element_from_value(value: &Value) -> Result<ElementRef, DriverError> {
    value.get(ELEMENT_KEY).and_then(Value::as_str).map(ElementRef::new).ok_or_else(|| {
        DriverError::Protocol {
            error: "invalid element reference".to_owned(),
            message: value.to_string(),
        }
    })
}

fn elements_from_value(value: &Value) -> Result<Vec<ElementRef>, DriverError> {
    match value.as_array() {
        Some(items) => items.iter().map(element_from_value).collect(),
        None => Err(DriverError::Protocol {
            error: "invalid element list".to_owned(),
            message: value.to_string(),
        }),
    }
}

fn css(selector: &str) -> Value {
    json!({ "using": "css selector", "value": selector })
}

#[async_trait]
impl BrowserDriver for WebDriverClient {
    async fn navigate(&self, url: &str) -> Result<(), DriverError> {
        self.post("/url", json!({ "url": url })).await.map(|_| ())
    }

    async fn find_element(&self, selector: &str) -> Result<ElementRef, DriverError> {
        let value = self.post("/element", css(selector)).await?;
        element_from_value(&value)
    }

    async fn find_child_elements(
        &self,
        parent: &ElementRef,
        selector: &str,
    ) -> Result<Vec<ElementRef>, DriverError> {
        let value =
            self.post(&format!("/element/{}/elements", parent.as_str()), css(selector)).await?;
        elements_from_value(&value)
    }

    async fn click(&self, element: &ElementRef) -> Result<(), DriverError> {
        self.post(&format!("/element/{}/click", element.as_str()), json!({})).await.map(|_| ())
    }

    async fn send_keys(&self, element: &ElementRef, text: &str) -> Result<(), DriverError> {
        self.post(&format!("/element/{}/value", element.as_str()), json!({ "text": text }))
            .await
            .map(|_| ())
    }

    async fn text(&self, element: &ElementRef) -> Result<String, DriverError> {
        let value = self.get(&format!("/element/{}/text", element.as_str())).await?;
        Ok(value.as_str().unwrap_or_default().to_owned())
    }

    async fn attribute(
        &self,
        element: &ElementRef,
        name: &str,
    ) -> Result<Option<String>, DriverError> {
        let value = self.get(&format!("/element/{}/attribute/{name}", element.as_str())).await?;
        Ok(value.as_str().map(str::to_owned))
    }

    async fn is_displayed(&self, element: &ElementRef) -> Result<bool, DriverError> {
        let value = self.get(&format!("/element/{}/displayed", element.as_str())).await?;
        Ok(value.as_bool().unwrap_or(false))
    }

    async fn is_enabled(&self, element: &ElementRef) -> Result<bool, DriverError> {
        let value = self.get(&format!("/element/{}/enabled", element.as_str())).await?;
        Ok(value.as_bool().unwrap_or(false))
    }

    async fn quit(&self) -> Result<(), DriverError> {
        self.command(Method::DELETE, "", None).await.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{element_from_value, elements_from_value, BrowserOptions, ELEMENT_KEY};
    use crate::driver::{DriverError, ElementRef};

    #[test]
    fn headless_capabilities_carry_container_flags() {
        let caps = BrowserOptions { headless: true }.capabilities();
        let args = &caps["capabilities"]["alwaysMatch"]["goog:chromeOptions"]["args"];

        assert_eq!(
            args,
            &json!(["--headless", "--no-sandbox", "--disable-dev-shm-usage", "--disable-gpu"])
        );
    }

    #[test]
    fn headed_capabilities_drop_only_the_headless_flag() {
        let caps = BrowserOptions { headless: false }.capabilities();
        let args = &caps["capabilities"]["alwaysMatch"]["goog:chromeOptions"]["args"];

        assert_eq!(args, &json!(["--no-sandbox", "--disable-dev-shm-usage", "--disable-gpu"]));
    }

    #[test]
    fn element_references_use_the_w3c_key() {
        let value = json!({ ELEMENT_KEY: "abc-123" });
        assert_eq!(element_from_value(&value), Ok(ElementRef::new("abc-123")));

        let legacy = json!({ "ELEMENT": "abc-123" });
        assert!(matches!(element_from_value(&legacy), Err(DriverError::Protocol { .. })));
    }

    #[test]
    fn element_lists_decode_every_entry() {
        let value = json!([{ ELEMENT_KEY: "a" }, { ELEMENT_KEY: "b" }]);
        assert_eq!(
            elements_from_value(&value),
            Ok(vec![ElementRef::new("a"), ElementRef::new("b")])
        );
        assert_eq!(elements_from_value(&json!([])), Ok(Vec::new()));
    }
}
