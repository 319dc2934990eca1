use crate::error::HaloError;
use crate::login::User;
use crate::plugins::{Plugin, PluginListRaw};
use crate::provider::{LoginProvider, PluginListProvider, PluginSettingProvider};
use crate::schema::{PluginSetting, PluginSettingRaw};
use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

const CONSOLE_API: [&str; 3] = ["apis", "api.console.halo.run", "v1alpha1"];

/// Halo's problem-detail error body.
#[derive(Debug, Default, Deserialize)]
pub struct ErrorResponse {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub title: Option<String>,
    pub status: Option<u16>,
    pub detail: Option<String>,
    pub instance: Option<String>,
}

impl ErrorResponse {
    fn message(self) -> Option<String> {
        self.detail
            .filter(|detail| !detail.is_empty())
            .or(self.title.filter(|title| !title.is_empty()))
    }
}

/// Returns the parsed address when `site` is an absolute http(s) URL.
pub fn parse_site_url(site: &str) -> Option<Url> {
    let url = Url::parse(site.trim()).ok()?;
    match url.scheme() {
        "http" | "https" if url.has_host() => Some(url),
        _ => None,
    }
}

/// Console API client for one Halo site and account.
pub struct HaloClient {
    client: Client,
    base: Url,
    username: String,
    password: String,
}

impl HaloClient {
    pub fn new(
        site: &str,
        username: &str,
        password: &str,
        timeout: Duration,
    ) -> Result<Self, HaloError> {
        let base = parse_site_url(site).ok_or_else(|| HaloError::InvalidUrl(site.to_string()))?;
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base,
            username: username.to_string(),
            password: password.to_string(),
        })
    }

    pub fn site(&self) -> &Url {
        &self.base
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, HaloError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| HaloError::InvalidUrl(self.base.to_string()))?
            .pop_if_empty()
            .extend(CONSOLE_API)
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        debug!(%method, %url, "halo request");
        self.client
            .request(method, url)
            .basic_auth(&self.username, Some(&self.password))
    }

    async fn get<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T, HaloError> {
        let url = self.endpoint(segments)?;
        let response = self.request(Method::GET, url).send().await?;
        decode(response).await
    }

    /// Stored configuration of a plugin, keyed by settings group. A plugin
    /// that has never been configured yields an empty map.
    pub async fn plugin_config(&self, name: &str) -> Result<Map<String, Value>, HaloError> {
        match self.get::<Value>(&["plugins", name, "json-config"]).await {
            Ok(Value::Object(config)) => Ok(config),
            Ok(_) | Err(HaloError::EmptyBody) => Ok(Map::new()),
            Err(HaloError::Api { status, .. }) if status == StatusCode::NOT_FOUND => {
                Ok(Map::new())
            }
            Err(err) => Err(err),
        }
    }
}

/// Unwraps a Halo response: a 2xx body is decoded, anything else is turned
/// into a message taken from the problem-detail body.
pub(crate) async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, HaloError> {
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        let message = serde_json::from_str::<ErrorResponse>(&body)
            .ok()
            .and_then(ErrorResponse::message)
            .unwrap_or_else(|| format!("unknown error (HTTP {})", status.as_u16()));
        warn!(%status, %message, "halo request failed");
        return Err(HaloError::Api { status, message });
    }

    let trimmed = body.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Err(HaloError::EmptyBody);
    }
    Ok(serde_json::from_str(trimmed)?)
}

async fn expect_success(response: Response) -> Result<(), HaloError> {
    match decode::<Value>(response).await {
        Ok(_) | Err(HaloError::EmptyBody) => Ok(()),
        Err(err) => Err(err),
    }
}

#[async_trait]
impl PluginSettingProvider for HaloClient {
    async fn get_plugin_setting(&self, name: &str) -> Result<PluginSetting, HaloError> {
        let raw: PluginSettingRaw = self.get(&["plugins", name, "setting"]).await?;
        let mut setting = PluginSetting::from(raw);
        if !setting.is_empty() {
            setting.apply_config(&self.plugin_config(name).await?);
        }
        Ok(setting)
    }

    async fn save_plugin_config(
        &self,
        name: &str,
        group: &str,
        values: Map<String, Value>,
    ) -> Result<(), HaloError> {
        // The endpoint replaces the whole document, so everything this form
        // does not edit is carried over from the current one.
        let mut config = self.plugin_config(name).await?;
        let entry = config
            .entry(group.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        match entry {
            Value::Object(existing) => existing.extend(values),
            other => *other = Value::Object(values),
        }

        let url = self.endpoint(&["plugins", name, "json-config"])?;
        let response = self.request(Method::PUT, url).json(&config).send().await?;
        expect_success(response).await
    }
}

#[async_trait]
impl PluginListProvider for HaloClient {
    async fn list_plugins(&self) -> Result<Vec<Plugin>, HaloError> {
        let url = {
            let mut url = self.endpoint(&["plugins"])?;
            url.query_pairs_mut()
                .append_pair("page", "0")
                .append_pair("size", "0");
            url
        };
        let response = self.request(Method::GET, url).send().await?;
        let raw: PluginListRaw = decode(response).await?;
        Ok(raw.into_plugins())
    }
}

#[async_trait]
impl LoginProvider for HaloClient {
    async fn current_user(&self) -> Result<User, HaloError> {
        self.get(&["users", "-"]).await
    }
}
