use crate::envelope::Envelope;
use crate::observe::{EnvelopeCell, EnvelopeReceiver};
use crate::provider::PluginListProvider;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// An installed plugin as listed by the console API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plugin {
    pub name: String,
    pub display_name: String,
    pub description: String,
    pub version: String,
    pub author: String,
    pub enabled: bool,
    pub setting_name: String,
    pub phase: String,
    pub created: Option<DateTime<Utc>>,
}

impl Plugin {
    /// Character shown in place of the plugin logo.
    pub fn avatar(&self) -> char {
        self.title()
            .chars()
            .next()
            .map(|ch| ch.to_uppercase().next().unwrap_or(ch))
            .unwrap_or('?')
    }

    pub fn title(&self) -> &str {
        if self.display_name.is_empty() {
            &self.name
        } else {
            &self.display_name
        }
    }

    pub fn has_settings(&self) -> bool {
        !self.setting_name.is_empty()
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct PluginListRaw {
    #[serde(default)]
    items: Vec<PluginRaw>,
}

#[derive(Debug, Deserialize)]
struct PluginRaw {
    metadata: PluginMetadataRaw,
    #[serde(default)]
    spec: PluginSpecRaw,
    #[serde(default)]
    status: PluginStatusRaw,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PluginMetadataRaw {
    name: String,
    #[serde(default)]
    creation_timestamp: Option<DateTime<Utc>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PluginSpecRaw {
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    version: Option<String>,
    #[serde(default)]
    author: Option<AuthorRaw>,
    #[serde(default)]
    enabled: bool,
    #[serde(default)]
    setting_name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct AuthorRaw {
    #[serde(default)]
    name: String,
}

#[derive(Debug, Default, Deserialize)]
struct PluginStatusRaw {
    #[serde(default)]
    phase: Option<String>,
}

impl PluginListRaw {
    pub(crate) fn into_plugins(self) -> Vec<Plugin> {
        let mut plugins: Vec<Plugin> = self
            .items
            .into_iter()
            .map(|raw| Plugin {
                name: raw.metadata.name,
                display_name: raw.spec.display_name.unwrap_or_default(),
                description: raw
                    .spec
                    .description
                    .unwrap_or_else(|| "No description available".to_string()),
                version: raw.spec.version.unwrap_or_default(),
                author: raw.spec.author.map(|author| author.name).unwrap_or_default(),
                enabled: raw.spec.enabled,
                setting_name: raw.spec.setting_name.unwrap_or_default(),
                phase: raw.status.phase.unwrap_or_default(),
                created: raw.metadata.creation_timestamp,
            })
            .collect();

        // Enabled plugins first, then by name
        plugins.sort_by(|a, b| {
            b.enabled
                .cmp(&a.enabled)
                .then_with(|| a.title().to_lowercase().cmp(&b.title().to_lowercase()))
        });
        plugins
    }
}

/// Fetches the plugin list and publishes it for the list screen.
pub struct PluginListController {
    provider: Arc<dyn PluginListProvider>,
    plugins: EnvelopeCell<Vec<Plugin>>,
}

impl PluginListController {
    pub fn new(provider: Arc<dyn PluginListProvider>) -> Self {
        Self {
            provider,
            plugins: EnvelopeCell::new(),
        }
    }

    pub fn subscribe(&self) -> EnvelopeReceiver<Vec<Plugin>> {
        self.plugins.subscribe()
    }

    pub fn fetch_plugins(&self) -> JoinHandle<()> {
        let provider = Arc::clone(&self.provider);
        self.plugins.spawn(async move {
            let result = provider.list_plugins().await;
            match &result {
                Ok(plugins) => info!(count = plugins.len(), "plugin list loaded"),
                Err(err) => warn!(error = %err, "plugin list failed"),
            }
            Envelope::from(result)
        })
    }
}
