//! Fetch/bind controller behind the plugin settings screen.

use crate::envelope::Envelope;
use crate::observe::{EnvelopeCell, EnvelopeReceiver};
use crate::provider::PluginSettingProvider;
use crate::schema::{FormKit, PluginSetting, SettingsPage};
use crate::store::ValueStore;
use serde_json::{Map, Value};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

pub struct SettingsController {
    provider: Arc<dyn PluginSettingProvider>,
    setting: EnvelopeCell<PluginSetting>,
    saved: EnvelopeCell<()>,
}

impl SettingsController {
    pub fn new(provider: Arc<dyn PluginSettingProvider>) -> Self {
        Self {
            provider,
            setting: EnvelopeCell::new(),
            saved: EnvelopeCell::new(),
        }
    }

    pub fn subscribe(&self) -> EnvelopeReceiver<PluginSetting> {
        self.setting.subscribe()
    }

    pub fn subscribe_saved(&self) -> EnvelopeReceiver<()> {
        self.saved.subscribe()
    }

    pub fn current(&self) -> Envelope<PluginSetting> {
        self.setting.current()
    }

    /// Starts loading the settings document of `plugin_name`.
    ///
    /// The envelope drops back to `None` right away; a fetch started later
    /// supersedes this one.
    pub fn fetch_settings(&self, plugin_name: &str) -> JoinHandle<()> {
        let provider = Arc::clone(&self.provider);
        let plugin_name = plugin_name.to_string();
        self.setting.spawn(async move {
            let result = provider.get_plugin_setting(&plugin_name).await;
            match &result {
                Ok(setting) => info!(
                    plugin = %plugin_name,
                    pages = setting.pages.len(),
                    "plugin settings loaded"
                ),
                Err(err) => warn!(plugin = %plugin_name, error = %err, "plugin settings failed"),
            }
            Envelope::from(result)
        })
    }

    /// Writes the values of `page` back to the site.
    pub fn save_settings(
        &self,
        plugin_name: &str,
        page: &SettingsPage,
        store: &ValueStore,
    ) -> JoinHandle<()> {
        let provider = Arc::clone(&self.provider);
        let plugin_name = plugin_name.to_string();
        let group = page.group.clone();
        let values = page_values(page, store);
        self.saved.spawn(async move {
            let result = provider
                .save_plugin_config(&plugin_name, &group, values)
                .await;
            match &result {
                Ok(()) => info!(plugin = %plugin_name, %group, "plugin settings saved"),
                Err(err) => warn!(plugin = %plugin_name, %group, error = %err, "save failed"),
            }
            Envelope::from(result)
        })
    }

    pub fn clear_saved(&self) {
        self.saved.reset();
    }
}

/// Save payload of one page, keyed by field name.
///
/// Unnamed fields and kinds without a control are left out so their stored
/// configuration stays untouched.
pub fn page_values(page: &SettingsPage, store: &ValueStore) -> Map<String, Value> {
    page.fields
        .iter()
        .enumerate()
        .filter(|(_, field)| !field.name.is_empty() && field.kind != FormKit::Unknown)
        .map(|(index, field)| (field.name.clone(), field.json_value(store.get(index))))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HaloError;
    use crate::schema::FormField;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::time::Duration;

    enum Reply {
        Setting(PluginSetting),
        Fail(fn() -> HaloError),
    }

    struct FakeSite {
        reply: Reply,
        delay: Duration,
        saved: Mutex<Vec<(String, String, Map<String, Value>)>>,
    }

    impl FakeSite {
        fn new(reply: Reply) -> Self {
            Self {
                reply,
                delay: Duration::ZERO,
                saved: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl PluginSettingProvider for FakeSite {
        async fn get_plugin_setting(&self, name: &str) -> Result<PluginSetting, HaloError> {
            tokio::time::sleep(self.delay).await;
            match &self.reply {
                Reply::Setting(setting) => Ok(PluginSetting {
                    name: name.to_string(),
                    ..setting.clone()
                }),
                Reply::Fail(err) => Err(err()),
            }
        }

        async fn save_plugin_config(
            &self,
            name: &str,
            group: &str,
            values: Map<String, Value>,
        ) -> Result<(), HaloError> {
            self.saved
                .lock()
                .expect("saved lock")
                .push((name.to_string(), group.to_string(), values));
            Ok(())
        }
    }

    fn sample_setting() -> PluginSetting {
        PluginSetting {
            name: String::new(),
            pages: vec![SettingsPage::new(
                "basic",
                "Basic",
                vec![
                    FormField::text("Title", "a").with_name("title"),
                    FormField::select("Enabled", "0", &[("On", "1"), ("Off", "0")])
                        .with_name("enabled"),
                    FormField::text("Extra", "true")
                        .with_kind(FormKit::Unknown)
                        .with_name("extra"),
                    FormField::text("Unnamed", "x"),
                ],
            )],
        }
    }

    #[tokio::test]
    async fn test_fetch_success() {
        let controller =
            SettingsController::new(Arc::new(FakeSite::new(Reply::Setting(sample_setting()))));
        let mut rx = controller.subscribe();
        assert!(rx.current().is_none());

        controller.fetch_settings("sitemap");
        let envelope = rx.settled().await;
        let setting = envelope.data().expect("success");
        assert_eq!(setting.name, "sitemap");
        assert_eq!(setting.pages[0].fields.len(), 4);
    }

    #[tokio::test]
    async fn test_fetch_timeout_is_failure() {
        let controller =
            SettingsController::new(Arc::new(FakeSite::new(Reply::Fail(|| HaloError::Timeout))));
        let mut rx = controller.subscribe();
        controller.fetch_settings("sitemap");

        let envelope = rx.settled().await;
        assert!(envelope.is_failure());
        assert_eq!(envelope.error(), Some("timeout"));
    }

    #[tokio::test]
    async fn test_fetch_never_stays_none() {
        let replies = [
            Reply::Setting(sample_setting()),
            Reply::Setting(PluginSetting::default()),
            Reply::Fail(|| HaloError::EmptyBody),
            Reply::Fail(|| HaloError::Http("connection reset".to_string())),
        ];
        for reply in replies {
            let controller = SettingsController::new(Arc::new(FakeSite::new(reply)));
            let mut rx = controller.subscribe();
            controller.fetch_settings("any").await.expect("fetch task");
            let envelope = rx.current();
            assert!(envelope.is_success() || envelope.is_failure());
        }
    }

    #[tokio::test]
    async fn test_refetch_resets_to_none() {
        let mut site = FakeSite::new(Reply::Setting(sample_setting()));
        site.delay = Duration::from_millis(50);
        let controller = SettingsController::new(Arc::new(site));

        controller.fetch_settings("a").await.expect("first fetch");
        assert!(controller.current().is_success());

        let pending = controller.fetch_settings("b");
        assert!(controller.current().is_none());
        pending.await.expect("second fetch");
        assert_eq!(
            controller.current().data().map(|s| s.name.as_str()),
            Some("b")
        );
    }

    #[test]
    fn test_page_values_skip_unnamed_and_unknown() {
        let setting = sample_setting();
        let page = &setting.pages[0];
        let mut store = ValueStore::new();
        store.replace_all(page.initial_values());
        store.set(1, "1");

        let values = page_values(page, &store);
        assert_eq!(values.len(), 2);
        assert_eq!(values["title"], "a");
        assert_eq!(values["enabled"], "1");
    }

    #[test]
    fn test_page_values_keep_json_types() {
        let mut setting = PluginSetting {
            name: String::new(),
            pages: vec![SettingsPage::new(
                "basic",
                "Basic",
                vec![
                    FormField::text("Count", "10").with_name("count"),
                    FormField::text("Title", "a").with_name("title"),
                ],
            )],
        };
        let mut config = Map::new();
        config.insert(
            "basic".to_string(),
            serde_json::json!({ "count": 10, "title": "b" }),
        );
        setting.apply_config(&config);

        let page = &setting.pages[0];
        let mut store = ValueStore::new();
        store.replace_all(page.initial_values());
        store.set(0, "12");

        let values = page_values(page, &store);
        assert_eq!(values["count"], serde_json::json!(12));
        assert_eq!(values["title"], Value::String("b".into()));
    }

    #[tokio::test]
    async fn test_save_settings() {
        let site = Arc::new(FakeSite::new(Reply::Setting(sample_setting())));
        let controller = SettingsController::new(site.clone());
        let mut saved = controller.subscribe_saved();

        let setting = sample_setting();
        let mut store = ValueStore::new();
        store.replace_all(setting.pages[0].initial_values());
        controller.save_settings("sitemap", &setting.pages[0], &store);

        assert_eq!(saved.settled().await, Envelope::Success(()));
        let calls = site.saved.lock().expect("saved lock");
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "sitemap");
        assert_eq!(calls[0].1, "basic");
    }
}
