//! # Kalo Core Library
//!
//! Everything the Kalo terminal client does that does not depend on the
//! terminal: talking to a Halo site, publishing request outcomes, and the
//! state behind the dynamic plugin settings form.
//!
//! ## Modules
//!
//! - `envelope`: three-state outcome of a request
//! - `observe`: single-slot watch cell that publishes envelopes
//! - `schema`: plugin settings documents and their fields
//! - `store`: live values of the active settings page
//! - `form`: tab, focus and dropdown state of the settings form
//! - `controller`: fetches and saves plugin settings
//! - `client`: Halo console API over HTTP
//! - `login`, `plugins`: the other two screens' controllers
//! - `settings`: application configuration management
//! - `theme`: UI theming system

pub mod client;
pub mod controller;
pub mod envelope;
pub mod error;
pub mod form;
pub mod logging;
pub mod login;
pub mod observe;
pub mod plugins;
pub mod provider;
pub mod schema;
pub mod settings;
pub mod store;
pub mod theme;

#[cfg(test)]
mod tests {
    use crate::controller::SettingsController;
    use crate::error::HaloError;
    use crate::form::SettingsForm;
    use crate::provider::PluginSettingProvider;
    use crate::schema::{FormField, PluginSetting, SettingsPage};
    use async_trait::async_trait;
    use serde_json::{Map, Value};
    use std::sync::Arc;

    struct OneSetting(PluginSetting);

    #[async_trait]
    impl PluginSettingProvider for OneSetting {
        async fn get_plugin_setting(&self, _name: &str) -> Result<PluginSetting, HaloError> {
            Ok(self.0.clone())
        }

        async fn save_plugin_config(
            &self,
            _name: &str,
            _group: &str,
            _values: Map<String, Value>,
        ) -> Result<(), HaloError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_fetch_then_bind_then_select() {
        let setting = PluginSetting {
            name: "sitemap".to_string(),
            pages: vec![SettingsPage::new(
                "basic",
                "Basic",
                vec![
                    FormField::text("Title", "a"),
                    FormField::select("Enabled", "0", &[("On", "1"), ("Off", "0")]),
                ],
            )],
        };
        let controller = SettingsController::new(Arc::new(OneSetting(setting)));
        let mut rx = controller.subscribe();
        controller.fetch_settings("sitemap");

        let envelope = rx.settled().await;
        let mut form = SettingsForm::new(envelope.data().cloned().expect("fetched"));
        assert_eq!(form.store().values(), ["a", "0"]);

        form.choose_option(1, 0);
        assert_eq!(form.store().values(), ["a", "1"]);
    }

    #[tokio::test]
    async fn test_zero_pages_is_success() {
        let controller = SettingsController::new(Arc::new(OneSetting(PluginSetting::default())));
        let mut rx = controller.subscribe();
        controller.fetch_settings("bare");

        let envelope = rx.settled().await;
        assert!(envelope.is_success());
        assert!(envelope.data().map(PluginSetting::is_empty).unwrap_or(false));
    }
}
