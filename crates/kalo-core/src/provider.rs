//! Seams between the controllers and the Halo site.
//!
//! [`HaloClient`](crate::client::HaloClient) implements all of them; tests
//! substitute in-memory fakes.

use crate::error::HaloError;
use crate::login::User;
use crate::plugins::Plugin;
use crate::schema::PluginSetting;
use async_trait::async_trait;
use serde_json::{Map, Value};

#[async_trait]
pub trait PluginSettingProvider: Send + Sync {
    async fn get_plugin_setting(&self, name: &str) -> Result<PluginSetting, HaloError>;

    /// Stores `values` as the configuration of one settings group.
    async fn save_plugin_config(
        &self,
        name: &str,
        group: &str,
        values: Map<String, Value>,
    ) -> Result<(), HaloError>;
}

#[async_trait]
pub trait PluginListProvider: Send + Sync {
    async fn list_plugins(&self) -> Result<Vec<Plugin>, HaloError>;
}

#[async_trait]
pub trait LoginProvider: Send + Sync {
    /// Fetches the signed-in user, which doubles as the credentials check.
    async fn current_user(&self) -> Result<User, HaloError>;
}
