use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use strum::{AsRefStr, Display};

/// Input kind of a settings field, read from the schema's `$formkit` tag.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum FormKit {
    Text,
    Textarea,
    Select,
    /// Any kind this client has no control for. Such fields still occupy a
    /// slot in the value store but are never drawn.
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectOption {
    pub label: String,
    pub value: String,
    /// The value as it appears in JSON, written back when chosen.
    pub raw: Value,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormField {
    pub kind: FormKit,
    /// Halo's key for the field inside its group, only used when saving.
    pub name: String,
    pub label: String,
    pub help: Option<String>,
    pub value: String,
    /// JSON the initial value was read from; decides the type written back.
    pub raw: Value,
    pub options: Vec<SelectOption>,
}

impl FormField {
    pub fn text(label: &str, value: &str) -> Self {
        Self {
            kind: FormKit::Text,
            name: String::new(),
            label: label.to_string(),
            help: None,
            value: value.to_string(),
            raw: Value::String(value.to_string()),
            options: Vec::new(),
        }
    }

    pub fn select(label: &str, value: &str, options: &[(&str, &str)]) -> Self {
        Self {
            kind: FormKit::Select,
            options: options
                .iter()
                .map(|(label, value)| SelectOption {
                    label: label.to_string(),
                    value: value.to_string(),
                    raw: Value::String(value.to_string()),
                })
                .collect(),
            ..Self::text(label, value)
        }
    }

    pub fn with_kind(mut self, kind: FormKit) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    pub fn with_help(mut self, help: &str) -> Self {
        self.help = Some(help.to_string());
        self
    }

    /// Converts edited text back to JSON of the type the field started with.
    ///
    /// A matching option gives its own value. Otherwise text is parsed when
    /// the field held a boolean, number, array or object, and stays a string
    /// when it doesn't parse.
    pub fn json_value(&self, text: &str) -> Value {
        if let Some(option) = self.options.iter().find(|option| option.value == text) {
            return option.raw.clone();
        }
        match &self.raw {
            Value::Null | Value::String(_) => Value::String(text.to_string()),
            _ => serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string())),
        }
    }

    /// Label of the option whose value matches `value`, if any.
    pub fn option_label(&self, value: &str) -> Option<&str> {
        self.options
            .iter()
            .find(|option| option.value == value)
            .map(|option| option.label.as_str())
    }
}

/// One tab of a plugin's settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingsPage {
    pub group: String,
    pub label: String,
    pub fields: Vec<FormField>,
}

impl SettingsPage {
    pub fn new(group: &str, label: &str, fields: Vec<FormField>) -> Self {
        Self {
            group: group.to_string(),
            label: label.to_string(),
            fields,
        }
    }

    /// Initial values in field order; what the value store is seeded with.
    pub fn initial_values(&self) -> Vec<String> {
        self.fields.iter().map(|field| field.value.clone()).collect()
    }
}

/// Decoded settings document of one plugin.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PluginSetting {
    pub name: String,
    pub pages: Vec<SettingsPage>,
}

impl PluginSetting {
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Replaces schema defaults with the values the site has stored.
    ///
    /// `config` maps each group to an object keyed by field name. Fields
    /// without a stored entry keep their default.
    pub fn apply_config(&mut self, config: &Map<String, Value>) {
        for page in &mut self.pages {
            let Some(Value::Object(stored)) = config.get(&page.group) else {
                continue;
            };
            for field in &mut page.fields {
                if field.name.is_empty() {
                    continue;
                }
                if let Some(value) = stored.get(&field.name) {
                    field.value = value_text(value.clone());
                    field.raw = value.clone();
                }
            }
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct PluginSettingRaw {
    #[serde(default)]
    metadata: MetadataRaw,
    #[serde(default)]
    spec: SettingSpecRaw,
}

#[derive(Debug, Default, Deserialize)]
struct MetadataRaw {
    #[serde(default)]
    name: String,
}

#[derive(Debug, Default, Deserialize)]
struct SettingSpecRaw {
    #[serde(default)]
    forms: Vec<SettingFormRaw>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SettingFormRaw {
    #[serde(default)]
    group: String,
    #[serde(default)]
    label: String,
    #[serde(default)]
    form_schema: Vec<FormFieldRaw>,
}

#[derive(Debug, Deserialize)]
struct FormFieldRaw {
    #[serde(rename = "$formkit", default = "unknown_kind")]
    formkit: FormKit,
    #[serde(default)]
    name: String,
    #[serde(default)]
    label: String,
    #[serde(default)]
    help: Option<String>,
    #[serde(default)]
    value: Value,
    #[serde(default)]
    options: Vec<SelectOptionRaw>,
}

#[derive(Debug, Deserialize)]
struct SelectOptionRaw {
    #[serde(default)]
    label: String,
    #[serde(default)]
    value: Value,
}

fn unknown_kind() -> FormKit {
    FormKit::Unknown
}

/// Schema values may be any JSON; the store only holds strings.
fn value_text(value: Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text,
        other => other.to_string(),
    }
}

impl From<PluginSettingRaw> for PluginSetting {
    fn from(raw: PluginSettingRaw) -> Self {
        let pages = raw
            .spec
            .forms
            .into_iter()
            .map(|form| SettingsPage {
                group: form.group,
                label: form.label,
                fields: form
                    .form_schema
                    .into_iter()
                    .map(|field| FormField {
                        kind: field.formkit,
                        name: field.name,
                        label: field.label,
                        help: field.help.filter(|help| !help.is_empty()),
                        value: value_text(field.value.clone()),
                        raw: field.value,
                        options: field
                            .options
                            .into_iter()
                            .map(|option| SelectOption {
                                label: option.label,
                                value: value_text(option.value.clone()),
                                raw: option.value,
                            })
                            .collect(),
                    })
                    .collect(),
            })
            .collect();

        Self {
            name: raw.metadata.name,
            pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SITEMAP_SETTING: &str = r#"{
        "apiVersion": "v1alpha1",
        "kind": "Setting",
        "metadata": { "name": "sitemap-settings" },
        "spec": {
            "forms": [
                {
                    "group": "basic",
                    "label": "Basic",
                    "formSchema": [
                        { "$formkit": "text", "name": "title", "label": "Title", "value": "a" },
                        {
                            "$formkit": "select",
                            "name": "enabled",
                            "label": "Enabled",
                            "value": "0",
                            "help": "Turn the sitemap on or off",
                            "options": [
                                { "label": "On", "value": "1" },
                                { "label": "Off", "value": "0" }
                            ]
                        },
                        { "$formkit": "checkbox", "name": "extra", "label": "Extra", "value": true },
                        { "$formkit": "textarea", "name": "notes", "label": "Notes" }
                    ]
                },
                { "group": "advanced", "label": "Advanced", "formSchema": [] }
            ]
        }
    }"#;

    fn decode(json: &str) -> PluginSetting {
        serde_json::from_str::<PluginSettingRaw>(json)
            .expect("valid setting json")
            .into()
    }

    #[test]
    fn test_decodes_pages_in_order() {
        let setting = decode(SITEMAP_SETTING);
        assert_eq!(setting.name, "sitemap-settings");
        assert_eq!(setting.pages.len(), 2);
        assert_eq!(setting.pages[0].group, "basic");
        assert_eq!(setting.pages[1].label, "Advanced");
        assert!(setting.pages[1].fields.is_empty());
    }

    #[test]
    fn test_decodes_field_kinds() {
        let setting = decode(SITEMAP_SETTING);
        let kinds: Vec<FormKit> = setting.pages[0].fields.iter().map(|f| f.kind).collect();
        assert_eq!(
            kinds,
            vec![
                FormKit::Text,
                FormKit::Select,
                FormKit::Unknown,
                FormKit::Textarea
            ]
        );
    }

    #[test]
    fn test_initial_values_follow_field_order() {
        let setting = decode(SITEMAP_SETTING);
        assert_eq!(
            setting.pages[0].initial_values(),
            vec!["a", "0", "true", ""]
        );
    }

    #[test]
    fn test_select_options_and_help() {
        let setting = decode(SITEMAP_SETTING);
        let select = &setting.pages[0].fields[1];
        assert_eq!(select.options.len(), 2);
        assert_eq!(select.option_label("1"), Some("On"));
        assert_eq!(select.option_label("2"), None);
        assert_eq!(select.help.as_deref(), Some("Turn the sitemap on or off"));
        assert_eq!(setting.pages[0].fields[0].help, None);
    }

    #[test]
    fn test_empty_document() {
        let setting = decode(r#"{ "metadata": { "name": "x" }, "spec": { "forms": [] } }"#);
        assert!(setting.is_empty());
    }

    #[test]
    fn test_stored_config_overrides_defaults() {
        let mut setting = decode(SITEMAP_SETTING);
        let config = serde_json::json!({
            "basic": { "title": "My sitemap", "enabled": "1", "unrelated": 3 },
            "advanced": "not an object"
        });
        setting.apply_config(config.as_object().expect("object"));

        assert_eq!(
            setting.pages[0].initial_values(),
            vec!["My sitemap", "1", "true", ""]
        );
        assert_eq!(setting.pages[0].fields[0].raw, Value::String("My sitemap".into()));
    }

    #[test]
    fn test_json_value_keeps_original_type() {
        let setting = decode(
            r#"{ "spec": { "forms": [ { "group": "g", "label": "G", "formSchema": [
                { "$formkit": "select", "name": "flag", "label": "Flag", "value": true,
                  "options": [ { "label": "Yes", "value": true }, { "label": "No", "value": false } ] },
                { "$formkit": "text", "name": "count", "label": "Count", "value": 10 },
                { "$formkit": "text", "name": "title", "label": "Title", "value": "10" }
            ] } ] } }"#,
        );
        let fields = &setting.pages[0].fields;
        assert_eq!(fields[0].json_value("false"), Value::Bool(false));
        assert_eq!(fields[1].json_value("25"), serde_json::json!(25));
        assert_eq!(fields[1].json_value("many"), Value::String("many".into()));
        assert_eq!(fields[2].json_value("25"), Value::String("25".into()));
    }

    #[test]
    fn test_formkit_display() {
        assert_eq!(FormKit::Textarea.to_string(), "textarea");
        assert_eq!(FormKit::Select.as_ref(), "select");
    }
}
