//! State of the dynamic settings form.
//!
//! [`SettingsForm`] owns the pages of one plugin, which tab is active, and the
//! [`ValueStore`] of that tab. The terminal layer asks it for [`Control`]s
//! and forwards key presses; it never reads the schema itself.

use crate::schema::{FormField, FormKit, PluginSetting, SelectOption, SettingsPage};
use crate::store::ValueStore;

/// What to draw for one field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Control<'a> {
    /// Position of the field in its page, which is also its store slot.
    pub index: usize,
    pub label: &'a str,
    pub help: Option<&'a str>,
    pub focused: bool,
    pub kind: ControlKind<'a>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlKind<'a> {
    TextInput {
        value: &'a str,
        multiline: bool,
        editing: bool,
    },
    Select {
        value: &'a str,
        /// Label of the option holding `value`, when there is one.
        selected_label: Option<&'a str>,
        options: &'a [SelectOption],
        /// Highlighted option while the dropdown is open.
        dropdown: Option<usize>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Dropdown {
    field: usize,
    highlighted: usize,
}

#[derive(Debug, Clone, Default)]
pub struct SettingsForm {
    pages: Vec<SettingsPage>,
    active: usize,
    store: ValueStore,
    cursor: Option<usize>,
    editing: bool,
    dropdown: Option<Dropdown>,
}

fn is_renderable(field: &FormField) -> bool {
    field.kind != FormKit::Unknown
}

impl SettingsForm {
    /// Builds the form and seeds the store from the first page.
    pub fn new(setting: PluginSetting) -> Self {
        let mut form = Self {
            pages: setting.pages,
            ..Self::default()
        };
        form.activate_page(0);
        form
    }

    pub fn pages(&self) -> &[SettingsPage] {
        &self.pages
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub fn active_index(&self) -> usize {
        self.active
    }

    pub fn active_page(&self) -> Option<&SettingsPage> {
        self.pages.get(self.active)
    }

    pub fn store(&self) -> &ValueStore {
        &self.store
    }

    pub fn value(&self, index: usize) -> &str {
        self.store.get(index)
    }

    /// Makes `index` the active tab and reseeds the store from its initial
    /// values. Edits made on the previous tab are discarded.
    pub fn activate_page(&mut self, index: usize) -> bool {
        let Some(page) = self.pages.get(index) else {
            return false;
        };
        self.store.replace_all(page.initial_values());
        self.active = index;
        self.editing = false;
        self.dropdown = None;
        self.cursor = page.fields.iter().position(is_renderable);
        true
    }

    pub fn next_page(&mut self) -> bool {
        if self.pages.len() < 2 {
            return false;
        }
        self.activate_page((self.active + 1) % self.pages.len())
    }

    pub fn previous_page(&mut self) -> bool {
        if self.pages.len() < 2 {
            return false;
        }
        let len = self.pages.len();
        self.activate_page((self.active + len - 1) % len)
    }

    fn field(&self, index: usize) -> Option<&FormField> {
        self.active_page()?.fields.get(index)
    }

    /// Controls for every field that has one, in field order.
    pub fn controls(&self) -> Vec<Control<'_>> {
        let Some(page) = self.active_page() else {
            return Vec::new();
        };
        page.fields
            .iter()
            .enumerate()
            .filter_map(|(index, field)| {
                let value = self.store.get(index);
                let kind = match field.kind {
                    FormKit::Text | FormKit::Textarea => ControlKind::TextInput {
                        value,
                        multiline: field.kind == FormKit::Textarea,
                        editing: self.editing && self.cursor == Some(index),
                    },
                    FormKit::Select => ControlKind::Select {
                        value,
                        selected_label: field.option_label(value),
                        options: &field.options,
                        dropdown: self
                            .dropdown
                            .filter(|dropdown| dropdown.field == index)
                            .map(|dropdown| dropdown.highlighted),
                    },
                    FormKit::Unknown => return None,
                };
                Some(Control {
                    index,
                    label: &field.label,
                    help: field.help.as_deref(),
                    focused: self.cursor == Some(index),
                    kind,
                })
            })
            .collect()
    }

    pub fn focused(&self) -> Option<usize> {
        self.cursor
    }

    pub fn is_editing(&self) -> bool {
        self.editing
    }

    pub fn is_dropdown_open(&self) -> bool {
        self.dropdown.is_some()
    }

    /// Whether keys should go to the focused control rather than navigation.
    pub fn is_capturing(&self) -> bool {
        self.editing || self.dropdown.is_some()
    }

    pub fn focus_next(&mut self) {
        self.move_focus(true);
    }

    pub fn focus_previous(&mut self) {
        self.move_focus(false);
    }

    fn move_focus(&mut self, forward: bool) {
        if self.is_capturing() {
            return;
        }
        let Some(page) = self.active_page() else {
            return;
        };
        let renderable: Vec<usize> = page
            .fields
            .iter()
            .enumerate()
            .filter(|(_, field)| is_renderable(field))
            .map(|(index, _)| index)
            .collect();
        let Some(current) = self
            .cursor
            .and_then(|cursor| renderable.iter().position(|&index| index == cursor))
        else {
            self.cursor = renderable.first().copied();
            return;
        };
        let len = renderable.len();
        let next = if forward {
            (current + 1) % len
        } else {
            (current + len - 1) % len
        };
        self.cursor = Some(renderable[next]);
    }

    /// Enter on the focused field: start editing a text field, open a
    /// dropdown, or act inside whichever of the two is already open.
    pub fn submit(&mut self) {
        if let Some(dropdown) = self.dropdown {
            self.choose_option(dropdown.field, dropdown.highlighted);
            return;
        }
        let Some(index) = self.cursor else {
            return;
        };
        let Some(kind) = self.field(index).map(|field| field.kind) else {
            return;
        };
        match kind {
            FormKit::Textarea if self.editing => {
                self.store.push_char(index, '\n');
            }
            FormKit::Text | FormKit::Textarea => self.editing = !self.editing,
            FormKit::Select => self.open_dropdown(index),
            FormKit::Unknown => {}
        }
    }

    /// Esc: leaves editing or closes the dropdown. Returns `false` when
    /// there was nothing to close.
    pub fn cancel(&mut self) -> bool {
        if self.dropdown.take().is_some() {
            return true;
        }
        std::mem::replace(&mut self.editing, false)
    }

    pub fn input_char(&mut self, ch: char) -> bool {
        match (self.editing, self.cursor) {
            (true, Some(index)) => self.store.push_char(index, ch),
            _ => false,
        }
    }

    pub fn backspace(&mut self) -> bool {
        match (self.editing, self.cursor) {
            (true, Some(index)) => self.store.pop_char(index),
            _ => false,
        }
    }

    /// Replaces the value of a text field.
    pub fn edit(&mut self, index: usize, value: impl Into<String>) -> bool {
        match self.field(index).map(|field| field.kind) {
            Some(FormKit::Text | FormKit::Textarea) => self.store.set(index, value),
            _ => false,
        }
    }

    pub fn open_dropdown(&mut self, index: usize) {
        let Some(field) = self.field(index) else {
            return;
        };
        if field.kind != FormKit::Select || field.options.is_empty() {
            return;
        }
        let value = self.store.get(index);
        let highlighted = field
            .options
            .iter()
            .position(|option| option.value == value)
            .unwrap_or(0);
        self.cursor = Some(index);
        self.editing = false;
        self.dropdown = Some(Dropdown {
            field: index,
            highlighted,
        });
    }

    pub fn highlight_next(&mut self) {
        self.move_highlight(true);
    }

    pub fn highlight_previous(&mut self) {
        self.move_highlight(false);
    }

    fn move_highlight(&mut self, forward: bool) {
        let Some(dropdown) = self.dropdown else {
            return;
        };
        let len = self
            .field(dropdown.field)
            .map(|field| field.options.len())
            .unwrap_or(0);
        if len == 0 {
            return;
        }
        let highlighted = if forward {
            (dropdown.highlighted + 1) % len
        } else {
            (dropdown.highlighted + len - 1) % len
        };
        self.dropdown = Some(Dropdown {
            highlighted,
            ..dropdown
        });
    }

    /// Writes the value of option `option` into field `index` and closes
    /// the dropdown.
    pub fn choose_option(&mut self, index: usize, option: usize) -> bool {
        let Some(value) = self
            .field(index)
            .filter(|field| field.kind == FormKit::Select)
            .and_then(|field| field.options.get(option))
            .map(|option| option.value.clone())
        else {
            return false;
        };
        self.dropdown = None;
        self.store.set(index, value)
    }
}
