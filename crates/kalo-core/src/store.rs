/// Live values of the fields on the active settings page.
///
/// Slots are addressed by field position. Reads past the end yield an empty
/// string and writes past the end are dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValueStore {
    values: Vec<String>,
}

impl ValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces every slot at once.
    pub fn replace_all(&mut self, values: Vec<String>) {
        self.values = values;
    }

    pub fn get(&self, index: usize) -> &str {
        self.values.get(index).map(String::as_str).unwrap_or("")
    }

    /// Returns `false` when `index` has no slot.
    pub fn set(&mut self, index: usize, value: impl Into<String>) -> bool {
        match self.values.get_mut(index) {
            Some(slot) => {
                *slot = value.into();
                true
            }
            None => false,
        }
    }

    pub fn push_char(&mut self, index: usize, ch: char) -> bool {
        match self.values.get_mut(index) {
            Some(slot) => {
                slot.push(ch);
                true
            }
            None => false,
        }
    }

    pub fn pop_char(&mut self, index: usize) -> bool {
        match self.values.get_mut(index) {
            Some(slot) => slot.pop().is_some(),
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[String] {
        &self.values
    }
}
