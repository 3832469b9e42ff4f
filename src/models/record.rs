use serde::{Deserialize, Serialize};

/// A raw cell value: a single string, or several values from a multi-valued cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    List(Vec<String>),
}

impl FieldValue {
    pub fn is_empty(&self) -> bool {
        match self {
            FieldValue::Text(text) => text.trim().is_empty(),
            FieldValue::List(items) => items.iter().all(|item| item.trim().is_empty()),
        }
    }

    /// First non-empty text, if any.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(text) => Some(text.as_str()),
            FieldValue::List(items) => items.iter().map(String::as_str).find(|s| !s.trim().is_empty()),
        }
    }
}

impl From<Vec<String>> for FieldValue {
    fn from(mut items: Vec<String>) -> Self {
        if items.len() == 1 {
            FieldValue::Text(items.remove(0))
        } else {
            FieldValue::List(items)
        }
    }
}

/// One record's fields, keyed by lower-cased field name, in extraction order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRecord {
    fields: Vec<(String, FieldValue)>,
}

impl RawRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a field, replacing any previous value under the same (lower-cased) name.
    pub fn insert(&mut self, name: &str, value: FieldValue) {
        let key = name.trim().to_lowercase();
        match self.fields.iter_mut().find(|(existing, _)| *existing == key) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((key, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value)
    }

    /// First non-empty value among `names`, tried in order.
    pub fn first_of(&self, names: &[&str]) -> Option<&FieldValue> {
        names
            .iter()
            .filter_map(|name| self.get(name))
            .find(|value| !value.is_empty())
    }

    /// Every non-empty value whose field name contains any of `needles`, in field order.
    pub fn all_containing(&self, needles: &[&str]) -> Vec<&FieldValue> {
        self.fields
            .iter()
            .filter(|(key, _)| needles.iter().any(|needle| key.contains(needle)))
            .map(|(_, value)| value)
            .filter(|value| !value.is_empty())
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(key, value)| (key.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedStudent {
    pub local_id: u32,
    pub name: String,
    pub email: String,
    pub age: Option<u32>,
    /// Ordered, without duplicates.
    pub enrolled_class_titles: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedClass {
    pub local_id: u32,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedGrade {
    pub student_local_id: u32,
    pub class_local_id: u32,
    pub score: Option<f64>,
    pub feedback: Option<String>,
}

/// Normalized output of a single document. Ids are local to that document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentRecords {
    pub source: String,
    pub students: Vec<NormalizedStudent>,
    pub classes: Vec<NormalizedClass>,
    pub grades: Vec<NormalizedGrade>,
}

impl DocumentRecords {
    pub fn class_title(&self, local_id: u32) -> Option<&str> {
        self.classes
            .iter()
            .find(|class| class.local_id == local_id)
            .map(|class| class.title.as_str())
    }

    pub fn student(&self, local_id: u32) -> Option<&NormalizedStudent> {
        self.students
            .iter()
            .find(|student| student.local_id == local_id)
    }
}
