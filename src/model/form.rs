use super::preset::PresetCatalog;
use crate::hardware::ControlDescriptor;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Submitted field values, by field name
pub type FieldMap = BTreeMap<String, String>;

/// The control a field is rendered with
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum FieldKind {
    Select {
        options: Vec<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        presets: Option<PresetCatalog>,
    },
    Text,
    Textarea {
        cols: u16,
        rows: u16,
        #[serde(skip_serializing_if = "Option::is_none")]
        controllers: Option<Vec<ControlDescriptor>>,
    },
    Boolean,
    /// Read-only text shown next to the form
    Info,
    Html {
        content: String,
    },
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FormField {
    pub name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub title: String,
    #[serde(flatten)]
    pub kind: FieldKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    pub advanced: bool,
    pub disabled: bool,
    pub refresh_on_change: bool,
}

impl FormField {
    pub fn new(name: &str, title: &str, kind: FieldKind) -> Self {
        Self {
            name: name.to_owned(),
            title: title.to_owned(),
            kind,
            value: None,
            advanced: false,
            disabled: false,
            refresh_on_change: false,
        }
    }

    pub fn value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn maybe_value(mut self, value: Option<&str>) -> Self {
        self.value = value.map(str::to_owned);
        self
    }

    pub fn advanced(mut self) -> Self {
        self.advanced = true;
        self
    }

    pub fn disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }

    pub fn refresh_on_change(mut self) -> Self {
        self.refresh_on_change = true;
        self
    }
}

/// A rendered configuration section
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Page {
    pub title: String,
    pub fields: Vec<FormField>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<String>>,
}

impl Page {
    pub fn field(&self, name: &str) -> Option<&FormField> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// One POST of the form
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct FormSubmission {
    pub fields: FieldMap,
    /// Fields the user actually touched
    pub changed: BTreeSet<String>,
    /// `REFRESH` re-renders without saving
    #[serde(rename = "_command", alias = "command")]
    pub command: Option<String>,
}

impl FormSubmission {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    pub fn set(&mut self, name: &str, value: impl Into<String>) {
        self.fields.insert(name.to_owned(), value.into());
    }

    pub fn touched(&self, name: &str) -> bool {
        self.changed.contains(name)
    }

    pub fn is_refresh(&self) -> bool {
        self.command.as_deref() == Some("REFRESH")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn submission_from_json() {
        let s: FormSubmission = serde_json::from_value(json!({
            "fields": {"ALSA_SAMPLERATE": "96000"},
            "changed": ["ALSA_SAMPLERATE"],
            "_command": "REFRESH",
        }))
        .unwrap();
        assert_eq!(s.get("ALSA_SAMPLERATE"), Some("96000"));
        assert!(s.touched("ALSA_SAMPLERATE"));
        assert!(!s.touched("ALSA_DEVICE"));
        assert!(s.is_refresh());

        let s: FormSubmission = serde_json::from_value(json!({"command": "SAVE"})).unwrap();
        assert!(!s.is_refresh());
        assert!(s.fields.is_empty());
    }

    #[test]
    fn field_serialisation() {
        let f = FormField::new(
            "ALSA_NUM_PERIODS",
            "Number of Buffers",
            FieldKind::Select {
                options: vec!["2".into(), "3".into()],
                presets: None,
            },
        )
        .value("2")
        .refresh_on_change();

        assert_eq!(
            serde_json::to_value(&f).unwrap(),
            json!({
                "name": "ALSA_NUM_PERIODS",
                "title": "Number of Buffers",
                "type": "select",
                "options": ["2", "3"],
                "value": "2",
                "advanced": false,
                "disabled": false,
                "refresh_on_change": true,
            })
        );
    }
}
