//! Field descriptors and the ordered field schema.
//!
//! A schema is static configuration: each descriptor declares how the raw
//! value of one form control is decoded into the value stored in a
//! [`Record`](crate::codec::Record), and how a stored value is turned back
//! into a raw control value for display.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use thiserror::Error;

/// Names the codec stamps on every record; a field may not reuse them.
pub const RESERVED_NAMES: [&str; 3] = ["date", "timestamp", "uid"];

/// The kind of control a field is rendered as, without its domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ControlKind {
    Slider,
    Select,
    Radio,
    CheckboxGroup,
    Text,
}

/// The unparsed value a control produces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawValue {
    /// Slider position, selected option key, checked radio key or free text.
    Scalar(String),
    /// Keys of the checked boxes in a checkbox group.
    Selection(Vec<String>),
}

impl RawValue {
    pub fn scalar(value: impl Into<String>) -> Self {
        Self::Scalar(value.into())
    }

    pub fn selection<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Selection(keys.into_iter().map(Into::into).collect())
    }
}

/// A decoded value as stored in a record.
///
/// `NotANumber` is what a numeric field decodes to when its raw text has no
/// leading integer. It serializes as `null`, so consumers see it as absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Int(i64),
    Text(String),
    Flags(BTreeMap<String, u8>),
    NotANumber,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("duplicate field: {0}")]
    DuplicateField(String),

    #[error("field name is reserved for record metadata: {0}")]
    ReservedName(String),

    #[error("field {field}: min {min} is greater than max {max}")]
    InvalidRange { field: String, min: i64, max: i64 },

    #[error("field {0} declares no options")]
    EmptyDomain(String),

    #[error("field {field}: option {key} is declared twice")]
    DuplicateOption { field: String, key: String },

    #[error("field {field}: encoding refers to unknown option {key}")]
    UnknownEncodingKey { field: String, key: String },

    #[error("field {field}: default {value} is outside the declared domain")]
    DefaultOutOfDomain { field: String, value: i64 },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SliderField {
    pub min: i64,
    pub max: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<i64>,
    /// Captions shown under the low and high ends of the range.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale_labels: Option<(String, String)>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoiceOption {
    pub key: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectField {
    pub options: Vec<ChoiceOption>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodedKey {
    pub key: String,
    pub value: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RadioField {
    pub options: Vec<ChoiceOption>,
    /// Explicit key → value table. Without it, keys are parsed as integers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encoding: Option<Vec<EncodedKey>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<i64>,
}

impl RadioField {
    fn decode(&self, key: &str) -> Option<FieldValue> {
        match &self.encoding {
            Some(encoding) => encoding
                .iter()
                .find(|entry| entry.key == key)
                .map(|entry| FieldValue::Int(entry.value)),
            None => Some(parse_int_prefix(key)),
        }
    }

    /// First key in declared order whose encoded value is `value`.
    pub fn key_for(&self, value: i64) -> Option<String> {
        match &self.encoding {
            Some(encoding) => encoding
                .iter()
                .find(|entry| entry.value == value)
                .map(|entry| entry.key.clone()),
            None => Some(value.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckboxOption {
    pub key: String,
    pub short: String,
    #[serde(default)]
    pub long: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckboxCategory {
    pub name: String,
    pub options: Vec<CheckboxOption>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckboxGroupField {
    pub categories: Vec<CheckboxCategory>,
}

impl CheckboxGroupField {
    /// Every option key across all categories, in declared order.
    pub fn option_keys(&self) -> impl Iterator<Item = &str> {
        self.categories
            .iter()
            .flat_map(|category| category.options.iter())
            .map(|option| option.key.as_str())
    }

    /// Dense bitmap over the whole option universe; unknown keys are ignored.
    pub fn decode<'a>(&self, selected: impl IntoIterator<Item = &'a str>) -> FieldValue {
        let selected: HashSet<&str> = selected.into_iter().collect();
        FieldValue::Flags(
            self.option_keys()
                .map(|key| (key.to_string(), u8::from(selected.contains(key))))
                .collect(),
        )
    }

    fn empty(&self) -> FieldValue {
        self.decode(std::iter::empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TextField {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum FieldKind {
    Slider(SliderField),
    Select(SelectField),
    Radio(RadioField),
    CheckboxGroup(CheckboxGroupField),
    #[serde(alias = "textarea")]
    Text(TextField),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    pub name: String,
    pub label: String,
    /// Advisory; enforced where the form is submitted, never by decoding.
    #[serde(default)]
    pub required: bool,
    #[serde(flatten)]
    pub kind: FieldKind,
}

impl FieldDescriptor {
    pub fn new(name: impl Into<String>, label: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            required: false,
            kind,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn control(&self) -> ControlKind {
        match self.kind {
            FieldKind::Slider(_) => ControlKind::Slider,
            FieldKind::Select(_) => ControlKind::Select,
            FieldKind::Radio(_) => ControlKind::Radio,
            FieldKind::CheckboxGroup(_) => ControlKind::CheckboxGroup,
            FieldKind::Text(_) => ControlKind::Text,
        }
    }

    pub fn default_value(&self) -> Option<FieldValue> {
        match &self.kind {
            FieldKind::Slider(slider) => slider.default.map(FieldValue::Int),
            FieldKind::Select(select) => select.default.map(FieldValue::Int),
            FieldKind::Radio(radio) => radio.default.map(FieldValue::Int),
            FieldKind::CheckboxGroup(group) => Some(group.empty()),
            FieldKind::Text(text) => text.default.clone().map(FieldValue::Text),
        }
    }

    /// Decodes a raw control value.
    ///
    /// Absent or empty raw input decodes to `None`. Numeric kinds do not
    /// check their domain: the caller guarantees the raw value came from the
    /// control, and text without a leading integer becomes
    /// [`FieldValue::NotANumber`].
    pub fn decode(&self, raw: Option<&RawValue>) -> Option<FieldValue> {
        let raw = raw?;
        if let FieldKind::CheckboxGroup(group) = &self.kind {
            return match raw {
                RawValue::Selection(keys) => Some(group.decode(keys.iter().map(String::as_str))),
                RawValue::Scalar(key) if key.is_empty() => None,
                RawValue::Scalar(key) => Some(group.decode([key.as_str()])),
            };
        }

        let RawValue::Scalar(text) = raw else {
            return None;
        };
        if text.is_empty() {
            return None;
        }
        match &self.kind {
            FieldKind::Slider(_) | FieldKind::Select(_) => Some(parse_int_prefix(text)),
            FieldKind::Radio(radio) => radio.decode(text),
            FieldKind::Text(_) => {
                let trimmed = text.trim();
                (!trimmed.is_empty()).then(|| FieldValue::Text(trimmed.to_string()))
            }
            FieldKind::CheckboxGroup(_) => None,
        }
    }

    /// Raw control value that displays `value`, or `None` when no control
    /// state represents it.
    pub fn encode(&self, value: &FieldValue) -> Option<RawValue> {
        match (&self.kind, value) {
            (_, FieldValue::NotANumber) => None,
            (FieldKind::Radio(radio), FieldValue::Int(value)) => {
                radio.key_for(*value).map(RawValue::Scalar)
            }
            (FieldKind::Radio(radio), FieldValue::Text(key)) if radio.encoding.is_none() => {
                Some(RawValue::scalar(key.clone()))
            }
            (FieldKind::CheckboxGroup(group), FieldValue::Flags(flags)) => Some(RawValue::selection(
                group
                    .option_keys()
                    .filter(|key| flags.get(*key).is_some_and(|bit| *bit != 0)),
            )),
            (
                FieldKind::Slider(_) | FieldKind::Select(_) | FieldKind::Text(_),
                FieldValue::Int(value),
            ) => Some(RawValue::Scalar(value.to_string())),
            (
                FieldKind::Slider(_) | FieldKind::Select(_) | FieldKind::Text(_),
                FieldValue::Text(text),
            ) => Some(RawValue::scalar(text.clone())),
            _ => None,
        }
    }

    /// Raw value a freshly rendered control starts with.
    ///
    /// Sliders without a default sit at `min`. An encoded radio whose default
    /// has no key yields `None`, leaving the group unchecked.
    pub fn encode_default_for_display(&self) -> Option<RawValue> {
        match &self.kind {
            FieldKind::Slider(slider) => Some(RawValue::Scalar(
                slider.default.unwrap_or(slider.min).to_string(),
            )),
            _ => self
                .default_value()
                .and_then(|default| self.encode(&default)),
        }
    }

    fn validate(&self) -> Result<(), SchemaError> {
        let field = || self.name.clone();
        match &self.kind {
            FieldKind::Slider(slider) => {
                if slider.min > slider.max {
                    return Err(SchemaError::InvalidRange {
                        field: field(),
                        min: slider.min,
                        max: slider.max,
                    });
                }
                if let Some(value) = slider.default {
                    if !(slider.min..=slider.max).contains(&value) {
                        return Err(SchemaError::DefaultOutOfDomain { field: field(), value });
                    }
                }
            }
            FieldKind::Select(select) => {
                check_options(&self.name, &select.options)?;
                if let Some(value) = select.default {
                    let known = select
                        .options
                        .iter()
                        .any(|option| parse_int_prefix(&option.key) == FieldValue::Int(value));
                    if !known {
                        return Err(SchemaError::DefaultOutOfDomain { field: field(), value });
                    }
                }
            }
            FieldKind::Radio(radio) => {
                check_options(&self.name, &radio.options)?;
                if let Some(encoding) = &radio.encoding {
                    if let Some(entry) = encoding
                        .iter()
                        .find(|entry| !radio.options.iter().any(|option| option.key == entry.key))
                    {
                        return Err(SchemaError::UnknownEncodingKey {
                            field: field(),
                            key: entry.key.clone(),
                        });
                    }
                }
                if let Some(value) = radio.default {
                    let known = radio
                        .options
                        .iter()
                        .any(|option| radio.decode(&option.key) == Some(FieldValue::Int(value)));
                    if !known {
                        return Err(SchemaError::DefaultOutOfDomain { field: field(), value });
                    }
                }
            }
            FieldKind::CheckboxGroup(group) => {
                let mut seen = HashSet::new();
                for key in group.option_keys() {
                    if !seen.insert(key) {
                        return Err(SchemaError::DuplicateOption {
                            field: field(),
                            key: key.to_string(),
                        });
                    }
                }
                if seen.is_empty() {
                    return Err(SchemaError::EmptyDomain(field()));
                }
            }
            FieldKind::Text(_) => {}
        }
        Ok(())
    }
}

fn check_options(field: &str, options: &[ChoiceOption]) -> Result<(), SchemaError> {
    if options.is_empty() {
        return Err(SchemaError::EmptyDomain(field.to_string()));
    }
    let mut seen = HashSet::new();
    for option in options {
        if !seen.insert(option.key.as_str()) {
            return Err(SchemaError::DuplicateOption {
                field: field.to_string(),
                key: option.key.clone(),
            });
        }
    }
    Ok(())
}

/// Integer prefix parse: leading whitespace, an optional sign, then digits.
/// Anything after the digits is ignored. No digits, or a value that does not
/// fit in `i64`, gives [`FieldValue::NotANumber`].
pub fn parse_int_prefix(raw: &str) -> FieldValue {
    let text = raw.trim_start();
    let sign_len = usize::from(matches!(text.as_bytes().first(), Some(b'-' | b'+')));
    let end = text[sign_len..].bytes().take_while(u8::is_ascii_digit).count();
    if end == 0 {
        return FieldValue::NotANumber;
    }
    match text[..sign_len + end].parse::<i64>() {
        Ok(value) => FieldValue::Int(value),
        Err(_) => FieldValue::NotANumber,
    }
}

/// Ordered, validated set of field descriptors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<FieldDescriptor>", into = "Vec<FieldDescriptor>")]
pub struct FieldSchema {
    fields: Vec<FieldDescriptor>,
    index: HashMap<String, usize>,
}

impl FieldSchema {
    pub fn new(fields: Vec<FieldDescriptor>) -> Result<Self, SchemaError> {
        let mut index = HashMap::with_capacity(fields.len());
        for (position, descriptor) in fields.iter().enumerate() {
            if RESERVED_NAMES.contains(&descriptor.name.as_str()) {
                return Err(SchemaError::ReservedName(descriptor.name.clone()));
            }
            if index.insert(descriptor.name.clone(), position).is_some() {
                return Err(SchemaError::DuplicateField(descriptor.name.clone()));
            }
            descriptor.validate()?;
        }
        Ok(Self { fields, index })
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields.iter()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&FieldDescriptor> {
        self.index.get(name).map(|position| &self.fields[*position])
    }

    pub fn default_of(&self, name: &str) -> Option<FieldValue> {
        self.get(name)?.default_value()
    }

    pub fn decode(&self, name: &str, raw: Option<&RawValue>) -> Option<FieldValue> {
        self.get(name)?.decode(raw)
    }

    pub fn encode(&self, name: &str, value: &FieldValue) -> Option<RawValue> {
        self.get(name)?.encode(value)
    }

    pub fn encode_default_for_display(&self, name: &str) -> Option<RawValue> {
        self.get(name)?.encode_default_for_display()
    }

    /// Flattened option keys of a checkbox group field.
    pub fn checkbox_options(&self, name: &str) -> Option<Vec<&str>> {
        match &self.get(name)?.kind {
            FieldKind::CheckboxGroup(group) => Some(group.option_keys().collect()),
            _ => None,
        }
    }
}

impl TryFrom<Vec<FieldDescriptor>> for FieldSchema {
    type Error = SchemaError;

    fn try_from(fields: Vec<FieldDescriptor>) -> Result<Self, Self::Error> {
        Self::new(fields)
    }
}

impl From<FieldSchema> for Vec<FieldDescriptor> {
    fn from(schema: FieldSchema) -> Self {
        schema.fields
    }
}
