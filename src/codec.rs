//! Bulk decoding of form controls into a [`Record`] and back.

use crate::schema::{ControlKind, FieldSchema, FieldValue, RawValue};
use crate::user::UserId;
use chrono::{DateTime, NaiveDate, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::debug;

/// Source of the current raw value of each control.
pub trait RawInputProvider {
    /// `None` means the control supplied no value at all.
    fn raw_value(&self, field: &str, control: ControlKind) -> Option<RawValue>;
}

/// Target that sets the raw state of named controls.
pub trait ControlSink {
    fn set_raw(&mut self, field: &str, control: ControlKind, raw: RawValue);
}

impl RawInputProvider for BTreeMap<String, RawValue> {
    fn raw_value(&self, field: &str, _control: ControlKind) -> Option<RawValue> {
        self.get(field).cloned()
    }
}

impl ControlSink for BTreeMap<String, RawValue> {
    fn set_raw(&mut self, field: &str, _control: ControlKind, raw: RawValue) {
        self.insert(field.to_string(), raw);
    }
}

/// One form submission.
///
/// Reading a record back is lenient: keys with a value no field kind can hold
/// are dropped instead of failing the whole record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "StoredRecord")]
pub struct Record {
    pub date: NaiveDate,
    #[serde(with = "iso_millis")]
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,
    #[serde(flatten)]
    pub fields: BTreeMap<String, Option<FieldValue>>,
}

impl Record {
    pub fn value(&self, field: &str) -> Option<&FieldValue> {
        self.fields.get(field)?.as_ref()
    }

    /// Stamps the user id, if one was resolved.
    pub fn tag(&mut self, user: &UserId) {
        if let Some(id) = user.current() {
            self.uid = Some(id.to_string());
        }
    }

    /// Fields whose raw text had no integer to parse.
    pub fn invalid_fields(&self) -> Vec<&str> {
        self.fields
            .iter()
            .filter(|(_, value)| matches!(value, Some(FieldValue::NotANumber)))
            .map(|(name, _)| name.as_str())
            .collect()
    }

    /// Required fields of `schema` that decoded to nothing, in schema order.
    pub fn missing_required<'s>(&self, schema: &'s FieldSchema) -> Vec<&'s str> {
        schema
            .iter()
            .filter(|descriptor| descriptor.required && self.value(&descriptor.name).is_none())
            .map(|descriptor| descriptor.name.as_str())
            .collect()
    }
}

/// A record as written by the form or by the entry store, before its extra
/// keys are sorted out.
#[derive(Deserialize)]
struct StoredRecord {
    date: NaiveDate,
    #[serde(deserialize_with = "iso_millis::deserialize")]
    timestamp: DateTime<Utc>,
    #[serde(default)]
    uid: Option<String>,
    #[serde(flatten)]
    rest: BTreeMap<String, Value>,
}

impl From<StoredRecord> for Record {
    fn from(stored: StoredRecord) -> Self {
        let fields = stored
            .rest
            .into_iter()
            .filter_map(|(name, value)| match stored_value(&value) {
                Some(decoded) => Some((name, decoded)),
                None => {
                    debug!(field = %name, %value, "skipping stored value of unsupported shape");
                    None
                }
            })
            .collect();

        Record {
            date: stored.date,
            timestamp: stored.timestamp,
            uid: stored.uid,
            fields,
        }
    }
}

/// `None` when no field kind holds a value shaped like `value`.
fn stored_value(value: &Value) -> Option<Option<FieldValue>> {
    match value {
        Value::Null => Some(None),
        Value::Number(number) => number.as_i64().map(|value| Some(FieldValue::Int(value))),
        Value::String(text) => Some(Some(FieldValue::Text(text.clone()))),
        Value::Object(flags) => flags
            .iter()
            .map(|(key, flag)| {
                let bit = match flag {
                    Value::Bool(set) => u8::from(*set),
                    Value::Number(number) => u8::try_from(number.as_u64()?).ok()?,
                    _ => return None,
                };
                Some((key.clone(), bit))
            })
            .collect::<Option<BTreeMap<_, _>>>()
            .map(|flags| Some(FieldValue::Flags(flags))),
        Value::Bool(_) | Value::Array(_) => None,
    }
}

pub fn collect<P>(schema: &FieldSchema, provider: &P) -> Record
where
    P: RawInputProvider + ?Sized,
{
    collect_at(schema, provider, Utc::now())
}

/// Decodes every field in schema order and stamps `date`/`timestamp` from
/// `now`, truncated to milliseconds.
pub fn collect_at<P>(schema: &FieldSchema, provider: &P, now: DateTime<Utc>) -> Record
where
    P: RawInputProvider + ?Sized,
{
    let timestamp = now.trunc_subsecs(3);
    let fields = schema
        .iter()
        .map(|descriptor| {
            let raw = provider.raw_value(&descriptor.name, descriptor.control());
            (descriptor.name.clone(), descriptor.decode(raw.as_ref()))
        })
        .collect();

    Record {
        date: timestamp.date_naive(),
        timestamp,
        uid: None,
        fields,
    }
}

/// Pushes every stored value of `record` to `sink`. Absent values and values
/// with no raw form are skipped, leaving those controls as they were.
/// Returns how many controls were set.
pub fn restore<S>(schema: &FieldSchema, record: &Record, sink: &mut S) -> usize
where
    S: ControlSink + ?Sized,
{
    let mut applied = 0;
    for descriptor in schema.iter() {
        let Some(value) = record.value(&descriptor.name) else {
            continue;
        };
        match descriptor.encode(value) {
            Some(raw) => {
                sink.set_raw(&descriptor.name, descriptor.control(), raw);
                applied += 1;
            }
            None => debug!(field = %descriptor.name, ?value, "no control state for stored value"),
        }
    }
    applied
}

/// RFC 3339 with milliseconds on the way out. On the way in, a timestamp
/// without an offset is taken as UTC.
mod iso_millis {
    use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let text = String::deserialize(deserializer)?;
        if let Ok(value) = DateTime::parse_from_rfc3339(&text) {
            return Ok(value.with_timezone(&Utc));
        }
        text.parse::<NaiveDateTime>()
            .map(|value| value.and_utc())
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::health_schema;
    use crate::schema::{
        CheckboxCategory, CheckboxGroupField, CheckboxOption, ChoiceOption, EncodedKey,
        FieldDescriptor, FieldKind, RadioField, SliderField,
    };
    use crate::user::{IdSources, UserConfig};
    use chrono::TimeZone;

    fn scenario_schema() -> FieldSchema {
        FieldSchema::new(vec![
            FieldDescriptor::new(
                "mood",
                "Overall mood today?",
                FieldKind::Slider(SliderField { min: 0, max: 10, default: Some(5), scale_labels: None }),
            )
            .required(),
            FieldDescriptor::new(
                "allergy_state",
                "Allergic Symptoms",
                FieldKind::Radio(RadioField {
                    options: ["none", "other", "face"]
                        .into_iter()
                        .map(|key| ChoiceOption { key: key.into(), label: key.into() })
                        .collect(),
                    encoding: Some(vec![
                        EncodedKey { key: "none".into(), value: 0 },
                        EncodedKey { key: "other".into(), value: 1 },
                        EncodedKey { key: "face".into(), value: 2 },
                    ]),
                    default: Some(0),
                }),
            )
            .required(),
            FieldDescriptor::new(
                "daily_activities",
                "Activities",
                FieldKind::CheckboxGroup(CheckboxGroupField {
                    categories: vec![CheckboxCategory {
                        name: "activities".into(),
                        options: ["gaming", "reading"]
                            .into_iter()
                            .map(|key| CheckboxOption { key: key.into(), short: key.into(), long: String::new() })
                            .collect(),
                    }],
                }),
            ),
        ])
        .unwrap()
    }

    fn noon() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 14, 12, 30, 0).unwrap()
    }

    #[test]
    fn scenario_collects_typed_record() {
        let raw: BTreeMap<String, RawValue> = [
            ("mood".to_string(), RawValue::scalar("7")),
            ("allergy_state".to_string(), RawValue::scalar("other")),
            ("daily_activities".to_string(), RawValue::selection(["reading"])),
        ]
        .into();

        let record = collect_at(&scenario_schema(), &raw, noon());

        assert_eq!(record.value("mood"), Some(&FieldValue::Int(7)));
        assert_eq!(record.value("allergy_state"), Some(&FieldValue::Int(1)));
        let expected: BTreeMap<String, u8> = [("gaming".to_string(), 0), ("reading".to_string(), 1)].into();
        assert_eq!(record.value("daily_activities"), Some(&FieldValue::Flags(expected)));
        assert_eq!(record.date, NaiveDate::from_ymd_opt(2026, 3, 14).unwrap());
        assert_eq!(record.timestamp, noon());
    }

    #[test]
    fn empty_snapshot_gives_all_null_fields() {
        let schema = health_schema().unwrap();
        let raw = BTreeMap::new();
        let record = collect_at(&schema, &raw, noon());

        assert_eq!(record.fields.len(), schema.len());
        assert!(record.fields.values().all(Option::is_none));
        assert_eq!(record.missing_required(&schema).len(), schema.iter().filter(|d| d.required).count());
    }

    #[test]
    fn collect_is_deterministic_for_frozen_clock() {
        let schema = scenario_schema();
        let raw: BTreeMap<String, RawValue> = [("mood".to_string(), RawValue::scalar("3"))].into();
        assert_eq!(collect_at(&schema, &raw, noon()), collect_at(&schema, &raw, noon()));
    }

    #[test]
    fn restore_then_collect_round_trips_values() {
        let schema = scenario_schema();
        let raw: BTreeMap<String, RawValue> = [
            ("mood".to_string(), RawValue::scalar("9")),
            ("allergy_state".to_string(), RawValue::scalar("face")),
            ("daily_activities".to_string(), RawValue::selection(["gaming", "reading"])),
        ]
        .into();
        let original = collect_at(&schema, &raw, noon());

        let mut controls: BTreeMap<String, RawValue> = BTreeMap::new();
        assert_eq!(restore(&schema, &original, &mut controls), 3);
        assert_eq!(controls.get("allergy_state"), Some(&RawValue::scalar("face")));

        let later = noon() + chrono::Duration::hours(1);
        let restored = collect_at(&schema, &controls, later);
        assert_eq!(restored.fields, original.fields);
    }

    #[test]
    fn restore_leaves_absent_fields_untouched() {
        let schema = scenario_schema();
        let mut controls: BTreeMap<String, RawValue> =
            [("mood".to_string(), RawValue::scalar("2"))].into();
        let record = Record {
            date: noon().date_naive(),
            timestamp: noon(),
            uid: None,
            fields: [
                ("mood".to_string(), None),
                ("allergy_state".to_string(), Some(FieldValue::Int(1))),
            ]
            .into(),
        };

        assert_eq!(restore(&schema, &record, &mut controls), 1);
        assert_eq!(controls.get("mood"), Some(&RawValue::scalar("2")));
        assert_eq!(controls.get("allergy_state"), Some(&RawValue::scalar("other")));
    }

    #[test]
    fn nan_fields_are_reported() {
        let schema = scenario_schema();
        let raw: BTreeMap<String, RawValue> = [("mood".to_string(), RawValue::scalar("high"))].into();
        let record = collect_at(&schema, &raw, noon());
        assert_eq!(record.invalid_fields(), vec!["mood"]);
    }

    #[test]
    fn record_serializes_flat_with_iso_timestamp() {
        let schema = scenario_schema();
        let raw: BTreeMap<String, RawValue> = [("mood".to_string(), RawValue::scalar("4"))].into();
        let mut record = collect_at(&schema, &raw, noon());
        let user = UserId::resolve(
            &UserConfig::default(),
            IdSources { query: Some("u-42"), persisted: None },
        );
        record.tag(&user);

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["date"], "2026-03-14");
        assert_eq!(json["timestamp"], "2026-03-14T12:30:00.000Z");
        assert_eq!(json["uid"], "u-42");
        assert_eq!(json["mood"], 4);
        assert!(json["allergy_state"].is_null());

        let back: Record = serde_json::from_value(json).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn stored_entry_restores_known_fields() {
        let json = r#"{
            "id": "4f1c",
            "date": "2026-01-05",
            "timestamp": "2026-01-05T20:15:00.123456",
            "mood": 2.0,
            "allergy_state": 2,
            "daily_activities": {"gaming": true, "reading": 0},
            "daily_comments": null,
            "extra": [1]
        }"#;
        let record: Record = serde_json::from_str(json).unwrap();

        let expected = Utc.with_ymd_and_hms(2026, 1, 5, 20, 15, 0).unwrap()
            + chrono::Duration::microseconds(123_456);
        assert_eq!(record.timestamp, expected);
        assert_eq!(record.uid, None);
        assert!(!record.fields.contains_key("mood"));
        assert!(!record.fields.contains_key("extra"));
        assert_eq!(record.fields.get("daily_comments"), Some(&None));
        assert_eq!(record.value("id"), Some(&FieldValue::Text("4f1c".into())));

        let schema = scenario_schema();
        let mut controls: BTreeMap<String, RawValue> =
            [("mood".to_string(), RawValue::scalar("5"))].into();
        assert_eq!(restore(&schema, &record, &mut controls), 2);
        assert_eq!(controls.get("mood"), Some(&RawValue::scalar("5")));
        assert_eq!(controls.get("allergy_state"), Some(&RawValue::scalar("face")));
        assert_eq!(controls.get("daily_activities"), Some(&RawValue::selection(["gaming"])));
        assert!(!controls.contains_key("id"));
    }

    #[test]
    fn offset_timestamps_are_normalized_to_utc() {
        let json = r#"{"date":"2026-01-05","timestamp":"2026-01-05T21:15:00.000+01:00","mood":3}"#;
        let record: Record = serde_json::from_str(json).unwrap();
        assert_eq!(record.timestamp, Utc.with_ymd_and_hms(2026, 1, 5, 20, 15, 0).unwrap());
        assert_eq!(record.value("mood"), Some(&FieldValue::Int(3)));
    }
}
