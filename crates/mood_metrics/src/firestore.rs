//! Firestore REST document encoding for mood records.
//!
//! Firestore wraps every field in a typed value (`{"stringValue": ..}`,
//! `{"integerValue": "3"}`, ...). Integers travel as strings.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Deserialize;
use serde_json::{Map, Value, json};

use crate::{MoodError, MoodPatch, MoodRecord, MoodValue, NewMoodRecord};

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub name: String,
    #[serde(default)]
    pub fields: Map<String, Value>,
    pub create_time: Option<String>,
    pub update_time: Option<String>,
}

/// One element of a `:runQuery` response stream. Elements without a document
/// only carry read metadata.
#[derive(Clone, Debug, Deserialize)]
pub struct RunQueryItem {
    pub document: Option<Document>,
}

/// Last path segment of a document name.
pub fn document_id(name: &str) -> &str {
    name.rsplit('/').next().unwrap_or(name)
}

pub fn string_value(s: &str) -> Value {
    json!({ "stringValue": s })
}

pub fn integer_value(i: i64) -> Value {
    json!({ "integerValue": i.to_string() })
}

pub fn double_value(f: f64) -> Value {
    json!({ "doubleValue": f })
}

pub fn timestamp_value(ts: DateTime<Utc>) -> Value {
    json!({ "timestampValue": ts.to_rfc3339_opts(SecondsFormat::Micros, true) })
}

pub fn string_array_value(items: &[String]) -> Value {
    let values: Vec<Value> = items.iter().map(|s| string_value(s)).collect();
    json!({ "arrayValue": { "values": values } })
}

/// Structured query for one user's records created at or after `since`,
/// oldest first with document name as tie-break.
pub fn records_since_query(collection: &str, user_id: &str, since: DateTime<Utc>) -> Value {
    json!({
        "structuredQuery": {
            "from": [{ "collectionId": collection }],
            "where": {
                "compositeFilter": {
                    "op": "AND",
                    "filters": [
                        {
                            "fieldFilter": {
                                "field": { "fieldPath": "userId" },
                                "op": "EQUAL",
                                "value": string_value(user_id)
                            }
                        },
                        {
                            "fieldFilter": {
                                "field": { "fieldPath": "createdAt" },
                                "op": "GREATER_THAN_OR_EQUAL",
                                "value": timestamp_value(since)
                            }
                        }
                    ]
                }
            },
            "orderBy": [
                { "field": { "fieldPath": "createdAt" }, "direction": "ASCENDING" },
                { "field": { "fieldPath": "__name__" }, "direction": "ASCENDING" }
            ]
        }
    })
}

fn put_metrics(
    fields: &mut Map<String, Value>,
    sleep_hours: Option<f64>,
    stress_level: Option<u8>,
    water_intake_liters: Option<f64>,
) {
    if let Some(v) = sleep_hours {
        fields.insert("sleepHours".into(), double_value(v));
    }
    if let Some(v) = stress_level {
        fields.insert("stressLevel".into(), integer_value(i64::from(v)));
    }
    if let Some(v) = water_intake_liters {
        fields.insert("waterIntakeLiters".into(), double_value(v));
    }
}

pub fn encode_new(record: &NewMoodRecord, now: DateTime<Utc>) -> Map<String, Value> {
    let mut fields = Map::new();
    fields.insert("userId".into(), string_value(&record.user_id));
    if let Some(m) = record.mood {
        fields.insert("mood".into(), string_value(m.as_str()));
    }
    if let Some(note) = &record.note {
        fields.insert("note".into(), string_value(note));
    }
    fields.insert("tags".into(), string_array_value(&record.tags));
    put_metrics(
        &mut fields,
        record.sleep_hours,
        record.stress_level,
        record.water_intake_liters,
    );
    fields.insert("createdAt".into(), timestamp_value(now));
    fields.insert("updatedAt".into(), timestamp_value(now));
    fields
}

/// Fields for a PATCH and the matching update mask, `updatedAt` included.
pub fn encode_patch(
    patch: &MoodPatch,
    now: DateTime<Utc>,
) -> (Map<String, Value>, Vec<&'static str>) {
    let mut fields = Map::new();
    if let Some(m) = patch.mood {
        fields.insert("mood".into(), string_value(m.as_str()));
    }
    if let Some(note) = &patch.note {
        fields.insert("note".into(), string_value(note));
    }
    if let Some(tags) = &patch.tags {
        fields.insert("tags".into(), string_array_value(tags));
    }
    put_metrics(
        &mut fields,
        patch.sleep_hours,
        patch.stress_level,
        patch.water_intake_liters,
    );
    fields.insert("updatedAt".into(), timestamp_value(now));

    let mut mask = patch.field_paths();
    mask.push("updatedAt");
    (fields, mask)
}

fn as_str(v: &Value) -> Option<&str> {
    v.get("stringValue").and_then(Value::as_str)
}

fn as_i64(v: &Value) -> Option<i64> {
    match v.get("integerValue")? {
        Value::String(s) => s.parse().ok(),
        Value::Number(n) => n.as_i64(),
        _ => None,
    }
}

fn as_f64(v: &Value) -> Option<f64> {
    if let Some(d) = v.get("doubleValue").and_then(Value::as_f64) {
        return Some(d);
    }
    as_i64(v).map(|i| i as f64)
}

fn parse_ts(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

fn as_timestamp(v: &Value) -> Option<DateTime<Utc>> {
    v.get("timestampValue")
        .and_then(Value::as_str)
        .or_else(|| as_str(v))
        .and_then(parse_ts)
}

fn is_null(v: &Value) -> bool {
    v.get("nullValue").is_some()
}

fn decode_mood(v: &Value) -> Option<MoodValue> {
    if is_null(v) {
        return None;
    }
    if let Some(s) = as_str(v) {
        return Some(MoodValue::parse(s));
    }
    if let Some(i) = as_i64(v) {
        return Some(MoodValue::from_score(i));
    }
    Some(MoodValue::Unrecognized(v.to_string()))
}

fn decode_stress(v: &Value, id: &str) -> Result<Option<u8>, MoodError> {
    if is_null(v) {
        return Ok(None);
    }
    let raw = match as_i64(v) {
        Some(i) => i,
        None => match v.get("doubleValue").and_then(Value::as_f64) {
            Some(d) if d.fract() == 0.0 => d as i64,
            _ => {
                return Err(MoodError::Decode(format!(
                    "{id}: stressLevel is not an integer: {v}"
                )));
            }
        },
    };
    u8::try_from(raw)
        .map(Some)
        .map_err(|_| MoodError::Decode(format!("{id}: stressLevel {raw} out of range")))
}

/// Decode a stored document. Accepts the legacy field names the mobile app
/// wrote (`notes`, `waterIntake`) and its localized mood labels.
pub fn decode_document(doc: Document) -> Result<MoodRecord, MoodError> {
    let id = document_id(&doc.name).to_string();
    let f = &doc.fields;

    let user_id = f
        .get("userId")
        .and_then(as_str)
        .ok_or_else(|| MoodError::Decode(format!("{id}: missing userId")))?
        .to_string();

    let created_at = f
        .get("createdAt")
        .and_then(as_timestamp)
        .or_else(|| doc.create_time.as_deref().and_then(parse_ts))
        .ok_or_else(|| MoodError::Decode(format!("{id}: missing createdAt")))?;
    let updated_at = f
        .get("updatedAt")
        .and_then(as_timestamp)
        .or_else(|| doc.update_time.as_deref().and_then(parse_ts))
        .unwrap_or(created_at);

    let tags = f
        .get("tags")
        .and_then(|v| v.get("arrayValue"))
        .and_then(|a| a.get("values"))
        .and_then(Value::as_array)
        .map(|values| {
            values
                .iter()
                .filter_map(as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    let stress_level = match f.get("stressLevel") {
        Some(v) => decode_stress(v, &id)?,
        None => None,
    };

    Ok(MoodRecord {
        user_id,
        mood: f.get("mood").and_then(decode_mood),
        note: f
            .get("note")
            .or_else(|| f.get("notes"))
            .and_then(as_str)
            .map(str::to_string),
        tags,
        sleep_hours: f.get("sleepHours").and_then(as_f64),
        stress_level,
        water_intake_liters: f
            .get("waterIntakeLiters")
            .or_else(|| f.get("waterIntake"))
            .and_then(as_f64),
        created_at,
        updated_at,
        id,
    })
}
