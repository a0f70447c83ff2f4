//! Schema validation for contact submissions.
//!
//! Turns a raw JSON body into a typed `ContactSubmission` or a list of
//! field-level errors. Field errors are logged server-side only; callers
//! surface a generic message so the public endpoint does not leak schema
//! details.

use crate::models::{
    BudgetRange, ContactSubmission, DataSensitivity, Industry, LegacyMessage, ProjectUrgency,
    RoiParams, TeamSize, Tool,
};
use regex::Regex;
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use std::fmt;

/// Submissions faster than this are treated as bot traffic.
pub const MIN_TTS_SECONDS: f64 = 5.0;
pub const VISION_MIN_CHARS: usize = 20;
pub const VISION_MAX_CHARS: usize = 1500;
pub const NAME_MIN_CHARS: usize = 2;
pub const LEGACY_MESSAGE_MIN_CHARS: usize = 10;

/// One schema violation, tied to the offending field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate email address format.
///
/// Checks minimum length, presence of `@` and a dot, and an RFC 5322
/// simplified pattern.
pub fn is_valid_email(email: &str) -> bool {
    // Basic checks
    if email.len() < 5 || !email.contains('@') || !email.contains('.') {
        return false;
    }

    // RFC 5322 simplified email regex
    // Matches: local@domain.tld
    let email_regex = Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$"
    ).unwrap();

    email_regex.is_match(email)
}

/// Detect the site's original minimal contact payload: exactly
/// `{name, email, message}` and nothing else.
pub fn is_legacy_minimal(value: &Value) -> bool {
    let Some(obj) = value.as_object() else {
        return false;
    };
    obj.contains_key("name")
        && obj.contains_key("email")
        && obj.contains_key("message")
        && obj
            .keys()
            .all(|k| matches!(k.as_str(), "name" | "email" | "message"))
}

/// Validate a minimal legacy payload.
pub fn validate_legacy_minimal(value: &Value) -> Result<LegacyMessage, Vec<FieldError>> {
    let legacy: LegacyMessage = serde_json::from_value(value.clone()).map_err(|e| {
        vec![FieldError::new(
            "body",
            format!("malformed legacy payload: {}", e),
        )]
    })?;

    let mut errors = Vec::new();
    if legacy.name.trim().chars().count() < NAME_MIN_CHARS {
        errors.push(FieldError::new("name", "must be at least 2 characters"));
    }
    if !is_valid_email(legacy.email.trim()) {
        errors.push(FieldError::new("email", "must be a valid email address"));
    }
    if legacy.message.trim().chars().count() < LEGACY_MESSAGE_MIN_CHARS {
        errors.push(FieldError::new(
            "message",
            "must be at least 10 characters",
        ));
    }

    if errors.is_empty() {
        Ok(legacy)
    } else {
        Err(errors)
    }
}

/// Whether a payload uses the older field names and needs remapping before
/// full validation. Strict-minimal payloads short-circuit earlier and never
/// reach this point in the handler.
pub fn needs_legacy_remap(value: &Value) -> bool {
    value
        .get("message")
        .is_some_and(Value::is_string)
        && value.get("vision").is_none()
}

/// Remap an older payload shape onto the current schema.
///
/// `fullName` falls back to `name`, `vision` is taken from `message`, and the
/// now-required option fields are filled with the lowest-commitment bucket of
/// each set so a remapped lead never overstates intent. The legacy client
/// predates the submit timer, so `tts` defaults to the minimum passing value.
pub fn remap_legacy(value: &Value) -> Value {
    let Some(obj) = value.as_object() else {
        return value.clone();
    };

    let mut mapped: Map<String, Value> = obj.clone();
    if !mapped.contains_key("fullName") {
        if let Some(name) = obj.get("name").cloned() {
            mapped.insert("fullName".to_string(), name);
        }
    }
    if let Some(message) = obj.get("message").cloned() {
        mapped.insert("vision".to_string(), message);
    }
    mapped.remove("name");
    mapped.remove("message");

    let defaults = [
        ("industry", json!("Other")),
        ("teamSize", json!("1–5")),
        ("dataSensitivity", json!("Low")),
        ("budgetRange", json!("<$5k")),
        ("projectUrgency", json!("Exploring")),
        ("tts", json!(MIN_TTS_SECONDS)),
    ];
    for (field, default) in defaults {
        mapped.entry(field.to_string()).or_insert(default);
    }

    Value::Object(mapped)
}

/// Partially-validated fields, assembled while errors accumulate.
#[derive(Default)]
struct Draft {
    full_name: Option<String>,
    email: Option<String>,
    company: Option<String>,
    industry: Option<Industry>,
    team_size: Option<TeamSize>,
    data_sensitivity: Option<DataSensitivity>,
    budget_range: Option<BudgetRange>,
    project_urgency: Option<ProjectUrgency>,
    vision: Option<String>,
    tools: Vec<Tool>,
    roi: Option<RoiParams>,
    utm: BTreeMap<String, String>,
    honeypot: String,
    time_to_submit: Option<f64>,
}

impl Draft {
    fn finish(self) -> Option<ContactSubmission> {
        Some(ContactSubmission {
            full_name: self.full_name?,
            email: self.email?,
            company: self.company,
            industry: self.industry?,
            team_size: self.team_size?,
            data_sensitivity: self.data_sensitivity?,
            budget_range: self.budget_range?,
            project_urgency: self.project_urgency?,
            vision: self.vision?,
            tools: self.tools,
            roi: self.roi,
            utm: self.utm,
            honeypot: self.honeypot,
            time_to_submit: self.time_to_submit?,
        })
    }
}

/// Validate a raw payload against the full contact schema.
///
/// Returns the typed submission, or every field violation found. The
/// `tts >= 5` spam threshold is deliberately not enforced here; the handler
/// applies it after validation so it can answer with its dedicated message.
pub fn validate(value: &Value) -> Result<ContactSubmission, Vec<FieldError>> {
    let Some(obj) = value.as_object() else {
        return Err(vec![FieldError::new("body", "expected a JSON object")]);
    };

    let mut errors = Vec::new();
    let mut draft = Draft::default();

    match obj.get("fullName").and_then(Value::as_str) {
        Some(name) if name.trim().chars().count() >= NAME_MIN_CHARS => {
            draft.full_name = Some(name.trim().to_string());
        }
        Some(_) => errors.push(FieldError::new("fullName", "must be at least 2 characters")),
        None => errors.push(FieldError::new("fullName", "is required")),
    }

    match obj.get("email").and_then(Value::as_str) {
        Some(email) if is_valid_email(email.trim()) => {
            draft.email = Some(email.trim().to_lowercase());
        }
        Some(_) => errors.push(FieldError::new("email", "must be a valid email address")),
        None => errors.push(FieldError::new("email", "is required")),
    }

    match obj.get("company") {
        None | Some(Value::Null) => {}
        Some(Value::String(company)) => {
            let trimmed = company.trim();
            if !trimmed.is_empty() {
                draft.company = Some(trimmed.to_string());
            }
        }
        Some(_) => errors.push(FieldError::new("company", "must be a string")),
    }

    draft.industry = required_option(obj, "industry", Industry::parse, Industry::ALL, &mut errors);
    draft.team_size = required_option(obj, "teamSize", TeamSize::parse, TeamSize::ALL, &mut errors);
    draft.data_sensitivity = required_option(
        obj,
        "dataSensitivity",
        DataSensitivity::parse,
        DataSensitivity::ALL,
        &mut errors,
    );
    draft.budget_range = required_option(
        obj,
        "budgetRange",
        BudgetRange::parse,
        BudgetRange::ALL,
        &mut errors,
    );
    draft.project_urgency = required_option(
        obj,
        "projectUrgency",
        ProjectUrgency::parse,
        ProjectUrgency::ALL,
        &mut errors,
    );

    match obj.get("vision").and_then(Value::as_str) {
        Some(vision) => {
            let trimmed = vision.trim();
            let len = trimmed.chars().count();
            if (VISION_MIN_CHARS..=VISION_MAX_CHARS).contains(&len) {
                draft.vision = Some(trimmed.to_string());
            } else {
                errors.push(FieldError::new(
                    "vision",
                    format!(
                        "must be between {} and {} characters",
                        VISION_MIN_CHARS, VISION_MAX_CHARS
                    ),
                ));
            }
        }
        None => errors.push(FieldError::new("vision", "is required")),
    }

    match obj.get("tools") {
        None | Some(Value::Null) => {}
        Some(Value::Array(items)) => {
            for (index, item) in items.iter().enumerate() {
                match item.as_str().and_then(Tool::parse) {
                    Some(tool) => draft.tools.push(tool),
                    None => errors.push(FieldError::new(
                        format!("tools[{}]", index),
                        format!("must be one of: {}", Tool::ALL.join(", ")),
                    )),
                }
            }
        }
        Some(_) => errors.push(FieldError::new("tools", "must be an array")),
    }

    match obj.get("roi") {
        None | Some(Value::Null) => {}
        Some(Value::Object(roi_obj)) => {
            draft.roi = Some(RoiParams {
                hourly_rate: optional_number(roi_obj, "hourlyRate", "roi.hourlyRate", &mut errors),
                revenue_impact: optional_number(
                    roi_obj,
                    "revenueImpact",
                    "roi.revenueImpact",
                    &mut errors,
                ),
                weekly_hours: optional_number(
                    roi_obj,
                    "weeklyHours",
                    "roi.weeklyHours",
                    &mut errors,
                ),
                productivity_multiplier: optional_number(
                    roi_obj,
                    "productivityMultiplier",
                    "roi.productivityMultiplier",
                    &mut errors,
                ),
            });
        }
        Some(_) => errors.push(FieldError::new("roi", "must be an object")),
    }

    match obj.get("utm") {
        None | Some(Value::Null) => {}
        Some(Value::Object(utm_obj)) => {
            for (key, val) in utm_obj {
                match val.as_str() {
                    Some(s) => {
                        draft.utm.insert(key.clone(), s.to_string());
                    }
                    None => errors.push(FieldError::new(
                        format!("utm.{}", key),
                        "must be a string",
                    )),
                }
            }
        }
        Some(_) => errors.push(FieldError::new("utm", "must be an object")),
    }

    match obj.get("hp") {
        None | Some(Value::Null) => {}
        Some(Value::String(hp)) => draft.honeypot = hp.clone(),
        Some(_) => errors.push(FieldError::new("hp", "must be a string")),
    }

    match obj.get("tts").and_then(Value::as_f64) {
        Some(tts) if tts >= 0.0 => draft.time_to_submit = Some(tts),
        Some(_) => errors.push(FieldError::new("tts", "must be a non-negative number")),
        None => errors.push(FieldError::new("tts", "is required and must be a number")),
    }

    if errors.is_empty() {
        draft
            .finish()
            .ok_or_else(|| vec![FieldError::new("body", "incomplete submission")])
    } else {
        Err(errors)
    }
}

/// Validate one required enumerated field against its allowed set.
fn required_option<T>(
    obj: &Map<String, Value>,
    field: &str,
    parse: fn(&str) -> Option<T>,
    allowed: &[&str],
    errors: &mut Vec<FieldError>,
) -> Option<T> {
    match obj.get(field).and_then(Value::as_str) {
        Some(raw) => match parse(raw) {
            Some(parsed) => Some(parsed),
            None => {
                errors.push(FieldError::new(
                    field,
                    format!("must be one of: {}", allowed.join(", ")),
                ));
                None
            }
        },
        None => {
            errors.push(FieldError::new(field, "is required"));
            None
        }
    }
}

fn optional_number(
    obj: &Map<String, Value>,
    key: &str,
    field: &str,
    errors: &mut Vec<FieldError>,
) -> Option<f64> {
    match obj.get(key) {
        None | Some(Value::Null) => None,
        Some(value) => match value.as_f64() {
            Some(number) => Some(number),
            None => {
                errors.push(FieldError::new(field, "must be a number"));
                None
            }
        },
    }
}
