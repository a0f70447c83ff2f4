use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::ToSchema;
use uuid::Uuid;

// ============ Form Option Sets ============

/// Industry sector options offered by the contact form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum Industry {
    #[serde(rename = "E-commerce")]
    Ecommerce,
    #[serde(rename = "SaaS")]
    Saas,
    Healthcare,
    Finance,
    Legal,
    #[serde(rename = "Real Estate")]
    RealEstate,
    Manufacturing,
    Retail,
    Education,
    Other,
}

impl Industry {
    /// Allowed wire values, in form display order.
    pub const ALL: &'static [&'static str] = &[
        "E-commerce",
        "SaaS",
        "Healthcare",
        "Finance",
        "Legal",
        "Real Estate",
        "Manufacturing",
        "Retail",
        "Education",
        "Other",
    ];

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "E-commerce" => Some(Self::Ecommerce),
            "SaaS" => Some(Self::Saas),
            "Healthcare" => Some(Self::Healthcare),
            "Finance" => Some(Self::Finance),
            "Legal" => Some(Self::Legal),
            "Real Estate" => Some(Self::RealEstate),
            "Manufacturing" => Some(Self::Manufacturing),
            "Retail" => Some(Self::Retail),
            "Education" => Some(Self::Education),
            "Other" => Some(Self::Other),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ecommerce => "E-commerce",
            Self::Saas => "SaaS",
            Self::Healthcare => "Healthcare",
            Self::Finance => "Finance",
            Self::Legal => "Legal",
            Self::RealEstate => "Real Estate",
            Self::Manufacturing => "Manufacturing",
            Self::Retail => "Retail",
            Self::Education => "Education",
            Self::Other => "Other",
        }
    }
}

/// Team size brackets. Wire values use an en dash, matching the form labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum TeamSize {
    #[serde(rename = "1–5")]
    Micro,
    #[serde(rename = "6–20")]
    Small,
    #[serde(rename = "21–50")]
    Medium,
    #[serde(rename = "51–200")]
    Large,
    #[serde(rename = "200+")]
    Enterprise,
}

impl TeamSize {
    pub const ALL: &'static [&'static str] = &["1–5", "6–20", "21–50", "51–200", "200+"];

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "1–5" => Some(Self::Micro),
            "6–20" => Some(Self::Small),
            "21–50" => Some(Self::Medium),
            "51–200" => Some(Self::Large),
            "200+" => Some(Self::Enterprise),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Micro => "1–5",
            Self::Small => "6–20",
            Self::Medium => "21–50",
            Self::Large => "51–200",
            Self::Enterprise => "200+",
        }
    }
}

/// How sensitive the data involved in the project is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum DataSensitivity {
    Low,
    Medium,
    High,
}

impl DataSensitivity {
    pub const ALL: &'static [&'static str] = &["Low", "Medium", "High"];

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "Low" => Some(Self::Low),
            "Medium" => Some(Self::Medium),
            "High" => Some(Self::High),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
        }
    }
}

/// Budget brackets offered by the form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum BudgetRange {
    #[serde(rename = "<$5k")]
    Under5k,
    #[serde(rename = "$5k–$15k")]
    UpTo15k,
    #[serde(rename = "$15k–$50k")]
    UpTo50k,
    #[serde(rename = "$50k+")]
    Over50k,
}

impl BudgetRange {
    pub const ALL: &'static [&'static str] = &["<$5k", "$5k–$15k", "$15k–$50k", "$50k+"];

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "<$5k" => Some(Self::Under5k),
            "$5k–$15k" => Some(Self::UpTo15k),
            "$15k–$50k" => Some(Self::UpTo50k),
            "$50k+" => Some(Self::Over50k),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Under5k => "<$5k",
            Self::UpTo15k => "$5k–$15k",
            Self::UpTo50k => "$15k–$50k",
            Self::Over50k => "$50k+",
        }
    }
}

/// How soon the requester wants to start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum ProjectUrgency {
    Exploring,
    #[serde(rename = "This quarter")]
    ThisQuarter,
    #[serde(rename = "ASAP")]
    Asap,
}

impl ProjectUrgency {
    pub const ALL: &'static [&'static str] = &["Exploring", "This quarter", "ASAP"];

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "Exploring" => Some(Self::Exploring),
            "This quarter" => Some(Self::ThisQuarter),
            "ASAP" => Some(Self::Asap),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Exploring => "Exploring",
            Self::ThisQuarter => "This quarter",
            Self::Asap => "ASAP",
        }
    }
}

/// Tools the requester's team already uses (multi-select).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum Tool {
    Spreadsheets,
    #[serde(rename = "CRM")]
    Crm,
    Slack,
    Notion,
    Zapier,
    #[serde(rename = "Custom software")]
    CustomSoftware,
    Other,
}

impl Tool {
    pub const ALL: &'static [&'static str] = &[
        "Spreadsheets",
        "CRM",
        "Slack",
        "Notion",
        "Zapier",
        "Custom software",
        "Other",
    ];

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "Spreadsheets" => Some(Self::Spreadsheets),
            "CRM" => Some(Self::Crm),
            "Slack" => Some(Self::Slack),
            "Notion" => Some(Self::Notion),
            "Zapier" => Some(Self::Zapier),
            "Custom software" => Some(Self::CustomSoftware),
            "Other" => Some(Self::Other),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Spreadsheets => "Spreadsheets",
            Self::Crm => "CRM",
            Self::Slack => "Slack",
            Self::Notion => "Notion",
            Self::Zapier => "Zapier",
            Self::CustomSoftware => "Custom software",
            Self::Other => "Other",
        }
    }
}

// ============ Submission ============

/// Optional ROI calculator inputs carried along with a submission.
///
/// All fields are independently optional; the calculator only forwards the
/// values the visitor actually filled in.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RoiParams {
    pub hourly_rate: Option<f64>,
    pub revenue_impact: Option<f64>,
    pub weekly_hours: Option<f64>,
    pub productivity_multiplier: Option<f64>,
}

impl RoiParams {
    pub fn is_empty(&self) -> bool {
        self.hourly_rate.is_none()
            && self.revenue_impact.is_none()
            && self.weekly_hours.is_none()
            && self.productivity_multiplier.is_none()
    }
}

/// A contact-form submission that passed schema validation.
///
/// Constructed by `validation::validate`; the raw request body never reaches
/// the dispatchers.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ContactSubmission {
    pub full_name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    pub industry: Industry,
    pub team_size: TeamSize,
    pub data_sensitivity: DataSensitivity,
    pub budget_range: BudgetRange,
    pub project_urgency: ProjectUrgency,
    /// What the requester wants to build or automate, 20-1500 characters.
    pub vision: String,
    #[serde(default)]
    pub tools: Vec<Tool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roi: Option<RoiParams>,
    /// Campaign attribution parameters, passed through as-is.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub utm: BTreeMap<String, String>,
    /// Hidden field that legitimate users never fill in.
    #[serde(default, rename = "hp")]
    pub honeypot: String,
    /// Seconds between form render and submit.
    #[serde(rename = "tts")]
    pub time_to_submit: f64,
}

/// Request metadata attached to a validated submission. Not user-supplied.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InquiryMeta {
    /// Reference ID used in notifications and logs.
    pub reference: Uuid,
    pub client_ip: String,
    pub user_agent: Option<String>,
    pub received_at: DateTime<Utc>,
    pub has_roi: bool,
    pub utm_keys: usize,
}

/// A validated submission enriched with request metadata, ready for dispatch.
///
/// Lives only for the duration of one request; accepted inquiries are
/// forwarded to the notification channels and never stored.
#[derive(Debug, Clone, Serialize)]
pub struct Inquiry {
    #[serde(flatten)]
    pub submission: ContactSubmission,
    pub meta: InquiryMeta,
}

impl Inquiry {
    pub fn new(
        submission: ContactSubmission,
        client_ip: String,
        user_agent: Option<String>,
    ) -> Self {
        let meta = InquiryMeta {
            reference: Uuid::new_v4(),
            client_ip,
            user_agent,
            received_at: Utc::now(),
            has_roi: submission.roi.as_ref().is_some_and(|r| !r.is_empty()),
            utm_keys: submission.utm.len(),
        };
        Self { submission, meta }
    }

    /// Short form of the reference ID for subject lines and log messages.
    pub fn short_ref(&self) -> String {
        self.meta.reference.to_string()[..8].to_string()
    }
}

// ============ Responses ============

/// Uniform success body for the contact endpoint.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ContactResponse {
    pub ok: bool,
}

impl ContactResponse {
    pub fn accepted() -> Self {
        Self { ok: true }
    }
}

/// Booking-page configuration exposed to the static frontend.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookingConfig {
    /// "embed" when a scheduler embed URL is configured, "form" otherwise.
    pub mode: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embed_url: Option<String>,
}

// ============ Legacy Payloads ============

/// The minimal payload shape sent by the site's original contact form.
#[derive(Debug, Clone, Deserialize)]
pub struct LegacyMessage {
    pub name: String,
    pub email: String,
    pub message: String,
}
