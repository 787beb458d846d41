use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

// ============================================================================
// Status
// ============================================================================

/// Ordered (but branching) lifecycle of a Job Record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    New,
    Scoring,
    FilteredOut,
    Extracting,
    Generating,
    BoostDeciding,
    PendingApproval,
    Approved,
    Rejected,
    Editing,
    Submitted,
    SubmissionFailed,
    Error,
}

impl JobStatus {
    /// Whether `self -> next` is a legal transition under the status graph
    /// in spec §4.7. `error` is reachable from any non-terminal state; the
    /// callback edges from `pending_approval` are the only non-monotonic
    /// moves besides `editing -> pending_approval`.
    pub fn can_advance_to(self, next: JobStatus) -> bool {
        use JobStatus::*;
        if next == Error {
            return !matches!(self, Submitted | SubmissionFailed | Error);
        }
        matches!(
            (self, next),
            (New, Scoring)
                | (Scoring, FilteredOut)
                | (Scoring, Extracting)
                | (FilteredOut, FilteredOut)
                | (Extracting, Generating)
                | (Generating, BoostDeciding)
                | (BoostDeciding, PendingApproval)
                | (PendingApproval, Approved)
                | (PendingApproval, Rejected)
                | (PendingApproval, Editing)
                | (Editing, PendingApproval)
                | (Approved, Submitted)
                | (Approved, SubmissionFailed)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::New => "new",
            JobStatus::Scoring => "scoring",
            JobStatus::FilteredOut => "filtered_out",
            JobStatus::Extracting => "extracting",
            JobStatus::Generating => "generating",
            JobStatus::BoostDeciding => "boost_deciding",
            JobStatus::PendingApproval => "pending_approval",
            JobStatus::Approved => "approved",
            JobStatus::Rejected => "rejected",
            JobStatus::Editing => "editing",
            JobStatus::Submitted => "submitted",
            JobStatus::SubmissionFailed => "submission_failed",
            JobStatus::Error => "error",
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for JobStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "new" => Ok(JobStatus::New),
            "scoring" => Ok(JobStatus::Scoring),
            "filtered_out" => Ok(JobStatus::FilteredOut),
            "extracting" => Ok(JobStatus::Extracting),
            "generating" => Ok(JobStatus::Generating),
            "boost_deciding" => Ok(JobStatus::BoostDeciding),
            "pending_approval" => Ok(JobStatus::PendingApproval),
            "approved" => Ok(JobStatus::Approved),
            "rejected" => Ok(JobStatus::Rejected),
            "editing" => Ok(JobStatus::Editing),
            "submitted" => Ok(JobStatus::Submitted),
            "submission_failed" => Ok(JobStatus::SubmissionFailed),
            "error" => Ok(JobStatus::Error),
            other => Err(format!("unknown job status: {other}")),
        }
    }
}

/// Source a Job Record was ingested from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Apify,
    Gmail,
    Manual,
}

impl std::fmt::Display for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Source::Apify => "apify",
            Source::Gmail => "gmail",
            Source::Manual => "manual",
        };
        write!(f, "{}", s)
    }
}

impl std::str::FromStr for Source {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "apify" => Ok(Source::Apify),
            "gmail" => Ok(Source::Gmail),
            "manual" => Ok(Source::Manual),
            other => Err(format!("unknown source adapter: {other}")),
        }
    }
}

// ============================================================================
// Budget / client / attachments
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BudgetType {
    Fixed,
    Hourly,
    Unknown,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BudgetInfo {
    pub budget_type: Option<BudgetType>,
    pub budget_min: Option<f64>,
    pub budget_max: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClientInfo {
    pub country: Option<String>,
    pub total_spent: Option<f64>,
    pub hires: Option<u32>,
    pub payment_verified: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attachment {
    pub filename: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub local_path: Option<String>,
    #[serde(default)]
    pub extracted_text: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContactConfidence {
    High,
    Medium,
    Low,
}

impl std::str::FromStr for ContactConfidence {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "high" => Ok(ContactConfidence::High),
            "medium" => Ok(ContactConfidence::Medium),
            "low" => Ok(ContactConfidence::Low),
            other => Err(format!("unknown contact confidence: {other}")),
        }
    }
}

impl std::str::FromStr for BudgetType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "fixed" => Ok(BudgetType::Fixed),
            "hourly" => Ok(BudgetType::Hourly),
            "unknown" => Ok(BudgetType::Unknown),
            other => Err(format!("unknown budget type: {other}")),
        }
    }
}

// ============================================================================
// Job Record
// ============================================================================

/// The single entity that threads the pipeline. Every field is explicit;
/// `Option<T>` stands in for the "not yet known" bottom value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobRecord {
    // Identity
    pub job_id: String,
    pub url: String,
    pub source: Source,

    // Status
    pub status: JobStatus,

    // Ingested fields
    pub title: String,
    pub description: String,
    pub skills: Vec<String>,

    // Scoring fields
    pub fit_score: Option<u8>,
    pub fit_reasoning: Option<String>,

    // Extracted fields
    pub budget: BudgetInfo,
    pub client: ClientInfo,
    pub attachments: Vec<Attachment>,
    pub attachment_content: Option<String>,

    // Deliverable fields
    pub proposal_doc_url: Option<String>,
    pub proposal_text: Option<String>,
    pub video_url: Option<String>,
    pub pdf_url: Option<String>,
    pub cover_letter: Option<String>,

    // Boost fields
    pub boost_decision: Option<bool>,
    pub boost_reasoning: Option<String>,
    pub pricing_proposed: Option<f64>,

    // Discovery fields
    pub contact_name: Option<String>,
    pub contact_confidence: Option<ContactConfidence>,

    // Approval fields
    pub slack_message_ts: Option<String>,
    pub approved_at: Option<DateTime<Utc>>,
    pub submitted_at: Option<DateTime<Utc>>,

    // Failure log
    pub failure_log: Vec<String>,
}

impl JobRecord {
    pub fn new(job_id: String, url: String, source: Source, title: String, description: String) -> Self {
        Self {
            job_id,
            url,
            source,
            status: JobStatus::New,
            title,
            description,
            skills: Vec::new(),
            fit_score: None,
            fit_reasoning: None,
            budget: BudgetInfo::default(),
            client: ClientInfo::default(),
            attachments: Vec::new(),
            attachment_content: None,
            proposal_doc_url: None,
            proposal_text: None,
            video_url: None,
            pdf_url: None,
            cover_letter: None,
            boost_decision: None,
            boost_reasoning: None,
            pricing_proposed: None,
            contact_name: None,
            contact_confidence: None,
            slack_message_ts: None,
            approved_at: None,
            submitted_at: None,
            failure_log: Vec::new(),
        }
    }

    /// Advance status, enforcing the transition graph. Panics are never
    /// appropriate here: an illegal transition is a programmer error in a
    /// stage driver, so this is asserted rather than silently ignored.
    pub fn advance_status(&mut self, next: JobStatus) {
        debug_assert!(
            self.status.can_advance_to(next),
            "illegal status transition {:?} -> {:?}",
            self.status,
            next
        );
        self.status = next;
    }

    pub fn push_failure(&mut self, entry: impl Into<String>) {
        self.failure_log.push(entry.into());
    }

    /// Derive `pricing_proposed` from budget bounds per spec invariant 5:
    /// midpoint when both bounds exist, else whichever is set, else ⊥.
    pub fn derive_pricing(&mut self) {
        self.pricing_proposed = match (self.budget.budget_min, self.budget.budget_max) {
            (Some(min), Some(max)) => Some((min + max) / 2.0),
            (Some(min), None) => Some(min),
            (None, Some(max)) => Some(max),
            (None, None) => None,
        };
    }

    /// Project this record onto the Sheet Row shape: column-name addressed,
    /// sequences JSON-encoded, booleans lowercased, timestamps ISO8601.
    pub fn to_sheet_row(&self) -> SheetRow {
        let mut row: HashMap<String, Value> = HashMap::new();
        row.insert("job_id".into(), Value::String(self.job_id.clone()));
        row.insert("url".into(), Value::String(self.url.clone()));
        row.insert("source".into(), Value::String(self.source.to_string()));
        row.insert("status".into(), Value::String(self.status.to_string()));
        row.insert("title".into(), Value::String(self.title.clone()));
        row.insert("description".into(), Value::String(self.description.clone()));
        row.insert(
            "skills".into(),
            Value::String(serde_json::to_string(&self.skills).unwrap_or_default()),
        );
        row.insert(
            "fit_score".into(),
            self.fit_score
                .map(|s| Value::Number(s.into()))
                .unwrap_or(Value::Null),
        );
        row.insert(
            "fit_reasoning".into(),
            opt_string(&self.fit_reasoning),
        );
        row.insert(
            "budget_type".into(),
            self.budget
                .budget_type
                .map(|t| Value::String(format!("{t:?}").to_lowercase()))
                .unwrap_or(Value::Null),
        );
        row.insert("budget_min".into(), opt_f64(self.budget.budget_min));
        row.insert("budget_max".into(), opt_f64(self.budget.budget_max));
        row.insert("client_country".into(), opt_string(&self.client.country));
        row.insert("client_total_spent".into(), opt_f64(self.client.total_spent));
        row.insert(
            "client_hires".into(),
            self.client
                .hires
                .map(|h| Value::Number(h.into()))
                .unwrap_or(Value::Null),
        );
        row.insert(
            "client_payment_verified".into(),
            self.client
                .payment_verified
                .map(Value::Bool)
                .unwrap_or(Value::Null),
        );
        row.insert(
            "attachments".into(),
            Value::String(serde_json::to_string(&self.attachments).unwrap_or_default()),
        );
        row.insert("attachment_content".into(), opt_string(&self.attachment_content));
        row.insert("proposal_doc_url".into(), opt_string(&self.proposal_doc_url));
        row.insert("proposal_text".into(), opt_string(&self.proposal_text));
        row.insert("video_url".into(), opt_string(&self.video_url));
        row.insert("pdf_url".into(), opt_string(&self.pdf_url));
        row.insert("cover_letter".into(), opt_string(&self.cover_letter));
        row.insert(
            "boost_decision".into(),
            self.boost_decision.map(Value::Bool).unwrap_or(Value::Null),
        );
        row.insert("boost_reasoning".into(), opt_string(&self.boost_reasoning));
        row.insert("pricing_proposed".into(), opt_f64(self.pricing_proposed));
        row.insert("contact_name".into(), opt_string(&self.contact_name));
        row.insert(
            "contact_confidence".into(),
            self.contact_confidence
                .map(|c| Value::String(format!("{c:?}").to_lowercase()))
                .unwrap_or(Value::Null),
        );
        row.insert("slack_message_ts".into(), opt_string(&self.slack_message_ts));
        row.insert(
            "approved_at".into(),
            self.approved_at
                .map(|t| Value::String(t.to_rfc3339()))
                .unwrap_or(Value::Null),
        );
        row.insert(
            "submitted_at".into(),
            self.submitted_at
                .map(|t| Value::String(t.to_rfc3339()))
                .unwrap_or(Value::Null),
        );
        row.insert(
            "failure_log".into(),
            Value::String(serde_json::to_string(&self.failure_log).unwrap_or_default()),
        );
        SheetRow(row)
    }

    /// Reconstruct a Job Record from a Sheet Row, the inverse of
    /// `to_sheet_row`. Used by the Approval Callback Handler, which only
    /// holds a `job_id` and must read the current record back before
    /// mutating the fields the callback touches.
    pub fn from_sheet_row(row: &SheetRow) -> Result<Self, String> {
        let job_id = row_str(row, "job_id")?;
        let url = row_str(row, "url")?;
        let source: Source = row_str(row, "source")?.parse()?;
        let status: JobStatus = row_str(row, "status")?.parse()?;
        let title = row.get("title").and_then(Value::as_str).unwrap_or_default().to_string();
        let description = row
            .get("description")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let skills = row_json_vec(row, "skills");

        Ok(Self {
            job_id,
            url,
            source,
            status,
            title,
            description,
            skills,
            fit_score: row.get("fit_score").and_then(Value::as_u64).map(|v| v as u8),
            fit_reasoning: row_opt_string(row, "fit_reasoning"),
            budget: BudgetInfo {
                budget_type: row.get("budget_type").and_then(Value::as_str).and_then(|s| s.parse().ok()),
                budget_min: row.get("budget_min").and_then(Value::as_f64),
                budget_max: row.get("budget_max").and_then(Value::as_f64),
            },
            client: ClientInfo {
                country: row_opt_string(row, "client_country"),
                total_spent: row.get("client_total_spent").and_then(Value::as_f64),
                hires: row.get("client_hires").and_then(Value::as_u64).map(|v| v as u32),
                payment_verified: row.get("client_payment_verified").and_then(Value::as_bool),
            },
            attachments: serde_json::from_str(
                row.get("attachments").and_then(Value::as_str).unwrap_or("[]"),
            )
            .unwrap_or_default(),
            attachment_content: row_opt_string(row, "attachment_content"),
            proposal_doc_url: row_opt_string(row, "proposal_doc_url"),
            proposal_text: row_opt_string(row, "proposal_text"),
            video_url: row_opt_string(row, "video_url"),
            pdf_url: row_opt_string(row, "pdf_url"),
            cover_letter: row_opt_string(row, "cover_letter"),
            boost_decision: row.get("boost_decision").and_then(Value::as_bool),
            boost_reasoning: row_opt_string(row, "boost_reasoning"),
            pricing_proposed: row.get("pricing_proposed").and_then(Value::as_f64),
            contact_name: row_opt_string(row, "contact_name"),
            contact_confidence: row
                .get("contact_confidence")
                .and_then(Value::as_str)
                .and_then(|s| s.parse().ok()),
            slack_message_ts: row_opt_string(row, "slack_message_ts"),
            approved_at: row_opt_timestamp(row, "approved_at"),
            submitted_at: row_opt_timestamp(row, "submitted_at"),
            failure_log: serde_json::from_str(
                row.get("failure_log").and_then(Value::as_str).unwrap_or("[]"),
            )
            .unwrap_or_default(),
        })
    }
}

fn row_str(row: &SheetRow, column: &str) -> Result<String, String> {
    row.get(column)
        .and_then(Value::as_str)
        .map(String::from)
        .ok_or_else(|| format!("sheet row missing required column: {column}"))
}

fn row_opt_string(row: &SheetRow, column: &str) -> Option<String> {
    row.get(column).and_then(Value::as_str).map(String::from)
}

fn row_opt_timestamp(row: &SheetRow, column: &str) -> Option<DateTime<Utc>> {
    row.get(column)
        .and_then(Value::as_str)
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

fn row_json_vec(row: &SheetRow, column: &str) -> Vec<String> {
    row.get(column)
        .and_then(Value::as_str)
        .and_then(|s| serde_json::from_str(s).ok())
        .unwrap_or_default()
}

fn opt_string(value: &Option<String>) -> Value {
    value.clone().map(Value::String).unwrap_or(Value::Null)
}

fn opt_f64(value: Option<f64>) -> Value {
    value
        .and_then(serde_json::Number::from_f64)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}

/// Truncate a string to at most `max_chars` Unicode scalar values. Used to
/// cap `attachment_content` at 5,000 chars without splitting a multi-byte
/// character.
pub fn truncate_chars(input: &str, max_chars: usize) -> String {
    input.chars().take(max_chars).collect()
}

pub const ATTACHMENT_CONTENT_LIMIT: usize = 5_000;

// ============================================================================
// Sheet Row
// ============================================================================

/// Column-name addressed on-disk projection of a Job Record.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SheetRow(pub HashMap<String, Value>);

impl SheetRow {
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.0.get(column)
    }

    pub fn job_id(&self) -> Option<&str> {
        self.get("job_id").and_then(Value::as_str)
    }
}

// ============================================================================
// Pipeline Result
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineResult {
    pub ingested: usize,
    pub after_dedup: usize,
    pub after_prefilter: usize,
    pub filtered_out: usize,
    pub processed: usize,
    pub sent_to_approval: usize,
    pub with_errors: usize,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub errors: Vec<String>,
    pub records: Vec<JobRecord>,
}

impl PipelineResult {
    pub fn new(started_at: DateTime<Utc>) -> Self {
        Self {
            started_at,
            ..Default::default()
        }
    }

    pub fn finish(&mut self, finished_at: DateTime<Utc>) {
        self.finished_at = Some(finished_at);
        self.with_errors = self
            .records
            .iter()
            .filter(|r| !r.failure_log.is_empty())
            .count();
    }
}
