//! Diagnostic results (lab tests, imaging) recorded against a patient.

use crate::validation::parse_date;
use crate::RecordsResult;
use chrono::NaiveDate;
use clinic_files::{FileRecord, FileUpload};
use clinic_ids::{AttachmentId, PatientId, ResultId};
use clinic_types::NonEmptyText;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A file attached to a diagnostic result.
pub type Attachment = FileRecord<AttachmentId>;

/// Workflow state of a diagnostic result.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResultStatus {
    /// Ordered or awaiting a reading.
    #[default]
    Pending,
    Completed,
}

impl ResultStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            ResultStatus::Pending => "Pending",
            ResultStatus::Completed => "Completed",
        }
    }

    /// Legacy snapshots carry no status; a result whose value reads "pending" is still open.
    fn infer_from_value(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("pending") {
            ResultStatus::Pending
        } else {
            ResultStatus::Completed
        }
    }
}

impl fmt::Display for ResultStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ResultStatus {
    type Err = crate::RecordsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(ResultStatus::Pending),
            "completed" => Ok(ResultStatus::Completed),
            other => Err(crate::RecordsError::Validation(format!(
                "unknown result status '{other}' (expected Pending or Completed)"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "StoredResult")]
pub struct DiagnosticResult {
    #[serde(rename = "resultId")]
    pub id: ResultId,
    pub patient_id: PatientId,
    pub date: NaiveDate,
    pub test_name: NonEmptyText,
    /// Free-text reading, e.g. "Normal".
    #[serde(rename = "result")]
    pub value: String,
    pub status: ResultStatus,
    pub attachments: Vec<Attachment>,
}

/// On-disk shape; older snapshots omit `status` and `attachments`.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredResult {
    result_id: ResultId,
    patient_id: PatientId,
    date: NaiveDate,
    test_name: NonEmptyText,
    #[serde(default)]
    result: String,
    #[serde(default)]
    status: Option<ResultStatus>,
    #[serde(default)]
    attachments: Vec<Attachment>,
}

impl From<StoredResult> for DiagnosticResult {
    fn from(stored: StoredResult) -> Self {
        let status = stored
            .status
            .unwrap_or_else(|| ResultStatus::infer_from_value(&stored.result));

        Self {
            id: stored.result_id,
            patient_id: stored.patient_id,
            date: stored.date,
            test_name: stored.test_name,
            value: stored.result,
            status,
            attachments: stored.attachments,
        }
    }
}

/// Input for [`EntityStore::create_diagnostic_result`](crate::EntityStore::create_diagnostic_result).
#[derive(Debug, Clone)]
pub struct NewDiagnosticResult {
    pub patient_id: PatientId,
    pub test_name: String,
    pub value: Option<String>,
    /// Defaults to today (UTC).
    pub date: Option<NaiveDate>,
    /// Defaults to [`ResultStatus::Pending`].
    pub status: Option<ResultStatus>,
    pub attachments: Vec<FileUpload>,
}

impl NewDiagnosticResult {
    pub fn new(patient_id: PatientId, test_name: impl Into<String>) -> Self {
        Self {
            patient_id,
            test_name: test_name.into(),
            value: None,
            date: None,
            status: None,
            attachments: Vec::new(),
        }
    }
}

/// Fields to replace on an existing result; `None` keeps the current value.
///
/// The owning patient cannot be changed.
#[derive(Debug, Clone, Default)]
pub struct ResultUpdate {
    pub test_name: Option<String>,
    pub value: Option<String>,
    pub status: Option<ResultStatus>,
    /// `YYYY-MM-DD`
    pub date: Option<String>,
}

impl ResultUpdate {
    pub(crate) fn apply_to(&self, current: &DiagnosticResult) -> RecordsResult<DiagnosticResult> {
        let mut updated = current.clone();

        if let Some(test_name) = &self.test_name {
            updated.test_name = NonEmptyText::required("test name", test_name)?;
        }
        if let Some(value) = &self.value {
            updated.value = value.trim().to_owned();
        }
        if let Some(status) = self.status {
            updated.status = status;
        }
        if let Some(date) = &self.date {
            updated.date = parse_date("date", date)?;
        }

        Ok(updated)
    }
}
