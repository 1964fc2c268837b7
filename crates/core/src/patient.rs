//! Patient records.
//!
//! A patient owns its uploaded documents outright. Diagnostic results and invoices refer to a
//! patient by id and are removed with it (see [`EntityStore::delete_patient`]).
//!
//! [`EntityStore::delete_patient`]: crate::EntityStore::delete_patient

use crate::validation::parse_date;
use crate::{RecordsError, RecordsResult};
use chrono::NaiveDate;
use clinic_files::{FileRecord, FileUpload};
use clinic_ids::{DocumentId, PatientId};
use clinic_types::{optional_text, NonEmptyText};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A file uploaded against a patient.
pub type Document = FileRecord<DocumentId>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
    pub id: PatientId,
    pub name: NonEmptyText,
    pub dob: NaiveDate,
    pub contact: NonEmptyText,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub history: String,
    #[serde(default)]
    pub documents: Vec<Document>,
}

impl Patient {
    /// True when `term` appears in the name, id, contact or address (case-insensitive).
    pub fn matches(&self, term: &str) -> bool {
        let needle = term.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }

        self.name.contains_ignore_case(&needle)
            || self.id.to_string().contains(&needle)
            || self.contact.contains_ignore_case(&needle)
            || self.address.to_lowercase().contains(&needle)
    }
}

/// Input for [`EntityStore::create_patient`](crate::EntityStore::create_patient).
#[derive(Debug, Clone, Default)]
pub struct NewPatient {
    pub name: String,
    /// `YYYY-MM-DD`
    pub dob: String,
    pub contact: String,
    pub address: Option<String>,
    pub history: Option<String>,
    pub documents: Vec<FileUpload>,
}

/// Validated fields of a [`NewPatient`], ready to be given an id.
pub(crate) struct PatientFields {
    pub name: NonEmptyText,
    pub dob: NaiveDate,
    pub contact: NonEmptyText,
    pub address: String,
    pub history: String,
}

impl NewPatient {
    pub(crate) fn validate(&self) -> RecordsResult<PatientFields> {
        Ok(PatientFields {
            name: NonEmptyText::required("name", &self.name)?,
            dob: parse_date("dob", &self.dob)?,
            contact: NonEmptyText::required("contact", &self.contact)?,
            address: optional_text(self.address.as_deref()),
            history: optional_text(self.history.as_deref()),
        })
    }
}

/// Fields to replace on an existing patient; `None` keeps the current value.
///
/// The document list is only replaced when `documents` is `Some`.
#[derive(Debug, Clone, Default)]
pub struct PatientUpdate {
    pub name: Option<String>,
    pub dob: Option<String>,
    pub contact: Option<String>,
    pub address: Option<String>,
    pub history: Option<String>,
    pub documents: Option<Vec<Document>>,
}

impl PatientUpdate {
    /// Builds the replacement record without touching `current`.
    pub(crate) fn apply_to(&self, current: &Patient) -> RecordsResult<Patient> {
        let mut updated = current.clone();

        if let Some(name) = &self.name {
            updated.name = NonEmptyText::required("name", name)?;
        }
        if let Some(dob) = &self.dob {
            updated.dob = parse_date("dob", dob)?;
        }
        if let Some(contact) = &self.contact {
            updated.contact = NonEmptyText::required("contact", contact)?;
        }
        if let Some(address) = &self.address {
            updated.address = address.trim().to_owned();
        }
        if let Some(history) = &self.history {
            updated.history = history.trim().to_owned();
        }
        if let Some(documents) = &self.documents {
            let mut seen = BTreeSet::new();
            if let Some(dup) = documents.iter().find(|d| !seen.insert(d.id)) {
                return Err(RecordsError::Validation(format!(
                    "document id {} appears more than once",
                    dup.id
                )));
            }
            updated.documents = documents.clone();
        }

        Ok(updated)
    }
}
