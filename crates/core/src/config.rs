//! Core runtime configuration.
//!
//! Configuration is resolved once at process startup and then passed into [`ClinicService`]
//! as an `Arc<CoreConfig>`. The `*_from_env_value` helpers take the raw (optional) string so the
//! binary owns all environment access and tests never touch process-wide state.
//!
//! [`ClinicService`]: crate::ClinicService

use crate::constants::DEFAULT_DATA_DIR;
use crate::{RecordsError, RecordsResult};
use std::path::{Path, PathBuf};
use std::{fmt, str::FromStr};

/// What to do with a payment that would take the paid total past the invoice amount.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OverpaymentPolicy {
    /// Accept the payment; the invoice stays `Paid` and the excess is reported as overpaid.
    #[default]
    Allow,
    /// Fail with a validation error and leave the invoice untouched.
    Reject,
}

impl FromStr for OverpaymentPolicy {
    type Err = RecordsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "allow" => Ok(OverpaymentPolicy::Allow),
            "reject" => Ok(OverpaymentPolicy::Reject),
            other => Err(RecordsError::Validation(format!(
                "unknown overpayment policy '{other}' (expected 'allow' or 'reject')"
            ))),
        }
    }
}

impl fmt::Display for OverpaymentPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OverpaymentPolicy::Allow => f.write_str("allow"),
            OverpaymentPolicy::Reject => f.write_str("reject"),
        }
    }
}

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    data_dir: PathBuf,
    overpayment: OverpaymentPolicy,
    seed_baseline: bool,
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    ///
    /// `seed_baseline` controls whether a missing or corrupt snapshot falls back to the shipped
    /// baseline dataset (`true`) or to an empty collection (`false`).
    pub fn new(
        data_dir: PathBuf,
        overpayment: OverpaymentPolicy,
        seed_baseline: bool,
    ) -> RecordsResult<Self> {
        if data_dir.as_os_str().is_empty() {
            return Err(RecordsError::Validation(
                "data directory cannot be empty".into(),
            ));
        }

        Ok(Self {
            data_dir,
            overpayment,
            seed_baseline,
        })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn overpayment(&self) -> OverpaymentPolicy {
        self.overpayment
    }

    pub fn seed_baseline(&self) -> bool {
        self.seed_baseline
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Resolve the data directory; blank or missing means [`DEFAULT_DATA_DIR`].
pub fn data_dir_from_env_value(value: Option<String>) -> PathBuf {
    non_blank(value)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR))
}

/// Parse the overpayment policy; blank or missing means [`OverpaymentPolicy::Allow`].
pub fn overpayment_policy_from_env_value(value: Option<String>) -> RecordsResult<OverpaymentPolicy> {
    let parsed = non_blank(value)
        .map(|v| v.parse::<OverpaymentPolicy>())
        .transpose()?;

    Ok(parsed.unwrap_or_default())
}

/// Parse the baseline seeding flag; blank or missing means `true`.
pub fn seed_baseline_from_env_value(value: Option<String>) -> RecordsResult<bool> {
    match non_blank(value).map(|v| v.to_ascii_lowercase()).as_deref() {
        None | Some("true") | Some("1") | Some("yes") => Ok(true),
        Some("false") | Some("0") | Some("no") => Ok(false),
        Some(other) => Err(RecordsError::Validation(format!(
            "invalid baseline seeding flag '{other}' (expected true or false)"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_empty_data_dir() {
        let err = CoreConfig::new(PathBuf::new(), OverpaymentPolicy::Allow, true)
            .expect_err("empty data dir should fail");
        assert!(matches!(err, RecordsError::Validation(_)));
    }

    #[test]
    fn test_new_keeps_values() {
        let cfg = CoreConfig::new(PathBuf::from("/tmp/clinic"), OverpaymentPolicy::Reject, false)
            .expect("config should build");
        assert_eq!(cfg.data_dir(), Path::new("/tmp/clinic"));
        assert_eq!(cfg.overpayment(), OverpaymentPolicy::Reject);
        assert!(!cfg.seed_baseline());
    }

    #[test]
    fn test_data_dir_defaults_when_blank() {
        assert_eq!(data_dir_from_env_value(None), PathBuf::from(DEFAULT_DATA_DIR));
        assert_eq!(
            data_dir_from_env_value(Some("   ".into())),
            PathBuf::from(DEFAULT_DATA_DIR)
        );
        assert_eq!(
            data_dir_from_env_value(Some(" /srv/clinic ".into())),
            PathBuf::from("/srv/clinic")
        );
    }

    #[test]
    fn test_overpayment_policy_parsing() {
        assert_eq!(
            overpayment_policy_from_env_value(None).unwrap(),
            OverpaymentPolicy::Allow
        );
        assert_eq!(
            overpayment_policy_from_env_value(Some("REJECT".into())).unwrap(),
            OverpaymentPolicy::Reject
        );
        assert!(overpayment_policy_from_env_value(Some("sometimes".into())).is_err());
    }

    #[test]
    fn test_seed_baseline_parsing() {
        assert!(seed_baseline_from_env_value(None).unwrap());
        assert!(seed_baseline_from_env_value(Some("".into())).unwrap());
        assert!(!seed_baseline_from_env_value(Some("false".into())).unwrap());
        assert!(!seed_baseline_from_env_value(Some("0".into())).unwrap());
        assert!(seed_baseline_from_env_value(Some("maybe".into())).is_err());
    }
}
