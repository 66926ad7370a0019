//! Ignore rules
//!
//! An ignore rule keeps matching records out of automatic management. A rule
//! may also name the IP the operator expects the record to hold; when the
//! record disagrees, the mismatch is reported as a [`ConflictInfo`] so it can
//! be fixed by hand. Ignored records are never written, conflict or not.
//!
//! Policy file shape:
//!
//! ```yaml
//! ignore:
//!   - domain: '^nas\.example\.com$'
//!     desired_ip: 192.168.1.20
//!   - domain: '(^|\.)lab\.example\.com$'
//! ```

use super::matcher::match_pattern;
use crate::record::DnsRecord;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// One exception-policy entry
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IgnoreRule {
    /// Regular expression tested against the record name; empty disables the rule
    #[serde(rename = "domain", default)]
    pub domain_pattern: String,

    /// IP the operator expects the ignored record to hold
    #[serde(default)]
    pub desired_ip: Option<String>,
}

impl IgnoreRule {
    pub fn new(domain_pattern: impl Into<String>, desired_ip: Option<&str>) -> Self {
        Self {
            domain_pattern: domain_pattern.into(),
            desired_ip: desired_ip.map(str::to_string),
        }
    }

    /// Desired IP, treating an empty string as unset
    pub fn desired_ip(&self) -> Option<&str> {
        self.desired_ip.as_deref().filter(|ip| !ip.is_empty())
    }
}

/// An ignored record whose content differs from the rule's desired IP
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConflictInfo {
    pub name: String,
    pub current_ip: String,
    pub desired_ip: String,
}

/// Outcome of evaluating one record against the policy
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// No rule matched
    Managed,
    /// The first matching rule excluded the record
    Excluded {
        /// Pattern of the rule that matched
        pattern: String,
        /// Set when the rule's desired IP differs from the record content
        conflict: Option<ConflictInfo>,
    },
}

impl Verdict {
    pub fn is_managed(&self) -> bool {
        matches!(self, Verdict::Managed)
    }

    pub fn conflict(&self) -> Option<&ConflictInfo> {
        match self {
            Verdict::Managed => None,
            Verdict::Excluded { conflict, .. } => conflict.as_ref(),
        }
    }
}

/// Ordered set of ignore rules, loaded once per run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IgnorePolicy {
    #[serde(rename = "ignore", default)]
    rules: Vec<IgnoreRule>,
}

impl IgnorePolicy {
    pub fn new(rules: Vec<IgnoreRule>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &[IgnoreRule] {
        &self.rules
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Evaluate `record` against the rules in order
    ///
    /// The first rule that matches decides. Empty patterns are skipped, and so
    /// are patterns that fail to compile (logged); a broken rule neither
    /// excludes nor protects anything.
    pub fn evaluate(&self, record: &DnsRecord) -> Verdict {
        is_managed(record, &self.rules)
    }
}

/// Evaluate `record` against `rules`; see [`IgnorePolicy::evaluate`]
pub fn is_managed(record: &DnsRecord, rules: &[IgnoreRule]) -> Verdict {
    for rule in rules {
        if rule.domain_pattern.is_empty() {
            continue;
        }

        match match_pattern(&rule.domain_pattern, &record.name) {
            Ok(true) => {
                let conflict = rule
                    .desired_ip()
                    .filter(|desired| *desired != record.content)
                    .map(|desired| ConflictInfo {
                        name: record.name.clone(),
                        current_ip: record.content.clone(),
                        desired_ip: desired.to_string(),
                    });

                return Verdict::Excluded {
                    pattern: rule.domain_pattern.clone(),
                    conflict,
                };
            }
            Ok(false) => {}
            Err(e) => {
                warn!("Skipping ignore rule for {}: {}", record.name, e);
            }
        }
    }

    Verdict::Managed
}
