//! DNS record snapshots and the managed-set builder
//!
//! A [`DnsRecord`] is one provider-side record as it was listed for a zone,
//! or a synthetic record built from a [`CreateDirective`]. Records are never
//! persisted; they live for one reconciliation pass of one zone.
//!
//! The managed set is what the engine is allowed to touch:
//!
//! ```text
//! listed records ──filter_by_type("A")──┐
//!                                        ▼
//!              directive (if any) ──► [synthetic, a1, a2, ...]
//!                                        │
//!                                  IgnorePolicy
//!                                        ▼
//!                                   ManagedSet
//! ```

use crate::policy::{ConflictInfo, CreateDirective, IgnorePolicy, Verdict};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Record type tracked by the reconciler
pub const RECORD_TYPE_A: &str = "A";

/// One DNS record snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DnsRecord {
    /// Provider record id; empty for a synthetic record not yet created
    pub id: String,
    /// Zone the record was listed from; empty for a synthetic record
    pub zone_id: String,
    /// Fully qualified record name
    pub name: String,
    /// Record type tag ("A", "AAAA", "CNAME", ...)
    #[serde(rename = "type")]
    pub record_type: String,
    /// Current value, typically an IPv4 literal
    pub content: String,
    /// Whether the record is proxied by the provider
    pub proxied: bool,
    /// Free-form comment; `None` when the provider reports null
    pub comment: Option<String>,
    /// Provider tags
    pub tags: Vec<String>,
    /// Time-to-live in seconds (1 means "automatic" for some providers)
    pub ttl: u32,
}

impl DnsRecord {
    /// A record that exists only locally and still has to be created
    pub fn is_synthetic(&self) -> bool {
        self.id.is_empty()
    }

    /// Whether this record has the given type
    pub fn has_type(&self, record_type: &str) -> bool {
        self.record_type == record_type
    }
}

/// Keep only records of `record_type`, preserving listing order
pub fn filter_by_type(all: &[DnsRecord], record_type: &str) -> Vec<DnsRecord> {
    all.iter()
        .filter(|r| r.has_type(record_type))
        .cloned()
        .collect()
}

/// The records one zone pass will compare and update, plus what was left out
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManagedSet {
    /// Managed records; index 0 is the IP-change sentinel
    pub records: Vec<DnsRecord>,
    /// Names of records excluded by an ignore rule
    pub excluded: Vec<String>,
    /// Excluded records whose content differs from the rule's desired IP
    pub conflicts: Vec<ConflictInfo>,
}

impl ManagedSet {
    /// The record whose content decides whether the zone needs updating
    pub fn sentinel(&self) -> Option<&DnsRecord> {
        self.records.first()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }
}

/// Build the managed set for one zone
///
/// The directive record, when present, is placed first so it becomes the
/// sentinel. If the zone already lists a record with the directive's name and
/// type, the directive takes over that record's id and zone and the listed
/// copy is dropped, so it is patched rather than created again. Every
/// candidate is then run through the ignore policy in order; exclusions and
/// conflicts are reported but never acted on.
pub fn build_managed_set(
    typed: &[DnsRecord],
    directive: Option<&CreateDirective>,
    rules: &IgnorePolicy,
) -> ManagedSet {
    let mut matched = None;
    let lead = directive.filter(|d| d.is_present()).map(|d| {
        let mut record = d.to_record();
        if let Some(pos) = typed
            .iter()
            .position(|r| r.name == record.name && r.has_type(&record.record_type))
        {
            debug!("Directive {} matches listed record {}", record.name, typed[pos].id);
            record.id = typed[pos].id.clone();
            record.zone_id = typed[pos].zone_id.clone();
            matched = Some(pos);
        }
        record
    });

    let rest = typed
        .iter()
        .enumerate()
        .filter(|(i, _)| Some(*i) != matched)
        .map(|(_, r)| r);

    let mut set = ManagedSet::default();

    for record in lead.iter().chain(rest) {
        match rules.evaluate(record) {
            Verdict::Managed => set.records.push(record.clone()),
            Verdict::Excluded { pattern, conflict } => {
                debug!("Excluding {} (matched ignore rule '{}')", record.name, pattern);
                if let Some(conflict) = conflict {
                    debug!(
                        "{} points at {} but ignore rule expects {}",
                        conflict.name, conflict.current_ip, conflict.desired_ip
                    );
                    set.conflicts.push(conflict);
                }
                set.excluded.push(record.name.clone());
            }
        }
    }

    set
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::policy::IgnoreRule;

    pub(crate) fn a_record(id: &str, name: &str, content: &str) -> DnsRecord {
        DnsRecord {
            id: id.to_string(),
            zone_id: "zone-1".to_string(),
            name: name.to_string(),
            record_type: RECORD_TYPE_A.to_string(),
            content: content.to_string(),
            proxied: false,
            comment: None,
            tags: Vec::new(),
            ttl: 300,
        }
    }

    fn typed(record_type: &str, name: &str) -> DnsRecord {
        DnsRecord {
            record_type: record_type.to_string(),
            ..a_record("x", name, "target")
        }
    }

    fn directive(content: &str) -> CreateDirective {
        CreateDirective {
            content: content.to_string(),
            name: "new.example.com".to_string(),
            ..CreateDirective::default()
        }
    }

    #[test]
    fn filter_keeps_only_matching_type_in_order() {
        let all = vec![
            a_record("1", "a.example.com", "1.1.1.1"),
            typed("CNAME", "www.example.com"),
            a_record("2", "b.example.com", "1.1.1.1"),
            typed("AAAA", "a.example.com"),
        ];

        let names: Vec<_> = filter_by_type(&all, RECORD_TYPE_A)
            .into_iter()
            .map(|r| r.name)
            .collect();
        assert_eq!(names, vec!["a.example.com", "b.example.com"]);
    }

    #[test]
    fn filter_on_empty_input_is_empty() {
        assert!(filter_by_type(&[], RECORD_TYPE_A).is_empty());
    }

    #[test]
    fn directive_record_becomes_sentinel() {
        let records = vec![a_record("1", "home.example.com", "1.1.1.1")];
        let set = build_managed_set(&records, Some(&directive("9.9.9.9")), &IgnorePolicy::default());

        assert_eq!(set.len(), 2);
        let sentinel = set.sentinel().unwrap();
        assert!(sentinel.is_synthetic());
        assert_eq!(sentinel.content, "9.9.9.9");
        assert_eq!(set.records[1].name, "home.example.com");
    }

    #[test]
    fn directive_adopts_listed_record_with_same_name() {
        let records = vec![
            a_record("1", "home.example.com", "1.1.1.1"),
            a_record("2", "new.example.com", "1.1.1.1"),
        ];
        let set = build_managed_set(&records, Some(&directive("9.9.9.9")), &IgnorePolicy::default());

        assert_eq!(set.len(), 2);
        let sentinel = set.sentinel().unwrap();
        assert!(!sentinel.is_synthetic());
        assert_eq!(sentinel.id, "2");
        assert_eq!(sentinel.zone_id, "zone-1");
        assert_eq!(sentinel.content, "9.9.9.9");
        assert_eq!(set.records[1].name, "home.example.com");
    }

    #[test]
    fn directive_does_not_adopt_record_of_another_type() {
        let records = vec![typed("AAAA", "new.example.com")];
        let set = build_managed_set(&records, Some(&directive("9.9.9.9")), &IgnorePolicy::default());

        assert!(set.sentinel().unwrap().is_synthetic());
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn blank_directive_is_treated_as_absent() {
        let records = vec![a_record("1", "home.example.com", "1.1.1.1")];
        let set = build_managed_set(&records, Some(&directive("")), &IgnorePolicy::default());

        assert_eq!(set.len(), 1);
        assert!(!set.records[0].is_synthetic());
    }

    #[test]
    fn excluded_records_are_reported_with_conflicts() {
        let records = vec![
            a_record("1", "home.example.com", "1.1.1.1"),
            a_record("2", "nas.example.com", "1.1.1.1"),
        ];
        let rules = IgnorePolicy::new(vec![IgnoreRule::new(r"^nas\.", Some("3.3.3.3"))]);

        let set = build_managed_set(&records, None, &rules);

        assert_eq!(set.len(), 1);
        assert_eq!(set.records[0].name, "home.example.com");
        assert_eq!(set.excluded, vec!["nas.example.com"]);
        assert_eq!(set.conflicts.len(), 1);
        assert_eq!(set.conflicts[0].desired_ip, "3.3.3.3");
    }

    #[test]
    fn ignore_rules_apply_to_directive_record_too() {
        let rules = IgnorePolicy::new(vec![IgnoreRule::new(r"^new\.example\.com$", None)]);
        let set = build_managed_set(&[], Some(&directive("9.9.9.9")), &rules);

        assert!(set.is_empty());
        assert_eq!(set.excluded, vec!["new.example.com"]);
    }

    #[test]
    fn building_twice_gives_identical_sets() {
        let records = vec![
            a_record("1", "a.example.com", "1.1.1.1"),
            a_record("2", "b.example.com", "2.2.2.2"),
            a_record("3", "c.example.com", "3.3.3.3"),
        ];
        let rules = IgnorePolicy::new(vec![IgnoreRule::new("^b", Some("5.5.5.5"))]);
        let d = directive("9.9.9.9");

        let first = build_managed_set(&records, Some(&d), &rules);
        let second = build_managed_set(&records, Some(&d), &rules);
        assert_eq!(first, second);
    }
}
