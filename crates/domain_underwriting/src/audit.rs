//! Audit trail
//!
//! The trail is the case's event-sourced history. Entries are appended,
//! never edited or removed, and carry a sequence number so that entries
//! sharing a timestamp keep their insertion order.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::AuditEntryId;

/// Who performed an audited action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Actor {
    System,
    Llm,
    Human,
}

impl fmt::Display for Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Actor::System => "SYSTEM",
            Actor::Llm => "LLM",
            Actor::Human => "HUMAN",
        };
        f.write_str(s)
    }
}

/// What was done
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    RiskCaseCreated,
    EvidenceRecorded,
    DerivedMetricsRefreshed,
    RequirementAdded,
    RequirementSatisfied,
    RequirementsDetermined,
    RatingCompleted,
    AdvisoryReceived,
    AdvisoryFallback,
    OfferConstructed,
    PricingBasisSet,
    StatusChanged,
    PipelineStarted,
    PipelineCompleted,
    /// Free-form action recorded by an external collaborator
    Other(String),
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AuditAction::RiskCaseCreated => "RISK_CASE_CREATED",
            AuditAction::EvidenceRecorded => "EVIDENCE_RECORDED",
            AuditAction::DerivedMetricsRefreshed => "DERIVED_METRICS_REFRESHED",
            AuditAction::RequirementAdded => "REQUIREMENT_ADDED",
            AuditAction::RequirementSatisfied => "REQUIREMENT_SATISFIED",
            AuditAction::RequirementsDetermined => "REQUIREMENTS_DETERMINED",
            AuditAction::RatingCompleted => "RATING_COMPLETED",
            AuditAction::AdvisoryReceived => "ADVISORY_RECEIVED",
            AuditAction::AdvisoryFallback => "ADVISORY_FALLBACK",
            AuditAction::OfferConstructed => "OFFER_CONSTRUCTED",
            AuditAction::PricingBasisSet => "PRICING_BASIS_SET",
            AuditAction::StatusChanged => "STATUS_CHANGED",
            AuditAction::PipelineStarted => "PIPELINE_STARTED",
            AuditAction::PipelineCompleted => "PIPELINE_COMPLETED",
            AuditAction::Other(action) => action.as_str(),
        };
        f.write_str(s)
    }
}

/// An immutable audit trail entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: AuditEntryId,
    /// Position in the trail, starting at 1
    pub sequence: u64,
    pub timestamp: DateTime<Utc>,
    pub action: AuditAction,
    pub actor: Actor,
    pub component: String,
    pub field_changed: Option<String>,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
    pub evidence_refs: Vec<String>,
    pub reason: String,
}

/// The content of an entry before it is stamped and appended
#[derive(Debug, Clone, PartialEq)]
pub struct AuditRecord {
    action: AuditAction,
    actor: Actor,
    component: String,
    field_changed: Option<String>,
    old_value: Option<String>,
    new_value: Option<String>,
    evidence_refs: Vec<String>,
    reason: String,
}

impl AuditRecord {
    pub fn new(action: AuditAction, actor: Actor, component: impl Into<String>) -> Self {
        Self {
            action,
            actor,
            component: component.into(),
            field_changed: None,
            old_value: None,
            new_value: None,
            evidence_refs: Vec::new(),
            reason: String::new(),
        }
    }

    pub fn field(mut self, field: impl Into<String>) -> Self {
        self.field_changed = Some(field.into());
        self
    }

    pub fn old_value(mut self, value: impl Into<String>) -> Self {
        self.old_value = Some(value.into());
        self
    }

    pub fn new_value(mut self, value: impl Into<String>) -> Self {
        self.new_value = Some(value.into());
        self
    }

    pub fn evidence(mut self, refs: impl IntoIterator<Item = String>) -> Self {
        self.evidence_refs.extend(refs);
        self
    }

    pub fn reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = reason.into();
        self
    }
}

/// Append-only, chronologically ordered list of audit entries
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuditTrail {
    entries: Vec<AuditEntry>,
}

impl AuditTrail {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stamps and appends a record, returning the stored entry
    ///
    /// The timestamp is clamped so it never precedes the previous entry.
    pub fn append(&mut self, record: AuditRecord, now: DateTime<Utc>) -> &AuditEntry {
        let timestamp = match self.entries.last() {
            Some(last) if last.timestamp > now => last.timestamp,
            _ => now,
        };
        let entry = AuditEntry {
            id: AuditEntryId::new(),
            sequence: self.entries.len() as u64 + 1,
            timestamp,
            action: record.action,
            actor: record.actor,
            component: record.component,
            field_changed: record.field_changed,
            old_value: record.old_value,
            new_value: record.new_value,
            evidence_refs: record.evidence_refs,
            reason: record.reason,
        };
        tracing::trace!(
            sequence = entry.sequence,
            action = %entry.action,
            component = %entry.component,
            "audit entry appended"
        );
        self.entries.push(entry);
        &self.entries[self.entries.len() - 1]
    }

    pub fn entries(&self) -> &[AuditEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn last(&self) -> Option<&AuditEntry> {
        self.entries.last()
    }

    /// Entries recording a given action, in trail order
    pub fn with_action<'a>(&'a self, action: &'a AuditAction) -> impl Iterator<Item = &'a AuditEntry> + 'a {
        self.entries.iter().filter(move |e| &e.action == action)
    }

    /// Human-readable chronological summary
    pub fn summary(&self, heading: &str) -> String {
        let mut lines = vec![format!("Audit Trail for {heading}:"), "=".repeat(50)];
        for entry in &self.entries {
            lines.push(format!(
                "[{}] #{} {}: {} ({})",
                entry.timestamp.format("%Y-%m-%d %H:%M:%S"),
                entry.sequence,
                entry.actor,
                entry.action,
                entry.component
            ));
            if let Some(field) = &entry.field_changed {
                match (&entry.old_value, &entry.new_value) {
                    (Some(old), Some(new)) => lines.push(format!("   Field: {field} ({old} -> {new})")),
                    (None, Some(new)) => lines.push(format!("   Field: {field} = {new}")),
                    _ => lines.push(format!("   Field: {field}")),
                }
            }
            if !entry.reason.is_empty() {
                lines.push(format!("   Reason: {}", entry.reason));
            }
            if !entry.evidence_refs.is_empty() {
                lines.push(format!("   Evidence: {}", entry.evidence_refs.join(", ")));
            }
        }
        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_append_assigns_sequence_in_insertion_order() {
        let mut trail = AuditTrail::new();
        let now = Utc::now();
        trail.append(AuditRecord::new(AuditAction::PipelineStarted, Actor::System, "Pipeline"), now);
        trail.append(AuditRecord::new(AuditAction::RatingCompleted, Actor::System, "Rating"), now);

        let sequences: Vec<u64> = trail.entries().iter().map(|e| e.sequence).collect();
        assert_eq!(sequences, vec![1, 2]);
    }

    #[test]
    fn test_timestamps_never_go_backwards() {
        let mut trail = AuditTrail::new();
        let now = Utc::now();
        trail.append(AuditRecord::new(AuditAction::PipelineStarted, Actor::System, "Pipeline"), now);
        let entry = trail.append(
            AuditRecord::new(AuditAction::PipelineCompleted, Actor::System, "Pipeline"),
            now - Duration::seconds(5),
        );
        assert_eq!(entry.timestamp, now);
    }

    #[test]
    fn test_summary_includes_field_change_and_reason() {
        let mut trail = AuditTrail::new();
        trail.append(
            AuditRecord::new(AuditAction::StatusChanged, Actor::Human, "Underwriter")
                .field("underwriting_state.status")
                .old_value("UNDER_REVIEW")
                .new_value("WITHDRAWN")
                .reason("Applicant withdrew"),
            Utc::now(),
        );
        let summary = trail.summary("CASE-1");
        assert!(summary.contains("HUMAN: STATUS_CHANGED"));
        assert!(summary.contains("underwriting_state.status (UNDER_REVIEW -> WITHDRAWN)"));
        assert!(summary.contains("Reason: Applicant withdrew"));
    }

    #[test]
    fn test_actions_serialize_screaming_snake() {
        let json = serde_json::to_string(&AuditAction::RequirementsDetermined).unwrap();
        assert_eq!(json, "\"REQUIREMENTS_DETERMINED\"");
    }
}
