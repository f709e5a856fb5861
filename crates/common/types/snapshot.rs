use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::BondStatus;

/// Derived state of one validator for one poll cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidatorSnapshotEntry {
    pub moniker: String,
    /// Two-decimal percentage in `0.0..=100.0`; always `0.0` unless the validator is active.
    pub uptime_percent: f64,
    pub status: BondStatus,
    pub jailed: bool,
    pub commission: f64,
}

impl ValidatorSnapshotEntry {
    pub fn is_active(&self) -> bool {
        self.status.is_bonded() && !self.jailed
    }

    /// Uptime classification shown in validator listings. `None` for inactive validators.
    pub fn uptime_band(&self) -> Option<UptimeBand> {
        self.is_active()
            .then(|| UptimeBand::classify(self.uptime_percent))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UptimeBand {
    /// >= 95%
    Excellent,
    /// >= 90%
    Good,
    /// >= 80%
    Fair,
    /// >= 70%
    Degraded,
    /// >= 60%
    Poor,
    /// < 60%
    Critical,
}

impl UptimeBand {
    pub fn classify(uptime_percent: f64) -> Self {
        match uptime_percent {
            u if u >= 95.0 => UptimeBand::Excellent,
            u if u >= 90.0 => UptimeBand::Good,
            u if u >= 80.0 => UptimeBand::Fair,
            u if u >= 70.0 => UptimeBand::Degraded,
            u if u >= 60.0 => UptimeBand::Poor,
            _ => UptimeBand::Critical,
        }
    }
}

/// Validator counts of a snapshot. `active + inactive == total` always holds;
/// `jailed` overlaps with `inactive`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub total: usize,
    pub active: usize,
    pub inactive: usize,
    pub jailed: usize,
}

/// All validators of one cycle keyed by operator address, together with their summary.
///
/// The summary is computed from the entries on construction, so the two can never disagree.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Snapshot {
    validators: BTreeMap<String, ValidatorSnapshotEntry>,
    summary: Summary,
}

impl Snapshot {
    pub fn new(validators: BTreeMap<String, ValidatorSnapshotEntry>) -> Self {
        let mut summary = Summary {
            total: validators.len(),
            ..Default::default()
        };
        for entry in validators.values() {
            if entry.is_active() {
                summary.active += 1;
            }
            if entry.jailed {
                summary.jailed += 1;
            }
        }
        summary.inactive = summary.total - summary.active;

        Self {
            validators,
            summary,
        }
    }

    pub fn summary(&self) -> Summary {
        self.summary
    }

    pub fn validators(&self) -> &BTreeMap<String, ValidatorSnapshotEntry> {
        &self.validators
    }

    pub fn get(&self, operator_address: &str) -> Option<&ValidatorSnapshotEntry> {
        self.validators.get(operator_address)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ValidatorSnapshotEntry)> {
        self.validators.iter()
    }

    pub fn len(&self) -> usize {
        self.validators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.validators.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(status: BondStatus, jailed: bool, uptime_percent: f64) -> ValidatorSnapshotEntry {
        ValidatorSnapshotEntry {
            moniker: "node".to_owned(),
            uptime_percent,
            status,
            jailed,
            commission: 0.05,
        }
    }

    #[test]
    fn summary_counts_jailed_independently_of_activity() {
        let validators = BTreeMap::from([
            ("a".to_owned(), entry(BondStatus::Bonded, false, 99.0)),
            ("b".to_owned(), entry(BondStatus::Bonded, true, 0.0)),
            ("c".to_owned(), entry(BondStatus::Unbonding, true, 0.0)),
            ("d".to_owned(), entry(BondStatus::Unbonded, false, 0.0)),
        ]);

        let summary = Snapshot::new(validators).summary();

        assert_eq!(
            summary,
            Summary {
                total: 4,
                active: 1,
                inactive: 3,
                jailed: 2,
            }
        );
    }

    #[test]
    fn empty_snapshot_has_zero_summary() {
        let snapshot = Snapshot::default();
        assert!(snapshot.is_empty());
        assert_eq!(snapshot.summary(), Summary::default());
    }

    #[test]
    fn classifies_uptime_bands_on_lower_bounds() {
        assert_eq!(UptimeBand::classify(100.0), UptimeBand::Excellent);
        assert_eq!(UptimeBand::classify(95.0), UptimeBand::Excellent);
        assert_eq!(UptimeBand::classify(94.99), UptimeBand::Good);
        assert_eq!(UptimeBand::classify(80.0), UptimeBand::Fair);
        assert_eq!(UptimeBand::classify(70.5), UptimeBand::Degraded);
        assert_eq!(UptimeBand::classify(60.0), UptimeBand::Poor);
        assert_eq!(UptimeBand::classify(12.0), UptimeBand::Critical);
    }

    #[test]
    fn inactive_entries_have_no_band() {
        assert_eq!(entry(BondStatus::Bonded, true, 0.0).uptime_band(), None);
        assert_eq!(entry(BondStatus::Unbonded, false, 0.0).uptime_band(), None);
        assert_eq!(
            entry(BondStatus::Bonded, false, 91.0).uptime_band(),
            Some(UptimeBand::Good)
        );
    }
}
