use crate::{alerts::build_alert, subscribers::SubscriberRegistry};
use std::collections::HashMap;
use tracing::debug;
use valwatch_common::{Alert, AlertCategory, Snapshot, ValidatorSnapshotEntry};

/// Checked in this order; only the first crossing is reported.
pub const UPTIME_THRESHOLDS: [u8; 6] = [95, 90, 80, 70, 60, 50];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Rising,
    Falling,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UptimeCrossing {
    pub threshold: u8,
    pub direction: Direction,
    pub current: f64,
}

/// A state change detected for one validator between two cycles.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Transition {
    NewValidator,
    Commission { old: f64, new: f64 },
    Uptime(UptimeCrossing),
    Active,
    Jailed,
    InactiveInsufficient,
    InactiveJailed,
    UnjailedActive,
    UnjailedInactive,
}

impl Transition {
    pub fn category(&self) -> AlertCategory {
        match self {
            Transition::NewValidator => AlertCategory::NewValidator,
            Transition::Commission { .. } => AlertCategory::Commission,
            Transition::Uptime(_) => AlertCategory::Uptime,
            Transition::Active => AlertCategory::Active,
            Transition::Jailed => AlertCategory::Jailed,
            Transition::InactiveInsufficient => AlertCategory::InactiveInsufficient,
            Transition::InactiveJailed => AlertCategory::InactiveJailed,
            Transition::UnjailedActive => AlertCategory::UnjailedActive,
            Transition::UnjailedInactive => AlertCategory::UnjailedInactive,
        }
    }
}

/// Each validator's entry as of the last successful cycle.
#[derive(Debug, Clone, Default)]
pub struct PreviousStateStore {
    entries: HashMap<String, ValidatorSnapshotEntry>,
}

impl PreviousStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn get(&self, operator_address: &str) -> Option<&ValidatorSnapshotEntry> {
        self.entries.get(operator_address)
    }

    /// Overwrites the entry of every validator in `snapshot`. Validators missing from it keep
    /// their last known entry.
    pub fn upsert(&mut self, snapshot: &Snapshot) {
        for (operator_address, entry) in snapshot.iter() {
            self.entries.insert(operator_address.clone(), entry.clone());
        }
    }
}

/// Every transition whose condition holds between `previous` and `current`.
pub fn detect_transitions(
    previous: &ValidatorSnapshotEntry,
    current: &ValidatorSnapshotEntry,
) -> Vec<Transition> {
    let mut transitions = Vec::new();

    if current.commission != previous.commission {
        transitions.push(Transition::Commission {
            old: previous.commission,
            new: current.commission,
        });
    }

    match (previous.jailed, current.jailed) {
        (false, true) => transitions.push(Transition::Jailed),
        (true, false) if current.status.is_bonded() => {
            transitions.push(Transition::UnjailedActive)
        }
        (true, false) => transitions.push(Transition::UnjailedInactive),
        _ => {}
    }

    match (previous.status.is_bonded(), current.status.is_bonded()) {
        (true, false) if current.jailed => transitions.push(Transition::InactiveJailed),
        (true, false) => transitions.push(Transition::InactiveInsufficient),
        (false, true) => transitions.push(Transition::Active),
        _ => {}
    }

    let crossing = current
        .is_active()
        .then(|| uptime_crossing(previous.uptime_percent, current.uptime_percent))
        .flatten();
    if let Some(crossing) = crossing {
        transitions.push(Transition::Uptime(crossing));
    }

    transitions
}

/// First threshold in [`UPTIME_THRESHOLDS`] order that `current` crossed since `previous`.
pub fn uptime_crossing(previous: f64, current: f64) -> Option<UptimeCrossing> {
    UPTIME_THRESHOLDS.iter().find_map(|&threshold| {
        let limit = f64::from(threshold);
        let direction = if previous < limit && limit <= current {
            Direction::Rising
        } else if previous >= limit && limit > current {
            Direction::Falling
        } else {
            return None;
        };
        Some(UptimeCrossing {
            threshold,
            direction,
            current,
        })
    })
}

/// Keeps the transition with the lowest priority number and drops the rest.
pub fn select_transition(transitions: &[Transition]) -> Option<Transition> {
    transitions
        .iter()
        .min_by_key(|transition| transition.category().priority())
        .copied()
}

/// Alerts for `snapshot` against the previous cycle, at most one per validator.
///
/// Returns nothing while `store` is empty: the first cycle only establishes a baseline.
/// The store is not modified; the poll loop upserts it once the alerts are handed off.
pub fn diff_snapshot(
    store: &PreviousStateStore,
    snapshot: &Snapshot,
    registry: &dyn SubscriberRegistry,
) -> Vec<Alert> {
    if store.is_empty() {
        return Vec::new();
    }

    let mut alerts = Vec::new();
    for (operator_address, current) in snapshot.iter() {
        let Some(previous) = store.get(operator_address) else {
            debug!(
                operator_address = %operator_address,
                moniker = %current.moniker,
                "no previous state, skipping alerts"
            );
            continue;
        };

        if let Some(transition) = select_transition(&detect_transitions(previous, current)) {
            alerts.push(build_alert(
                operator_address,
                &current.moniker,
                &transition,
                registry,
            ));
        }
    }
    alerts
}
