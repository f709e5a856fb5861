use crate::{
    fetcher::CycleInputs,
    uptime::{SigningIndex, UptimeSkip, resolve_uptime},
};
use std::collections::BTreeMap;
use valwatch_common::{Snapshot, ValidatorSnapshotEntry};

#[derive(Debug, Clone, PartialEq)]
pub struct BuiltSnapshot {
    pub snapshot: Snapshot,
    /// Validators kept with an uptime of `0.0` because their uptime could not be computed.
    pub skipped: Vec<UptimeSkip>,
}

/// Joins validators with their signing infos into a snapshot.
///
/// Pure: identical inputs always give identical output. Skips are returned to the caller
/// rather than logged here.
pub fn build_snapshot(inputs: &CycleInputs, valcons_prefix: &str) -> BuiltSnapshot {
    let index = SigningIndex::new(&inputs.signing_infos);
    let mut validators = BTreeMap::new();
    let mut skipped = Vec::new();

    for record in &inputs.validators {
        let uptime_percent =
            match resolve_uptime(record, &index, inputs.window_size, valcons_prefix) {
                Ok(uptime) => uptime,
                Err(skip) => {
                    skipped.push(skip);
                    0.0
                }
            };

        validators.insert(
            record.operator_address.clone(),
            ValidatorSnapshotEntry {
                moniker: record.moniker.clone(),
                uptime_percent,
                status: record.status,
                jailed: record.jailed,
                commission: record.commission_rate,
            },
        );
    }

    BuiltSnapshot {
        snapshot: Snapshot::new(validators),
        skipped,
    }
}
