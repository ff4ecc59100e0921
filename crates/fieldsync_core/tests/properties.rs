//! Property tests for ledger invariants.

use fieldsync_core::{
    apply_sync_results, merge_unsynced_entities, EntityId, RevisionId, SyncRecord, SyncRecords,
    SyncResults, SyncTimestamp, SyncedValue,
};
use proptest::prelude::*;
use std::collections::HashMap;

type Ledger = SyncRecords<u32, u32>;

fn at(millis: i64) -> SyncTimestamp {
    SyncTimestamp::from_millis(millis)
}

/// An arbitrary record built from a short edit/sync history.
fn arb_record() -> impl Strategy<Value = SyncRecord<u32, u32>> {
    (0u32..4, any::<bool>(), any::<bool>()).prop_map(|(edits, sync_last, sync_errors)| {
        let mut record: SyncRecord<u32, u32> = SyncRecord::empty();
        for i in 0..edits {
            record = record.modified(at(i64::from(i)));
        }
        if sync_last && edits > 0 {
            record = if sync_errors {
                record.errored(7, record.revision_id, at(100))
            } else {
                record.synced(42, record.revision_id, at(100))
            };
        }
        record
    })
}

fn arb_ledger() -> impl Strategy<Value = Ledger> {
    proptest::collection::hash_map(
        "[a-h]",
        arb_record(),
        0..5,
    )
    .prop_map(|map| {
        map.into_iter()
            .map(|(id, record)| (EntityId::from(id.as_str()), record))
            .collect()
    })
}

proptest! {
    /// Each local edit strictly increases the revision id.
    #[test]
    fn modification_strictly_increases_revision(record in arb_record(), millis in 0i64..1_000_000) {
        let edited = record.modified(at(millis));
        let before = record.revision_id.unwrap_or(RevisionId::INITIAL);
        prop_assert_eq!(edited.revision_id, Some(before.next()));
        prop_assert!(edited.is_unsynced());
    }

    /// A result addressing a superseded revision never changes the record.
    #[test]
    fn stale_results_never_apply(record in arb_record(), acknowledge in any::<bool>()) {
        let current = record.modified(at(50));
        let stale_revision = record.revision_id;

        let id = EntityId::from("a");
        let mut ledger = Ledger::new();
        ledger.insert(id.clone(), current.clone());
        let mut data = HashMap::from([(id.clone(), 1u32)]);

        let mut results: SyncResults<u32, u32> = SyncResults::default();
        if acknowledge {
            results.data.insert(id.clone(), SyncedValue::new(99, stale_revision));
        } else {
            results.errors.insert(id.clone(), SyncedValue::new(5, stale_revision));
        }

        apply_sync_results(&mut data, &mut ledger, &results, at(60));

        prop_assert_eq!(&ledger[&id], &current);
        prop_assert_eq!(data[&id], 1u32);
    }

    /// Merge output ids are exactly the fresh ids plus the unsynced ids.
    #[test]
    fn merge_id_set(ledger in arb_ledger(), fresh_count in 0usize..4) {
        let data: HashMap<EntityId, u32> =
            ledger.keys().map(|id| (id.clone(), 1u32)).collect();
        let fresh: HashMap<EntityId, u32> = (0..fresh_count)
            .map(|i| (EntityId::from(format!("f{i}").as_str()), 2u32))
            .collect();

        let merged = merge_unsynced_entities(&ledger, &data, &fresh);

        let mut expected: Vec<EntityId> = fresh.keys().cloned().collect();
        expected.extend(
            ledger
                .iter()
                .filter(|(_, record)| record.is_unsynced())
                .map(|(id, _)| id.clone()),
        );
        expected.sort();
        expected.dedup();

        let mut actual: Vec<EntityId> = merged.records.keys().cloned().collect();
        actual.sort();
        prop_assert_eq!(actual, expected);

        // Unsynced entities keep their record verbatim.
        for (id, record) in &ledger {
            if record.is_unsynced() {
                prop_assert_eq!(&merged.records[id], record);
            }
        }
    }
}
