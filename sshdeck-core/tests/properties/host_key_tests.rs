//! Property tests for host key policies and the known hosts store

use proptest::prelude::*;
use sshdeck_core::{HostKeyDecision, HostKeyPolicy, KnownHosts};
use tempfile::TempDir;

fn fingerprint() -> impl Strategy<Value = String> {
    "SHA256:[0-9a-f]{64}"
}

fn host() -> impl Strategy<Value = String> {
    prop_oneof![
        (any::<[u8; 4]>()).prop_map(|o| format!("{}.{}.{}.{}", o[0], o[1], o[2], o[3])),
        "fe80::[0-9a-f]{1,4}",
        "[a-z]{1,10}\\.example",
    ]
}

proptest! {
    /// Property: a recorded key that still matches is accepted by every policy
    #[test]
    fn matching_key_always_accepted(fp in fingerprint()) {
        for policy in [HostKeyPolicy::AcceptNew, HostKeyPolicy::Strict, HostKeyPolicy::AcceptAll] {
            prop_assert_eq!(policy.evaluate(Some(&fp), &fp), HostKeyDecision::Accept);
        }
    }

    /// Property: a changed key is rejected unless checking is disabled
    #[test]
    fn changed_key_rejected(old in fingerprint(), new in fingerprint()) {
        prop_assume!(old != new);
        let rejected = matches!(HostKeyPolicy::AcceptNew.evaluate(Some(&old), &new), HostKeyDecision::Reject(_));
        prop_assert!(rejected);
        let rejected = matches!(HostKeyPolicy::Strict.evaluate(Some(&old), &new), HostKeyDecision::Reject(_));
        prop_assert!(rejected);
        prop_assert_eq!(HostKeyPolicy::AcceptAll.evaluate(Some(&old), &new), HostKeyDecision::Accept);
    }

    /// Property: trust on first use holds for every unseen host
    #[test]
    fn unseen_host_trusted_on_first_use(fp in fingerprint()) {
        prop_assert_eq!(HostKeyPolicy::AcceptNew.evaluate(None, &fp), HostKeyDecision::AcceptAndRecord);
    }

    /// Property: recorded keys survive a save and reload
    #[test]
    fn store_persists_entries(entries in prop::collection::vec((host(), 1u16..=65535, fingerprint()), 0..8)) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("known_hosts");
        let mut store = KnownHosts::load(&path).unwrap();
        for (host, port, fp) in &entries {
            store.insert(host, *port, fp.clone());
        }
        store.save().unwrap();

        let reloaded = KnownHosts::load(&path).unwrap();
        prop_assert_eq!(reloaded.len(), store.len());
        for (host, port, _) in &entries {
            prop_assert_eq!(reloaded.get(host, *port), store.get(host, *port));
        }
    }
}
