//! Property tests for the server registry

use std::net::Ipv4Addr;

use proptest::prelude::*;
use sshdeck_core::registry::is_ip_address;
use sshdeck_core::{RegistryError, ServerEntry, ServerRegistry, ServerUpdate};
use tempfile::TempDir;

fn ipv4() -> impl Strategy<Value = String> {
    any::<u32>().prop_map(|n| Ipv4Addr::from(n).to_string())
}

fn names() -> impl Strategy<Value = Vec<String>> {
    prop::collection::hash_set("[a-z][a-z0-9-]{0,12}", 1..8).prop_map(|s| s.into_iter().collect())
}

proptest! {
    /// Property: every IPv4 address is an accepted host
    #[test]
    fn ipv4_hosts_accepted(host in ipv4()) {
        prop_assert!(is_ip_address(&host));
        prop_assert!(ServerEntry::new(host, "ops").validate().is_ok());
    }

    /// Property: host names are never accepted as hosts
    #[test]
    fn hostnames_rejected(host in "[a-z]{1,10}\\.[a-z]{2,5}") {
        let rejected = matches!(ServerEntry::new(host, "ops").validate(), Err(RegistryError::InvalidHost(_)));
        prop_assert!(rejected);
    }

    /// Property: insertion order survives a reload
    #[test]
    fn order_survives_reload(names in names(), host in ipv4()) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("servers.yaml");
        let mut registry = ServerRegistry::load(&path).unwrap();
        for name in &names {
            registry.add(name, ServerEntry::new(host.clone(), "ops")).unwrap();
        }

        let reloaded = ServerRegistry::load(&path).unwrap();
        let order: Vec<&str> = reloaded.iter().map(|(name, _)| name).collect();
        prop_assert_eq!(order, names.iter().map(String::as_str).collect::<Vec<_>>());
    }

    /// Property: an update changes only the supplied fields
    #[test]
    fn update_is_partial(port in 1u16..=65535, description in "[a-zA-Z]{1,10}( [a-zA-Z]{1,10}){0,2}", full_access in any::<bool>()) {
        let dir = TempDir::new().unwrap();
        let mut registry = ServerRegistry::load(dir.path().join("servers.yaml")).unwrap();
        let mut original = ServerEntry::new("10.1.2.3", "ops");
        original.password = Some("secret".to_string());
        registry.add("box", original.clone()).unwrap();

        let updated = registry
            .update("box", ServerUpdate {
                port: Some(port),
                description: Some(description.clone()),
                full_access: Some(full_access),
                ..ServerUpdate::default()
            })
            .unwrap()
            .clone();

        prop_assert_eq!(updated.port, port);
        prop_assert_eq!(&updated.description, &description);
        prop_assert_eq!(updated.full_access, full_access);
        prop_assert_eq!(&updated.host, &original.host);
        prop_assert_eq!(&updated.user, &original.user);
        prop_assert_eq!(&updated.password, &original.password);

        let reloaded = ServerRegistry::load(dir.path().join("servers.yaml")).unwrap();
        prop_assert_eq!(reloaded.get("box"), Some(&updated));
    }

    /// Property: resolving an unknown name yields an unresolved endpoint
    #[test]
    fn unknown_names_resolve_empty(name in "[a-z]{1,12}") {
        let dir = TempDir::new().unwrap();
        let registry = ServerRegistry::load(dir.path().join("servers.yaml")).unwrap();
        let endpoint = registry.resolve_endpoint(&name);
        prop_assert!(!endpoint.is_resolved());
        prop_assert!(endpoint.credential.is_none());
    }
}
