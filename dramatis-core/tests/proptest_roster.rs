//! Property-Based Tests for the roster.
//!
//! Uses `proptest` to check ranking, upsert and network invariants over
//! randomly generated rosters.

use std::collections::HashSet;

use proptest::prelude::*;

use dramatis_core::network;
use dramatis_core::personality;
use dramatis_core::{Character, Registry, RelationshipType};

// ---------------------------------------------------------------------------
// Strategy helpers
// ---------------------------------------------------------------------------

const NAMES: [&str; 6] = ["Alice", "Bob", "Carol", "Dan", "Eve", "Frank"];

fn arb_kind() -> impl Strategy<Value = RelationshipType> {
    prop::sample::select(RelationshipType::ALL.to_vec())
}

fn arb_traits() -> impl Strategy<Value = Vec<(String, i64)>> {
    prop::collection::vec(("[A-Z][a-z]{0,5}", 1..=10i64), 0..10)
}

/// A roster of up to six characters whose relationships may point at
/// themselves, at each other, or at names that are not registered.
fn arb_registry() -> impl Strategy<Value = Registry> {
    let edges = prop::collection::vec((0..NAMES.len(), 0..NAMES.len() + 2, arb_kind()), 0..30);
    (1..=NAMES.len(), edges).prop_map(|(n, edges)| {
        let mut registry = Registry::new();
        for name in &NAMES[..n] {
            registry.create(name, "").expect("create");
        }
        for (from, to, kind) in edges {
            if from >= n {
                continue;
            }
            let target = NAMES.get(to).copied().unwrap_or("Stranger");
            registry
                .upsert_relationship(NAMES[from], target, kind, "")
                .expect("relationship");
        }
        registry
    })
}

// ---------------------------------------------------------------------------
// Property: ranking is descending and stable
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn ranking_is_descending_and_stable(traits in arb_traits()) {
        let mut c = Character::new("Subject", "");
        for (name, weight) in &traits {
            c.upsert_trait(name, *weight).expect("valid trait");
        }

        let ranked = personality::rank_traits(&c);
        prop_assert_eq!(ranked.len(), c.personality_traits.len());
        for pair in ranked.windows(2) {
            prop_assert!(pair[0].weight >= pair[1].weight);
            if pair[0].weight == pair[1].weight {
                let pos = |name: &str| c.personality_traits.iter().position(|t| t.name == name);
                prop_assert!(pos(&pair[0].name) < pos(&pair[1].name));
            }
        }
    }

    #[test]
    fn upsert_then_rank_places_trait(traits in arb_traits(), weight in 1..=10i64) {
        let mut c = Character::new("Subject", "");
        for (name, w) in &traits {
            c.upsert_trait(name, *w).expect("valid trait");
        }
        c.upsert_trait("zeal", weight).expect("valid trait");

        let ranked = personality::rank_traits(&c);
        let at = ranked.iter().position(|t| t.name == "zeal").expect("present");
        prop_assert!(ranked[..at].iter().all(|t| i64::from(t.weight.value()) >= weight));
        prop_assert!(ranked[at + 1..].iter().all(|t| i64::from(t.weight.value()) <= weight));
    }
}

// ---------------------------------------------------------------------------
// Property: upserts are idempotent
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn trait_upsert_is_idempotent(name in "[A-Za-z]{1,8}", weight in 1..=10i64) {
        let mut c = Character::new("Subject", "");
        c.upsert_trait(&name, weight).expect("first");
        let once = c.clone();
        c.upsert_trait(&name, weight).expect("second");
        prop_assert_eq!(c, once);
    }

    #[test]
    fn relationship_upsert_is_idempotent(target in "[A-Za-z]{1,8}", kind in arb_kind(), notes in ".{0,30}") {
        let mut c = Character::new("Subject", "");
        c.upsert_relationship(&target, kind, &notes).expect("first");
        c.upsert_relationship(&target, kind, &notes).expect("second");
        prop_assert_eq!(c.relationships.len(), 1);
    }

    #[test]
    fn out_of_range_weights_are_rejected(weight in prop_oneof![i64::MIN..1, 11..i64::MAX]) {
        let mut c = Character::new("Subject", "");
        prop_assert!(c.upsert_trait("Brave", weight).is_err());
        prop_assert!(c.personality_traits.is_empty());
    }
}

// ---------------------------------------------------------------------------
// Property: network invariants
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn density_is_bounded(registry in arb_registry()) {
        let density = network::network_density(&registry);
        prop_assert!((0.0..=1.0).contains(&density));
        if registry.len() <= 1 {
            prop_assert!(density.abs() < f64::EPSILON);
        }
    }

    #[test]
    fn density_is_zero_without_relationships(n in 0..=NAMES.len()) {
        let mut registry = Registry::new();
        for name in &NAMES[..n] {
            registry.create(name, "").expect("create");
        }
        prop_assert!(network::network_density(&registry).abs() < f64::EPSILON);
    }

    #[test]
    fn mutual_pairs_are_reported_once(registry in arb_registry()) {
        let mutual = network::find_mutual(&registry);
        let mut seen = HashSet::new();
        for m in &mutual {
            prop_assert_ne!(&m.character_a, &m.character_b);
            prop_assert!(registry.contains(&m.character_a));
            prop_assert!(registry.contains(&m.character_b));

            let key = if m.character_a < m.character_b {
                (m.character_a.clone(), m.character_b.clone())
            } else {
                (m.character_b.clone(), m.character_a.clone())
            };
            prop_assert!(seen.insert(key), "pair reported twice");
        }
    }

    #[test]
    fn isolated_means_no_relationships(registry in arb_registry()) {
        let isolated = network::find_isolated(&registry);
        for c in &registry {
            prop_assert_eq!(isolated.contains(&c.name), c.relationships.is_empty());
        }
    }

    #[test]
    fn snapshot_round_trip_is_identical(registry in arb_registry()) {
        let restored = Registry::from_snapshot(registry.export_snapshot());
        prop_assert_eq!(&restored, &registry);

        let json = dramatis_core::persistence::encode_snapshot(&registry.export_snapshot()).expect("encode");
        let decoded = dramatis_core::persistence::decode_snapshot(&json).expect("decode");
        prop_assert_eq!(Registry::from_snapshot(decoded), registry);
    }
}
