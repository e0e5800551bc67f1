use msz_core::{Assumption, AssumptionSet};
use msz_topo::TopologyCompiler;
use proptest::prelude::*;

fn chain_keys() -> impl Strategy<Value = Vec<(&'static str, f64)>> {
    let population = (
        1.0f64..20.0,
        prop::option::of(0.05f64..1.0),
        0.01f64..1.0,
        prop::option::of(1.0f64..52.0),
        1.0f64..500.0,
    )
        .prop_map(|(pop, core, pene, freq, price)| {
            let mut keys = vec![("base_pop", pop), ("pene_rate", pene), ("price", price)];
            keys.extend(core.map(|v| ("core_pop_pct", v)));
            keys.extend(freq.map(|v| ("freq", v)));
            keys
        });
    let substitution = (1.0f64..1e6, 0.01f64..1.0, prop::option::of(0.5f64..2.0)).prop_map(
        |(market, rate, premium)| {
            let mut keys = vec![("existing_market", market), ("substitution_rate", rate)];
            keys.extend(premium.map(|v| ("price_premium", v)));
            keys
        },
    );
    let value_based = (
        1.0f64..1e6,
        0.01f64..1.0,
        prop::option::of(1.0f64..12.0),
        1.0f64..1e4,
    )
        .prop_map(|(targets, wtp, freq, cost)| {
            let mut keys = vec![
                ("target_count", targets),
                ("prob_cost", cost),
                ("wtp_ratio", wtp),
            ];
            keys.extend(freq.map(|v| ("prob_freq", v)));
            keys
        });
    prop_oneof![population, substitution, value_based]
}

proptest! {
    #[test]
    fn chains_respect_topological_order(keys in chain_keys(), reversed in any::<bool>()) {
        let mut keys = keys;
        if reversed {
            keys.reverse();
        }
        let assumptions = AssumptionSet::from_assumptions(
            keys.iter().map(|(key, value)| Assumption::new(*key, *key, *value)),
        )
        .unwrap();
        let graph = TopologyCompiler::default().compile(&assumptions).unwrap().unwrap();
        prop_assert!(graph.verify_order().is_ok());
        prop_assert_eq!(graph.nodes().len(), keys.len());
        let product: f64 = keys.iter().map(|(_, value)| value).product();
        let relative = (graph.aggregate_value() - product).abs() / product;
        prop_assert!(relative < 1e-9);
    }

    #[test]
    fn segmented_aggregate_equals_segment_sum(
        values in prop::collection::vec((1.0f64..1e4, 0.01f64..1.0, 1.0f64..1e3), 1..6),
    ) {
        let mut assumptions = AssumptionSet::new();
        for (idx, (count, rate, price)) in values.iter().enumerate() {
            let prefix = format!("seg{idx}");
            assumptions.insert(Assumption::new(format!("{prefix}_count"), "count", *count)).unwrap();
            assumptions.insert(Assumption::new(format!("{prefix}_adopt"), "adopt", *rate)).unwrap();
            assumptions.insert(Assumption::new(format!("{prefix}_price"), "price", *price)).unwrap();
        }
        let graph = TopologyCompiler::default().compile(&assumptions).unwrap().unwrap();
        prop_assert!(graph.verify_order().is_ok());
        let segments = graph.segments();
        prop_assert_eq!(segments.len(), values.len());
        let sum: f64 = segments.iter().map(|node| node.numeric_value).sum();
        prop_assert_eq!(graph.aggregate_value(), sum);
    }
}
