/// Property-based tests using proptest
/// Tests invariants of metadata decoding and the update allow-list
use ads_webhook_api::models::{AdField, AdUpdate, NewAd};
use proptest::prelude::*;
use serde_json::{json, Map, Value};

// Property: decoding arbitrary metadata text never panics
proptest! {
    #[test]
    fn metadata_decoding_never_panics(text in "\\PC*") {
        let _ = NewAd::from_webhook(&json!({ "metadata": text }));
    }

    #[test]
    fn encoded_and_structured_metadata_agree(
        service_type in "[a-z]{1,12}",
        location in proptest::option::of("[A-Za-z ]{0,16}"),
        spend in proptest::option::of(0u32..10_000u32)
    ) {
        let mut meta = Map::new();
        meta.insert("service_type".into(), json!(service_type));
        if let Some(location) = &location {
            meta.insert("location".into(), json!(location));
        }
        if let Some(spend) = spend {
            meta.insert("max_daily_spend".into(), json!(spend));
        }
        let meta = Value::Object(meta);

        let structured = NewAd::from_webhook(&json!({ "metadata": meta })).unwrap();
        let encoded = NewAd::from_webhook(&json!({ "metadata": meta.to_string() })).unwrap();

        prop_assert_eq!(&structured, &encoded);
        prop_assert_eq!(structured.service_type, service_type);
        prop_assert_eq!(structured.location, location.unwrap_or_default());
        prop_assert_eq!(structured.max_daily_spend, spend.map(f64::from).unwrap_or(50.0));
    }
}

// Property: the allow-list never lets anything else through
proptest! {
    #[test]
    fn update_only_contains_allowed_fields(
        keys in proptest::collection::vec("[a-z_]{1,14}", 0..10)
    ) {
        let body: Map<String, Value> = keys
            .iter()
            .map(|k| (k.clone(), json!("v")))
            .collect();
        let update = AdUpdate::from_json(body.clone());

        for (field, _) in update.changes() {
            prop_assert!(body.contains_key(field.column()));
        }
        let allowed = body.keys().filter(|k| AdField::from_key(k).is_some()).count();
        prop_assert_eq!(update.changes().len(), allowed);
    }
}
