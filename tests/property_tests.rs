/// Property-based tests using proptest
/// Tests invariants that should hold for all inputs: flag purity, identifier
/// coercion totality, and defaulting totality under arbitrarily nulled
/// payloads.
use company_harvest::decoder::decode_company;
use company_harvest::models::{ComplianceFlags, Identifier};
use proptest::prelude::*;
use serde_json::{json, Value};

// Property: every flag equals membership of its code, regardless of noise
proptest! {
    #[test]
    fn flags_equal_code_membership(
        datasets in prop::collection::vec(
            prop::sample::select(vec![
                "RRE", "REL", "SOE", "POI", "INS",
                "SAN-CURRENT", "SAN-FORMER", "PEP-FORMER", "PEP-CURRENT",
                "UNKNOWN-CODE", "rre", "",
            ]),
            0..12,
        )
    ) {
        let datasets: Vec<String> = datasets.into_iter().map(String::from).collect();
        let flags = ComplianceFlags::from_datasets(&datasets);
        let has = |code: &str| datasets.iter().any(|d| d == code);

        prop_assert_eq!(flags.adverse_media, has("RRE"));
        prop_assert_eq!(flags.enforcements, has("REL"));
        prop_assert_eq!(flags.state_owned, has("SOE"));
        prop_assert_eq!(flags.persons_of_interest, has("POI"));
        prop_assert_eq!(flags.current_sanctions, has("SAN-CURRENT"));
        prop_assert_eq!(flags.former_sanctions, has("SAN-FORMER"));
        prop_assert_eq!(flags.current_peps, has("PEP-CURRENT"));
        prop_assert_eq!(flags.former_peps, has("PEP-FORMER"));
    }

    #[test]
    fn flags_ignore_every_other_field(datasets in prop::collection::vec("[A-Z-]{1,12}", 0..6)) {
        // Two records differing in everything but the dataset list agree on flags
        let a = decode_company(json!({
            "data": {"company": {"id": 1, "complianceData": {"datasets": datasets.clone()}}}
        })).unwrap();
        let b = decode_company(json!({
            "data": {"company": {
                "id": 999,
                "displayName": "Other Corp",
                "securityRatings": [{"score": 9.0, "grade": "F", "datetime": "x"}],
                "complianceData": {"datasets": datasets}
            }}
        })).unwrap();
        prop_assert_eq!(a.compliance.flags, b.compliance.flags);
    }
}

// Property: identifier coercion is total and never panics
proptest! {
    #[test]
    fn identifier_parse_never_panics(raw in "\\PC*") {
        let _ = Identifier::parse(&raw);
    }

    #[test]
    fn integer_literals_coerce_to_numeric(n in any::<i64>()) {
        prop_assert_eq!(Identifier::parse(&n.to_string()), Identifier::Numeric(n));
    }

    #[test]
    fn domainlike_strings_stay_text(raw in "[a-z]{1,10}\\.[a-z]{2,5}") {
        prop_assert_eq!(Identifier::parse(&raw), Identifier::Text(raw));
    }
}

/// Recursively check a JSON tree for null values.
fn contains_null(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Array(items) => items.iter().any(contains_null),
        Value::Object(map) => map.values().any(contains_null),
        _ => false,
    }
}

// Property: decoding always succeeds for a present company, and the decoded
// record never carries a null anywhere, however many fields were nulled out
proptest! {
    #[test]
    fn decoded_records_never_contain_nulls(mask in any::<u16>()) {
        let nulled = |bit: u16| -> Value {
            if mask & (1 << bit) != 0 {
                Value::Null
            } else {
                json!("present")
            }
        };

        let payload = json!({
            "data": {"company": {
                "id": 42,
                "duns": nulled(0),
                "displayName": nulled(1),
                "countryOfRegistration": nulled(2),
                "homepage": nulled(3),
                "shortDescription": nulled(4),
                "companyType": nulled(5),
                "creditScore": if mask & (1 << 6) != 0 { Value::Null } else {
                    json!({"currentCreditRating": {"commonValue": nulled(7), "commonDescription": nulled(8)}})
                },
                "complianceData": if mask & (1 << 9) != 0 { Value::Null } else {
                    json!({"datasets": if mask & (1 << 10) != 0 { Value::Null } else { json!(["REL"]) }})
                },
                "securityRatings": if mask & (1 << 11) != 0 { Value::Null } else {
                    json!([{
                        "score": if mask & (1 << 12) != 0 { Value::Null } else { json!(1.5) },
                        "grade": nulled(13),
                        "datetime": nulled(14)
                    }])
                },
                "financialRatios": if mask & (1 << 15) != 0 { Value::Null } else {
                    json!([{"reportingPeriod": nulled(0), "currentRatio": 1.0}])
                }
            }}
        });

        let record = decode_company(payload).unwrap();
        let serialized = serde_json::to_value(&record).unwrap();
        prop_assert!(!contains_null(&serialized));
    }
}
