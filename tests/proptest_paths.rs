//! Property-based tests using proptest
//!
//! These tests verify that resource paths keep user supplied segments
//! intact and well-formed for arbitrary input.

use mixerctl::mixer::client::{extract_message, yaml_to_json, UNKNOWN_MESSAGE};
use mixerctl::mixer::{resource_path, rule_path, ResourceKind};
use proptest::prelude::*;
use serde_json::{json, Value};

/// Characters that must never appear unescaped in a segment
const RESERVED: &[char] = &['/', '?', '#', '%', ' ', '&', '=', ':', ';'];

fn arb_kind() -> impl Strategy<Value = ResourceKind> {
    prop_oneof![Just(ResourceKind::Adapter), Just(ResourceKind::Descriptor)]
}

fn decode(segment: &str) -> String {
    urlencoding::decode(segment).unwrap().into_owned()
}

proptest! {
    /// Scope and subject survive escaping and unescaping unchanged
    #[test]
    fn rule_path_round_trips(scope in ".*", subject in ".*") {
        let path = rule_path(&scope, &subject);
        let rest = path.strip_prefix("core/rules/v1/").unwrap();
        let segments: Vec<&str> = rest.split('/').collect();

        prop_assert_eq!(segments.len(), 2);
        prop_assert_eq!(decode(segments[0]), scope);
        prop_assert_eq!(decode(segments[1]), subject);
    }

    /// Escaped segments never contain reserved characters
    #[test]
    fn escaped_segments_have_no_reserved_characters(
        scope in "[a-z/?#% &=:;.-]{0,32}",
        subject in "[a-z/?#% &=:;.-]{0,32}"
    ) {
        let path = rule_path(&scope, &subject);
        let rest = path.strip_prefix("core/rules/v1/").unwrap();
        for segment in rest.split('/') {
            // '%' only appears as the start of an escape
            prop_assert!(!segment.chars().any(|c| c != '%' && RESERVED.contains(&c)));
            prop_assert!(segment.is_ascii());
        }
    }

    /// Resource paths keep their shape and scope for any input
    #[test]
    fn resource_path_round_trips(scope in ".*", kind in arb_kind()) {
        let path = resource_path(&scope, kind);
        let prefix = format!("core/{}/v1//", kind.collection());
        let escaped = path.strip_prefix(prefix.as_str()).unwrap();

        prop_assert!(!escaped.contains('/'));
        prop_assert_eq!(decode(escaped), scope);
    }

    /// Any string-keyed mapping survives the YAML to JSON re-encoding
    #[test]
    fn yaml_mapping_re_encodes_to_same_json(
        entries in prop::collection::btree_map("[a-z]{1,8}", "[a-zA-Z0-9 ]{0,16}", 0..8)
    ) {
        let expected: Value = json!(entries);
        let yaml = serde_yaml::to_string(&expected).unwrap();
        let encoded = yaml_to_json(yaml.as_bytes()).unwrap();
        let actual: Value = serde_json::from_slice(&encoded).unwrap();
        prop_assert_eq!(actual, expected);
    }

    /// Bodies without a string status.message always yield the fallback
    #[test]
    fn message_fallback_for_arbitrary_bodies(body in "[^\"]*") {
        prop_assert_eq!(extract_message(body.as_bytes()), UNKNOWN_MESSAGE);
    }
}
