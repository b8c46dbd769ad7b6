use bantay_engine::slug::{decode, encode, is_url_safe, try_decode};
use proptest::prelude::*;

fn entity_name() -> impl Strategy<Value = String> {
    prop_oneof![
        any::<String>(),
        "[A-Za-z0-9 &,.'()/#?%-]{0,40}",
        "[\\p{L}\\p{N}\\p{P} ]{0,24}",
    ]
}

proptest! {
    #[test]
    fn decode_inverts_encode_up_to_case(name in entity_name()) {
        prop_assert_eq!(decode(&encode(&name)), name.to_lowercase());
    }

    #[test]
    fn encoded_names_are_url_safe(name in entity_name()) {
        let slug = encode(&name);
        prop_assert!(is_url_safe(&slug));
        prop_assert!(!slug.contains([' ', '/', '?', '#']));
    }

    #[test]
    fn encode_is_stable(name in entity_name()) {
        prop_assert_eq!(encode(&name), encode(&name));
        prop_assert!(try_decode(&encode(&name)).is_ok());
    }

    #[test]
    fn decode_never_panics(raw in any::<String>()) {
        let once = decode(&raw);
        let _twice = decode(&once);
    }

    #[test]
    fn malformed_escapes_return_raw_input(prefix in "[a-z ]{0,8}", bad in "%[g-z]{0,2}") {
        let raw = format!("{prefix}{bad}");
        prop_assert_eq!(decode(&raw), raw.clone());
    }
}
