use nanoserve::http::params::{
    DecodeError, Parameters, decode, encode, encode_path, percent_decode,
};

#[test]
fn test_decode_form_body() {
    let params = decode("a=1&b=two%20words").unwrap();

    assert_eq!(params.len(), 2);
    assert_eq!(params.get("a"), Some("1"));
    assert_eq!(params.get("b"), Some("two words"));
}

#[test]
fn test_decode_plus_is_space() {
    let params = decode("greeting=hello+there").unwrap();
    assert_eq!(params.get("greeting"), Some("hello there"));
}

#[test]
fn test_decode_trims_keys_not_values() {
    let params = decode(" key =  padded ").unwrap();
    assert_eq!(params.get("key"), Some("  padded "));
}

#[test]
fn test_decode_splits_at_first_equals() {
    let params = decode("expr=a=b").unwrap();
    assert_eq!(params.get("expr"), Some("a=b"));
}

#[test]
fn test_decode_empty_value_and_empty_input() {
    let params = decode("empty=").unwrap();
    assert_eq!(params.get("empty"), Some(""));
    assert!(decode("").unwrap().is_empty());
}

#[test]
fn test_decode_preserves_order_with_duplicates() {
    let params = decode("z=1&a=2&z=3").unwrap();
    let pairs: Vec<_> = params.iter().collect();
    assert_eq!(pairs, vec![("z", "3"), ("a", "2")]);
}

#[test]
fn test_percent_decode_utf8() {
    assert_eq!(percent_decode("caf%C3%A9").unwrap(), "café");
    assert_eq!(percent_decode("%e2%82%ac").unwrap(), "€");
}

#[test]
fn test_percent_decode_rejects_malformed() {
    assert_eq!(percent_decode("100%"), Err(DecodeError::TruncatedEscape(3)));
    assert_eq!(percent_decode("%G1"), Err(DecodeError::InvalidEscape(0)));
    assert!(decode("a=%zz").is_err());
}

#[test]
fn test_percent_decode_replaces_non_utf8_bytes() {
    assert_eq!(percent_decode("%FF").unwrap(), "\u{FFFD}");
    assert_eq!(percent_decode("a%E9b%C3%A9").unwrap(), "a\u{FFFD}bé");
}

#[test]
fn test_encode_joins_pairs() {
    let params: Parameters = [("a", "1"), ("b", "two words")].into_iter().collect();
    assert_eq!(encode(&params), "a=1&b=two+words");
}

#[test]
fn test_encode_decode_round_trip() {
    let samples = [
        ("name", "value"),
        ("with space", "and & ampersand"),
        ("eq=uals", "a=b=c"),
        ("unicode", "naïve 日本語"),
        ("symbols", "100% +/?#"),
    ];
    for (key, value) in samples {
        let params: Parameters = [(key, value)].into_iter().collect();
        let decoded = decode(&encode(&params)).unwrap();
        assert_eq!(decoded, params, "round trip of {key:?}={value:?}");
    }
}

#[test]
fn test_encode_path_keeps_slashes() {
    assert_eq!(encode_path("/docs/my file.txt"), "/docs/my%20file.txt");
    assert_eq!(encode_path("/a+b/"), "/a%2Bb/");
    assert_eq!(encode_path("/"), "/");
}

#[test]
fn test_parameters_extend_overrides() {
    let mut query: Parameters = [("a", "query"), ("c", "3")].into_iter().collect();
    let body: Parameters = [("a", "body"), ("b", "2")].into_iter().collect();
    query.extend(body);

    let pairs: Vec<_> = query.iter().collect();
    assert_eq!(pairs, vec![("a", "body"), ("c", "3"), ("b", "2")]);
}
