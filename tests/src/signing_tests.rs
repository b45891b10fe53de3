//! Request signing properties

use perpdesk_exchanges::binance::{Credentials, Signer, build_query_string, sign};
use perpdesk_exchanges::http::Method;
use proptest::prelude::*;
use rstest::*;

const SECRET: &str = "NhqPtmdSJYdKjVHjA7PZj4Mge3R5YNiP1e3UZjInClVN65XAbvqqM6A7H5fATj0j";

#[fixture]
fn signer() -> Signer {
    Signer::new(Credentials::new("test-key", SECRET)).unwrap()
}

#[cfg(test)]
mod signing {
    use super::*;

    #[rstest]
    fn test_signature_covers_sent_query(signer: Signer) {
        let params = vec![
            ("symbol".to_string(), "BTCUSDT".to_string()),
            ("leverage".to_string(), "20".to_string()),
        ];
        let request = signer
            .sign_request(Method::Post, "/fapi/v1/leverage", params, 1_700_000_000_000)
            .unwrap();

        let query = request.query_string();
        let (payload, signature) = query.rsplit_once("&signature=").unwrap();

        assert_eq!(payload, "symbol=BTCUSDT&leverage=20&timestamp=1700000000000");
        assert_eq!(signature, request.signature);
        assert_eq!(signature, sign(SECRET, &request.params).unwrap());
    }

    #[test]
    fn test_values_are_percent_encoded() {
        let query = build_query_string(&[("note", "a b&c"), ("symbol", "BTCUSDT")]);
        assert_eq!(query, "note=a%20b%26c&symbol=BTCUSDT");
    }
}

fn param_key() -> impl Strategy<Value = String> {
    "[a-zA-Z]{1,12}"
}

fn param_value() -> impl Strategy<Value = String> {
    "[A-Za-z0-9.]{1,16}"
}

proptest! {
    #[test]
    fn signing_is_deterministic(params in prop::collection::vec((param_key(), param_value()), 1..8)) {
        prop_assert_eq!(sign(SECRET, &params).unwrap(), sign(SECRET, &params).unwrap());
    }

    #[test]
    fn signing_depends_on_values(
        params in prop::collection::vec((param_key(), param_value()), 1..8),
        index in any::<prop::sample::Index>(),
        suffix in "[0-9]{1,3}",
    ) {
        let mut changed = params.clone();
        let i = index.index(changed.len());
        changed[i].1.push_str(&suffix);

        prop_assert_ne!(sign(SECRET, &params).unwrap(), sign(SECRET, &changed).unwrap());
    }

    #[test]
    fn signing_depends_on_order(
        first in param_key(),
        second in param_key(),
        a in param_value(),
        b in param_value(),
    ) {
        let forward = [(first.clone(), a.clone()), (second.clone(), b.clone())];
        let reversed = [(second, b), (first, a)];

        prop_assume!(build_query_string(&forward) != build_query_string(&reversed));
        prop_assert_ne!(sign(SECRET, &forward).unwrap(), sign(SECRET, &reversed).unwrap());
    }

    #[test]
    fn any_secret_signs_to_hex(secret in "[A-Za-z0-9]{1,64}", value in param_value()) {
        let signature = sign(&secret, &[("symbol", value.as_str())]).unwrap();
        prop_assert_eq!(signature.len(), 64);
        prop_assert!(signature.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }
}
