#[cfg(test)]
mod tests {
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use base64::Engine;
    use jsonwebtoken::{decode_header, Algorithm};
    use serde_json::Value;

    use crate::auth::{signed_assertion, Assertion};
    use crate::error::SyncError;
    use crate::helpers::time::now_secs;
    use crate::tests::common::{
        test_credential, verify_assertion, ACCOUNT_ID, PRIVATE_KEY_PEM, SCOPE,
    };

    const AUDIENCE: &str = "https://oauth2.googleapis.com/token";

    fn claims_of(jwt: &str) -> Value {
        let payload = jwt.split('.').nth(1).expect("compact jwt has a payload");
        let bytes = URL_SAFE_NO_PAD.decode(payload).expect("payload is base64url");
        serde_json::from_slice(&bytes).expect("payload is json")
    }

    #[test]
    fn lifetime_is_one_hour_for_any_clock() {
        let credential = test_credential(AUDIENCE);
        for now in [0_i64, 1, 1_700_000_000, 4_102_444_800] {
            let assertion = Assertion::build(&credential, now).unwrap();
            assert_eq!(assertion.issued_at, now);
            assert_eq!(assertion.expires_at - assertion.issued_at, 3600);

            let claims = claims_of(&signed_assertion(&credential, now).unwrap());
            assert_eq!(
                claims["exp"].as_i64().unwrap() - claims["iat"].as_i64().unwrap(),
                3600
            );
        }
    }

    #[test]
    fn claims_carry_identity_scope_and_audience() {
        let credential = test_credential(AUDIENCE);
        let claims = claims_of(&signed_assertion(&credential, 1_000).unwrap());

        assert_eq!(claims["iss"], ACCOUNT_ID);
        assert_eq!(claims["scope"], SCOPE);
        assert_eq!(claims["aud"], AUDIENCE);
        assert_eq!(claims["iat"], 1_000);
        assert_eq!(claims["exp"], 4_600);
    }

    #[test]
    fn signature_verifies_with_public_key() {
        let credential = test_credential(AUDIENCE);
        let now = now_secs();
        let jwt = signed_assertion(&credential, now).unwrap();

        let header = decode_header(&jwt).unwrap();
        assert_eq!(header.alg, Algorithm::RS256);
        assert_eq!(header.typ.as_deref(), Some("JWT"));

        let claims = verify_assertion(&jwt, AUDIENCE).unwrap();
        assert_eq!(claims, Assertion::build(&credential, now).unwrap());
    }

    #[test]
    fn env_escaped_key_signs() {
        let escaped = PRIVATE_KEY_PEM.replace('\n', "\\n");
        let credential = crate::config::credentials::ServiceAccountCredential::new(
            ACCOUNT_ID, &escaped, AUDIENCE, SCOPE,
        );
        let jwt = signed_assertion(&credential, now_secs()).unwrap();
        assert!(verify_assertion(&jwt, AUDIENCE).is_ok());
    }

    #[test]
    fn lifetime_above_one_hour_fails_fast() {
        let credential = test_credential(AUDIENCE).with_assertion_lifetime(7200);
        let err = Assertion::build(&credential, 0).unwrap_err();
        assert!(matches!(err, SyncError::Configuration(_)));

        let credential = test_credential(AUDIENCE).with_assertion_lifetime(0);
        assert!(Assertion::build(&credential, 0).is_err());
    }

    #[test]
    fn shorter_lifetime_is_honoured() {
        let credential = test_credential(AUDIENCE).with_assertion_lifetime(600);
        let assertion = Assertion::build(&credential, 100).unwrap();
        assert_eq!(assertion.expires_at, 700);
    }

    #[test]
    fn malformed_key_is_configuration_error() {
        let credential = crate::config::credentials::ServiceAccountCredential::new(
            ACCOUNT_ID,
            "definitely not pem",
            AUDIENCE,
            SCOPE,
        );
        let err = signed_assertion(&credential, 0).unwrap_err();
        assert!(matches!(
            err,
            SyncError::Configuration(ref m) if m.contains("malformed private key")
        ));
    }
}
