//! 指纹编译器的端到端性质测试
//!
//! 覆盖顺序保持、GREASE 插入规则、未知名称容忍与无 GREASE 时的确定性。

use tls_requester::fingerprint;
use tls_requester::{Extension, FingerprintConfig};

fn fingerprint_config(json: &str) -> FingerprintConfig {
    serde_json::from_str(json).unwrap()
}

#[test]
fn compiled_order_matches_declaration_order() {
    let cfg = fingerprint_config(
        r#"{
            "tls_version_min": "0x0303",
            "tls_version_max": "0x0304",
            "grease": false,
            "ciphers": [
                "TLS_CHACHA20_POLY1305_SHA256",
                "TLS_AES_128_GCM_SHA256",
                "TLS_ECDHE_RSA_WITH_AES_256_GCM_SHA384"
            ],
            "compression_methods": [0],
            "extensions": [
                {"name": "status_request"},
                {"name": "server_name"},
                {"name": "session_ticket"}
            ]
        }"#,
    );
    let spec = fingerprint::build(&cfg, "https://example.test/").unwrap();

    assert_eq!(spec.cipher_suites, vec![0x1303, 0x1301, 0xc030]);
    assert_eq!(
        spec.extensions,
        vec![
            Extension::StatusRequest,
            Extension::ServerName("example.test".to_string()),
            Extension::SessionTicket,
        ]
    );
}

#[test]
fn grease_prepends_cipher_and_extension() {
    let cfg = fingerprint_config(
        r#"{
            "grease": true,
            "ciphers": ["TLS_AES_128_GCM_SHA256"],
            "extensions": [{"name": "server_name"}]
        }"#,
    );
    let spec = fingerprint::build(&cfg, "https://example.test/").unwrap();

    assert!(tls_requester::is_grease_value(spec.cipher_suites[0]));
    assert_eq!(&spec.cipher_suites[1..], &[0x1301]);
    assert_eq!(spec.extensions[0], Extension::Grease);
    assert_eq!(spec.extensions.len(), 2);
}

#[test]
fn psk_last_gets_second_grease_at_len_minus_two() {
    let cfg = fingerprint_config(
        r#"{
            "grease": true,
            "ciphers": [],
            "extensions": [
                {"name": "server_name"},
                {"name": "session_ticket"},
                {"name": "key_share"},
                {"name": "supported_versions"},
                {"name": "pre_shared_key"}
            ]
        }"#,
    );
    let spec = fingerprint::build(&cfg, "https://example.test/").unwrap();

    let grease_count = spec.extensions.iter().filter(|e| e.is_grease()).count();
    assert_eq!(grease_count, 2);
    assert_eq!(spec.extensions[0], Extension::Grease);
    assert_eq!(spec.extensions[spec.extensions.len() - 2], Extension::Grease);
    assert!(spec.extensions.last().unwrap().is_pre_shared_key());
}

#[test]
fn psk_not_last_keeps_single_grease() {
    let cfg = fingerprint_config(
        r#"{
            "grease": true,
            "ciphers": [],
            "extensions": [
                {"name": "pre_shared_key"},
                {"name": "server_name"}
            ]
        }"#,
    );
    let spec = fingerprint::build(&cfg, "https://example.test/").unwrap();
    assert_eq!(spec.extensions.iter().filter(|e| e.is_grease()).count(), 1);
    assert_eq!(spec.extensions[0], Extension::Grease);
}

#[test]
fn unknown_names_are_tolerated() {
    let cfg = fingerprint_config(
        r#"{
            "ciphers": ["NOPE", "TLS_AES_128_GCM_SHA256"],
            "extensions": [{"name": "no_such"}, {"name": "server_name"}]
        }"#,
    );
    let spec = fingerprint::build(&cfg, "https://example.test/").unwrap();
    assert_eq!(spec.cipher_suites, vec![0x1301]);
    assert_eq!(spec.extensions, vec![Extension::ServerName("example.test".to_string())]);
}

#[test]
fn compile_is_pure_without_grease() {
    let cfg = fingerprint_config(
        r#"{
            "tls_version_min": "0x0303",
            "tls_version_max": "0x0304",
            "grease": false,
            "ciphers": ["TLS_AES_128_GCM_SHA256", "TLS_AES_256_GCM_SHA384"],
            "compression_methods": [0],
            "extensions": [
                {"name": "server_name"},
                {"name": "extended_master_secret"},
                {"name": "supported_groups", "data": {"curves": ["X25519", "CurveP256"]}},
                {"name": "signature_algorithms", "data": {"algorithms": ["ECDSAWithP256AndSHA256"]}},
                {"name": "key_share", "data": {"groups": ["X25519"]}},
                {"name": "supported_versions", "data": {"versions": ["0x0304", "0x0303"]}}
            ]
        }"#,
    );
    let a = fingerprint::build(&cfg, "https://example.test/").unwrap();
    let b = fingerprint::build(&cfg, "https://example.test/").unwrap();
    assert_eq!(a.cipher_suites, b.cipher_suites);
    assert_eq!(a.extensions, b.extensions);
    assert_eq!(a.min_version, 0x0303);
    assert_eq!(a.max_version, 0x0304);
}

#[test]
fn malformed_url_fails_with_input_error() {
    let cfg = fingerprint_config(r#"{"extensions": []}"#);
    let err = fingerprint::build(&cfg, "http://[::").unwrap_err();
    assert_eq!(err.error_type(), "INPUT_ERROR");
    assert_eq!(err.exit_code(), 1);
}
