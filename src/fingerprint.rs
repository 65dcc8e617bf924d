//! 指纹编译器
//!
//! 把声明式指纹配置编译为 ClientHelloSpec。
//! 密码套件与扩展的输出顺序与声明顺序一致；开启 GREASE 时在密码套件
//! 和扩展列表头部各插入一个 GREASE，若最后一个声明的扩展是
//! pre_shared_key，则在它前面再插入一个 GREASE。
//!
//! 未知的套件名直接跳过；单个扩展构建失败只丢弃该扩展，不影响其余扩展。

use crate::config::{ExtensionConfig, FingerprintConfig};
use crate::dicttls::cert_compression::CERT_COMPRESSION_BROTLI;
use crate::dicttls::psk_modes::PSK_MODE_DHE;
use crate::dicttls::renegotiation::RENEGOTIATE_ONCE_AS_CLIENT;
use crate::dicttls::supported_groups::X25519;
use crate::dicttls::{CIPHER_MAP, CURVE_MAP, SIG_ALG_MAP};
use crate::error::Result;
use crate::random::grease_value;
use crate::tls_config::{ClientHelloSpec, Extension, HpkeSymmetricCipherSuite, KeyShareEntry};
use crate::utils::{parse_hex, parse_url};
use serde_json::{Map, Value};

/// 编译指纹声明
///
/// URL 无法解析是致命错误；单个扩展的构建失败被抑制
pub fn build(cfg: &FingerprintConfig, target_url: &str) -> Result<ClientHelloSpec> {
    let parsed = parse_url(target_url)?;
    let server_name = parsed.host;

    // 密码套件：GREASE 前置，未知名称跳过
    let mut cipher_suites = Vec::new();
    if cfg.grease {
        cipher_suites.push(grease_value());
    }
    for name in &cfg.ciphers {
        if let Some(&code) = CIPHER_MAP.get(name.as_str()) {
            cipher_suites.push(code);
        }
    }

    // 扩展：GREASE 前置，逐个编译
    let mut extensions = Vec::new();
    if cfg.grease {
        extensions.push(Extension::Grease);
    }
    for ext_cfg in &cfg.extensions {
        match build_extension(ext_cfg, &server_name) {
            Some(ext) => extensions.push(ext),
            None => continue,
        }
    }

    // 声明列表以 pre_shared_key 结尾时，在 PSK 之前再插一个 GREASE
    if cfg.grease
        && cfg
            .extensions
            .last()
            .map(|e| e.name.as_str() == "pre_shared_key")
            .unwrap_or(false)
        && extensions.last().map(Extension::is_pre_shared_key).unwrap_or(false)
    {
        let idx = extensions.len() - 1;
        extensions.insert(idx, Extension::Grease);
    }

    Ok(ClientHelloSpec {
        min_version: parse_hex(&cfg.tls_version_min),
        max_version: parse_hex(&cfg.tls_version_max),
        compression_methods: cfg.compression_methods.clone(),
        cipher_suites,
        extensions,
    })
}

/// 编译单个扩展声明；未知名称或参数形状不对返回 None
fn build_extension(cfg: &ExtensionConfig, server_name: &str) -> Option<Extension> {
    let data = &cfg.data;
    match cfg.name.as_str() {
        "server_name" => Some(Extension::ServerName(server_name.to_string())),
        "extended_master_secret" => Some(Extension::ExtendedMasterSecret),
        "renegotiation_info" => Some(Extension::RenegotiationInfo(RENEGOTIATE_ONCE_AS_CLIENT)),
        "supported_groups" => {
            let curves = match data.get("curves") {
                Some(Value::Array(items)) => filter_names(items, &CURVE_MAP)?,
                _ => Vec::new(),
            };
            Some(Extension::SupportedCurves(curves))
        }
        "ec_point_formats" => {
            let formats = match data.get("formats") {
                Some(Value::Array(items)) => u8_list(items)?,
                _ => vec![0],
            };
            Some(Extension::SupportedPoints(formats))
        }
        "session_ticket" => Some(Extension::SessionTicket),
        "application_layer_protocol_negotiation" => {
            let protocols = match data.get("protocols") {
                Some(Value::Array(items)) => string_list(items)?,
                _ => vec!["h2".to_string(), "http/1.1".to_string()],
            };
            Some(Extension::Alpn(protocols))
        }
        "status_request" => Some(Extension::StatusRequest),
        "signature_algorithms" => {
            let algorithms = match data.get("algorithms") {
                Some(Value::Array(items)) => filter_names(items, &SIG_ALG_MAP)?,
                _ => Vec::new(),
            };
            Some(Extension::SignatureAlgorithms(algorithms))
        }
        "signature_algorithms_cert" => {
            let algorithms = match data.get("algorithms") {
                Some(Value::Array(items)) => filter_names(items, &SIG_ALG_MAP)?,
                _ => Vec::new(),
            };
            Some(Extension::SignatureAlgorithmsCert(algorithms))
        }
        "signed_certificate_timestamp" => Some(Extension::Sct),
        "key_share" => {
            let groups = match data.get("groups") {
                Some(Value::Array(items)) => filter_names(items, &CURVE_MAP)?,
                _ => vec![X25519],
            };
            // 公钥留空，由握手驱动在发送前生成
            let key_shares = groups
                .into_iter()
                .map(|group| KeyShareEntry { group, data: Vec::new() })
                .collect();
            Some(Extension::KeyShare(key_shares))
        }
        "psk_key_exchange_modes" => {
            let modes = match data.get("modes") {
                Some(Value::Array(items)) => u8_list(items)?,
                _ => vec![PSK_MODE_DHE],
            };
            Some(Extension::PskKeyExchangeModes(modes))
        }
        "supported_versions" => {
            let versions = match data.get("versions") {
                Some(Value::Array(items)) => hex_list(items)?,
                _ => vec![0x0304, 0x0303],
            };
            Some(Extension::SupportedVersions(versions))
        }
        "padding" => {
            let length = match data.get("length") {
                Some(v) => int_value(v)? as usize,
                None => 0,
            };
            Some(Extension::Padding(length))
        }
        "compress_certificate" => {
            let algorithms = match data.get("algorithms") {
                Some(Value::Array(items)) => u16_list(items)?,
                _ => vec![CERT_COMPRESSION_BROTLI],
            };
            Some(Extension::CompressCertificate(algorithms))
        }
        "application_settings" => {
            let protocols = match data.get("protocols") {
                Some(Value::Array(items)) => string_list(items)?,
                _ => vec!["h2".to_string()],
            };
            Some(Extension::ApplicationSettings(protocols))
        }
        "pre_shared_key" => {
            let identity_length = match data.get("identity_length") {
                Some(v) => int_value(v)? as usize,
                None => 138,
            };
            let binder_length = match data.get("binder_length") {
                Some(v) => int_value(v)? as usize,
                None => 32,
            };
            Some(Extension::PreSharedKey { identity_length, binder_length })
        }
        "encrypted_client_hello" => build_grease_ech(data),
        "GREASE" => Some(Extension::Grease),
        _ => None,
    }
}

/// 浏览器风格的 GREASE ECH 默认值（对应 uTLS 的 GREASEEncryptedClientHelloExtension）
fn build_grease_ech(data: &Map<String, Value>) -> Option<Extension> {
    let cipher_suites = match data.get("cipher_suites") {
        Some(Value::Array(items)) => {
            let mut suites = Vec::with_capacity(items.len());
            for item in items {
                let obj = item.as_object()?;
                suites.push(HpkeSymmetricCipherSuite {
                    kdf_id: int_value(obj.get("kdf_id")?)? as u16,
                    aead_id: int_value(obj.get("aead_id")?)? as u16,
                });
            }
            suites
        }
        // HKDF-SHA256 + AES-128-GCM
        _ => vec![HpkeSymmetricCipherSuite { kdf_id: 0x0001, aead_id: 0x0001 }],
    };

    let payload_lengths = match data.get("payload_lengths") {
        Some(Value::Array(items)) => u16_list(items)?,
        _ => match data.get("payload_length") {
            Some(v) => vec![int_value(v)? as u16],
            None => vec![128, 160, 192, 224],
        },
    };

    Some(Extension::GreaseEch { cipher_suites, payload_lengths })
}

/// 名称列表经映射表过滤；未知名称静默丢弃，非字符串元素视为构建失败
fn filter_names(
    items: &[Value],
    map: &std::collections::HashMap<&'static str, u16>,
) -> Option<Vec<u16>> {
    let mut out = Vec::with_capacity(items.len());
    for item in items {
        let name = item.as_str()?;
        if let Some(&code) = map.get(name) {
            out.push(code);
        }
    }
    Some(out)
}

fn string_list(items: &[Value]) -> Option<Vec<String>> {
    items.iter().map(|v| v.as_str().map(str::to_string)).collect()
}

fn hex_list(items: &[Value]) -> Option<Vec<u16>> {
    items.iter().map(|v| v.as_str().map(parse_hex)).collect()
}

/// JSON 数值一律按 f64 截断到目标整数宽度；负值视为构建失败
fn int_value(value: &Value) -> Option<i64> {
    let n = value.as_f64()? as i64;
    if n < 0 {
        return None;
    }
    Some(n)
}

fn u8_list(items: &[Value]) -> Option<Vec<u8>> {
    items.iter().map(|v| int_value(v).map(|n| n as u8)).collect()
}

fn u16_list(items: &[Value]) -> Option<Vec<u16>> {
    items.iter().map(|v| int_value(v).map(|n| n as u16)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::is_grease_value;

    fn fingerprint_from_json(json: &str) -> FingerprintConfig {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_cipher_order_preserved() {
        let cfg = fingerprint_from_json(
            r#"{
                "tls_version_min": "0x0303",
                "tls_version_max": "0x0304",
                "grease": false,
                "ciphers": [
                    "TLS_AES_256_GCM_SHA384",
                    "TLS_AES_128_GCM_SHA256",
                    "TLS_CHACHA20_POLY1305_SHA256"
                ],
                "compression_methods": [0],
                "extensions": []
            }"#,
        );
        let spec = build(&cfg, "https://example.com/").unwrap();
        assert_eq!(spec.cipher_suites, vec![0x1302, 0x1301, 0x1303]);
        assert_eq!(spec.min_version, 0x0303);
        assert_eq!(spec.max_version, 0x0304);
    }

    #[test]
    fn test_grease_prepended() {
        let cfg = fingerprint_from_json(
            r#"{
                "grease": true,
                "ciphers": ["TLS_AES_128_GCM_SHA256"],
                "extensions": [{"name": "server_name"}]
            }"#,
        );
        let spec = build(&cfg, "https://example.com/").unwrap();
        assert_eq!(spec.cipher_suites.len(), 2);
        assert!(is_grease_value(spec.cipher_suites[0]));
        assert_eq!(spec.cipher_suites[1], 0x1301);
        assert_eq!(spec.extensions.len(), 2);
        assert!(spec.extensions[0].is_grease());
    }

    #[test]
    fn test_unknown_cipher_skipped() {
        let cfg = fingerprint_from_json(
            r#"{"ciphers": ["NOPE", "TLS_AES_128_GCM_SHA256"], "extensions": []}"#,
        );
        let spec = build(&cfg, "https://example.com/").unwrap();
        assert_eq!(spec.cipher_suites, vec![0x1301]);
    }

    #[test]
    fn test_unknown_extension_skipped() {
        let cfg = fingerprint_from_json(
            r#"{"extensions": [{"name": "no_such"}, {"name": "server_name"}]}"#,
        );
        let spec = build(&cfg, "https://example.com/").unwrap();
        assert_eq!(
            spec.extensions,
            vec![Extension::ServerName("example.com".to_string())]
        );
    }

    #[test]
    fn test_server_name_from_url_without_port() {
        let cfg = fingerprint_from_json(r#"{"extensions": [{"name": "server_name"}]}"#);
        let spec = build(&cfg, "https://example.com:8443/path").unwrap();
        assert_eq!(
            spec.extensions,
            vec![Extension::ServerName("example.com".to_string())]
        );
    }

    #[test]
    fn test_psk_last_inserts_second_grease() {
        let cfg = fingerprint_from_json(
            r#"{
                "grease": true,
                "ciphers": [],
                "extensions": [
                    {"name": "server_name"},
                    {"name": "key_share"},
                    {"name": "pre_shared_key"}
                ]
            }"#,
        );
        let spec = build(&cfg, "https://example.com/").unwrap();
        // GREASE, server_name, key_share, GREASE, pre_shared_key
        assert_eq!(spec.extensions.len(), 5);
        assert!(spec.extensions[0].is_grease());
        assert!(spec.extensions[spec.extensions.len() - 2].is_grease());
        assert!(spec.extensions.last().unwrap().is_pre_shared_key());
        assert_eq!(
            spec.extensions.iter().filter(|e| e.is_grease()).count(),
            2
        );
    }

    #[test]
    fn test_psk_not_last_single_grease() {
        let cfg = fingerprint_from_json(
            r#"{
                "grease": true,
                "extensions": [
                    {"name": "pre_shared_key"},
                    {"name": "server_name"}
                ]
            }"#,
        );
        let spec = build(&cfg, "https://example.com/").unwrap();
        assert_eq!(spec.extensions.iter().filter(|e| e.is_grease()).count(), 1);
        assert!(spec.extensions[0].is_grease());
    }

    #[test]
    fn test_extension_defaults() {
        let cfg = fingerprint_from_json(
            r#"{
                "extensions": [
                    {"name": "application_layer_protocol_negotiation"},
                    {"name": "ec_point_formats"},
                    {"name": "key_share"},
                    {"name": "psk_key_exchange_modes"},
                    {"name": "supported_versions"},
                    {"name": "compress_certificate"},
                    {"name": "pre_shared_key"}
                ]
            }"#,
        );
        let spec = build(&cfg, "https://example.com/").unwrap();
        assert_eq!(
            spec.extensions[0],
            Extension::Alpn(vec!["h2".to_string(), "http/1.1".to_string()])
        );
        assert_eq!(spec.extensions[1], Extension::SupportedPoints(vec![0]));
        assert_eq!(
            spec.extensions[2],
            Extension::KeyShare(vec![KeyShareEntry { group: X25519, data: vec![] }])
        );
        assert_eq!(spec.extensions[3], Extension::PskKeyExchangeModes(vec![1]));
        assert_eq!(
            spec.extensions[4],
            Extension::SupportedVersions(vec![0x0304, 0x0303])
        );
        assert_eq!(
            spec.extensions[5],
            Extension::CompressCertificate(vec![CERT_COMPRESSION_BROTLI])
        );
        assert_eq!(
            spec.extensions[6],
            Extension::PreSharedKey { identity_length: 138, binder_length: 32 }
        );
    }

    #[test]
    fn test_numeric_fields_truncate_from_float() {
        let cfg = fingerprint_from_json(
            r#"{
                "extensions": [
                    {"name": "padding", "data": {"length": 171.0}},
                    {"name": "ec_point_formats", "data": {"formats": [0.0, 1.0]}}
                ]
            }"#,
        );
        let spec = build(&cfg, "https://example.com/").unwrap();
        assert_eq!(spec.extensions[0], Extension::Padding(171));
        assert_eq!(spec.extensions[1], Extension::SupportedPoints(vec![0, 1]));
    }

    #[test]
    fn test_malformed_extension_data_dropped() {
        // protocols 中混入数字：该扩展被丢弃，其余扩展照常输出
        let cfg = fingerprint_from_json(
            r#"{
                "extensions": [
                    {"name": "application_layer_protocol_negotiation", "data": {"protocols": ["h2", 7]}},
                    {"name": "status_request"}
                ]
            }"#,
        );
        let spec = build(&cfg, "https://example.com/").unwrap();
        assert_eq!(spec.extensions, vec![Extension::StatusRequest]);
    }

    #[test]
    fn test_curve_names_filtered() {
        let cfg = fingerprint_from_json(
            r#"{
                "extensions": [
                    {"name": "supported_groups",
                     "data": {"curves": ["X25519", "NOPE", "secp256r1", "X25519MLKEM768"]}}
                ]
            }"#,
        );
        let spec = build(&cfg, "https://example.com/").unwrap();
        assert_eq!(
            spec.extensions[0],
            Extension::SupportedCurves(vec![0x001d, 0x0017, 0x11ec])
        );
    }

    #[test]
    fn test_malformed_url_is_fatal() {
        let cfg = fingerprint_from_json(r#"{"extensions": []}"#);
        let err = build(&cfg, "http://[::").unwrap_err();
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn test_deterministic_without_grease() {
        let json = r#"{
            "tls_version_min": "0x0303",
            "tls_version_max": "0x0304",
            "grease": false,
            "ciphers": ["TLS_AES_128_GCM_SHA256", "TLS_AES_256_GCM_SHA384"],
            "compression_methods": [0],
            "extensions": [
                {"name": "server_name"},
                {"name": "supported_groups", "data": {"curves": ["X25519"]}},
                {"name": "supported_versions"}
            ]
        }"#;
        let cfg = fingerprint_from_json(json);
        let a = build(&cfg, "https://example.com/").unwrap();
        let b = build(&cfg, "https://example.com/").unwrap();
        assert_eq!(a.cipher_suites, b.cipher_suites);
        assert_eq!(a.extensions, b.extensions);
    }
}
