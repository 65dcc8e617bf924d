//! TLS 签名算法常量
//!
//! 来源：https://www.iana.org/assignments/tls-parameters/tls-parameters.xhtml#tls-signaturescheme

use once_cell::sync::Lazy;
use std::collections::HashMap;

pub const PKCS1_WITH_SHA256: u16 = 0x0401;
pub const PKCS1_WITH_SHA384: u16 = 0x0501;
pub const PKCS1_WITH_SHA512: u16 = 0x0601;
pub const PSS_WITH_SHA256: u16 = 0x0804;
pub const PSS_WITH_SHA384: u16 = 0x0805;
pub const PSS_WITH_SHA512: u16 = 0x0806;
pub const ECDSA_WITH_P256_AND_SHA256: u16 = 0x0403;
pub const ECDSA_WITH_P384_AND_SHA384: u16 = 0x0503;
pub const ECDSA_WITH_P521_AND_SHA512: u16 = 0x0603;
pub const ED25519: u16 = 0x0807;
pub const PKCS1_WITH_SHA1: u16 = 0x0201;
pub const ECDSA_WITH_SHA1: u16 = 0x0203;

/// 签名算法名 → 16 位编码
/// 驼峰名（对应 Go 版本的 tls.SignatureScheme 常量名）与 IANA 别名指向同一编码
pub static SIG_ALG_MAP: Lazy<HashMap<&'static str, u16>> = Lazy::new(|| {
    HashMap::from([
        ("ECDSAWithP256AndSHA256", ECDSA_WITH_P256_AND_SHA256),
        ("ECDSAWithP384AndSHA384", ECDSA_WITH_P384_AND_SHA384),
        ("ECDSAWithP521AndSHA512", ECDSA_WITH_P521_AND_SHA512),
        ("PSSWithSHA256", PSS_WITH_SHA256),
        ("PSSWithSHA384", PSS_WITH_SHA384),
        ("PSSWithSHA512", PSS_WITH_SHA512),
        ("PKCS1WithSHA256", PKCS1_WITH_SHA256),
        ("PKCS1WithSHA384", PKCS1_WITH_SHA384),
        ("PKCS1WithSHA512", PKCS1_WITH_SHA512),
        ("PKCS1WithSHA1", PKCS1_WITH_SHA1),
        ("ECDSAWithSHA1", ECDSA_WITH_SHA1),
        ("Ed25519", ED25519),
        ("ecdsa_secp256r1_sha256", ECDSA_WITH_P256_AND_SHA256),
        ("ecdsa_secp384r1_sha384", ECDSA_WITH_P384_AND_SHA384),
        ("ecdsa_secp521r1_sha512", ECDSA_WITH_P521_AND_SHA512),
        ("rsa_pss_rsae_sha256", PSS_WITH_SHA256),
        ("rsa_pss_rsae_sha384", PSS_WITH_SHA384),
        ("rsa_pss_rsae_sha512", PSS_WITH_SHA512),
        ("rsa_pkcs1_sha256", PKCS1_WITH_SHA256),
        ("rsa_pkcs1_sha384", PKCS1_WITH_SHA384),
        ("rsa_pkcs1_sha512", PKCS1_WITH_SHA512),
        ("rsa_pkcs1_sha1", PKCS1_WITH_SHA1),
        ("ecdsa_sha1", ECDSA_WITH_SHA1),
        ("ed25519", ED25519),
    ])
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_camel_and_iana_aliases_agree() {
        assert_eq!(
            SIG_ALG_MAP.get("ECDSAWithP256AndSHA256"),
            SIG_ALG_MAP.get("ecdsa_secp256r1_sha256")
        );
        assert_eq!(SIG_ALG_MAP.get("PSSWithSHA256"), SIG_ALG_MAP.get("rsa_pss_rsae_sha256"));
        assert_eq!(SIG_ALG_MAP.get("rsa_pss_rsae_sha256"), Some(&0x0804));
    }

    #[test]
    fn test_unknown_absent() {
        assert_eq!(SIG_ALG_MAP.get("rsa_pss_pss_sha256"), None);
    }
}
