//! TLS 配置模块
//!
//! 编译后的 TLS Client Hello 配置，对应 Go 版本的 utls.ClientHelloSpec。
//! 一经编译即为不可变值；密钥份额的公钥留空，由握手驱动在发送前填充。

/// 密码套件 ID
pub type CipherSuiteID = u16;

/// 编译后的 TLS Client Hello 配置
#[derive(Debug, Clone)]
pub struct ClientHelloSpec {
    /// 最低 TLS 版本
    pub min_version: u16,
    /// 最高 TLS 版本
    pub max_version: u16,
    /// 压缩方法
    pub compression_methods: Vec<u8>,
    /// 密码套件列表（顺序即线上顺序）
    pub cipher_suites: Vec<CipherSuiteID>,
    /// 扩展列表（顺序即线上顺序）
    pub extensions: Vec<Extension>,
}

impl ClientHelloSpec {
    /// spec 是否声明了 TLS 1.3（supported_versions 扩展优先，否则看 max_version）
    pub fn offers_tls13(&self) -> bool {
        for ext in &self.extensions {
            if let Extension::SupportedVersions(versions) = ext {
                return versions.contains(&0x0304);
            }
        }
        self.max_version >= 0x0304
    }
}

/// TLS 扩展
/// 对应 Go 版本的 tls.TLSExtension，每个变体携带自己的线上负载
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extension {
    /// GREASE 扩展（对应 &tls.UtlsGREASEExtension{}）
    Grease,
    /// Server Name Indication（对应 &tls.SNIExtension{}）
    ServerName(String),
    /// Extended Master Secret（对应 &tls.UtlsExtendedMasterSecretExtension{}）
    ExtendedMasterSecret,
    /// Renegotiation Info（对应 &tls.RenegotiationInfoExtension{}）
    RenegotiationInfo(u8),
    /// Supported Groups（对应 &tls.SupportedCurvesExtension{}）
    SupportedCurves(Vec<u16>),
    /// EC Point Formats（对应 &tls.SupportedPointsExtension{}）
    SupportedPoints(Vec<u8>),
    /// Session Ticket（对应 &tls.SessionTicketExtension{}）
    SessionTicket,
    /// ALPN（对应 &tls.ALPNExtension{}）
    Alpn(Vec<String>),
    /// Status Request（对应 &tls.StatusRequestExtension{}）
    StatusRequest,
    /// Signature Algorithms（对应 &tls.SignatureAlgorithmsExtension{}）
    SignatureAlgorithms(Vec<u16>),
    /// Signature Algorithms Cert（对应 &tls.SignatureAlgorithmsCertExtension{}）
    SignatureAlgorithmsCert(Vec<u16>),
    /// SCT（对应 &tls.SCTExtension{}）
    Sct,
    /// Key Share（对应 &tls.KeyShareExtension{}）
    KeyShare(Vec<KeyShareEntry>),
    /// PSK Key Exchange Modes（对应 &tls.PSKKeyExchangeModesExtension{}）
    PskKeyExchangeModes(Vec<u8>),
    /// Supported Versions（对应 &tls.SupportedVersionsExtension{}）
    SupportedVersions(Vec<u16>),
    /// 固定长度 Padding（对应 &tls.UtlsPaddingExtension{}）
    Padding(usize),
    /// Compress Certificate（对应 &tls.UtlsCompressCertExtension{}）
    CompressCertificate(Vec<u16>),
    /// Application Settings / ALPS（对应 &tls.ApplicationSettingsExtension{}）
    ApplicationSettings(Vec<String>),
    /// Pre-Shared Key 占位（对应 &tls.FakePreSharedKeyExtension{}）
    PreSharedKey {
        identity_length: usize,
        binder_length: usize,
    },
    /// GREASE ECH（对应 &tls.GREASEEncryptedClientHelloExtension{}）
    GreaseEch {
        cipher_suites: Vec<HpkeSymmetricCipherSuite>,
        payload_lengths: Vec<u16>,
    },
}

impl Extension {
    /// 是否为 GREASE 扩展
    pub fn is_grease(&self) -> bool {
        matches!(self, Extension::Grease)
    }

    /// 是否为 PSK 扩展（必须位于扩展列表末尾）
    pub fn is_pre_shared_key(&self) -> bool {
        matches!(self, Extension::PreSharedKey { .. })
    }
}

/// Key Share 条目（data 为空时由握手驱动生成密钥）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyShareEntry {
    pub group: u16,
    pub data: Vec<u8>,
}

/// HPKE 对称套件（GREASE ECH 用）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HpkeSymmetricCipherSuite {
    pub kdf_id: u16,
    pub aead_id: u16,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offers_tls13_from_supported_versions() {
        let spec = ClientHelloSpec {
            min_version: 0x0303,
            max_version: 0x0303,
            compression_methods: vec![0],
            cipher_suites: vec![0x1301],
            extensions: vec![Extension::SupportedVersions(vec![0x0304, 0x0303])],
        };
        assert!(spec.offers_tls13());
    }

    #[test]
    fn test_offers_tls13_from_max_version() {
        let spec = ClientHelloSpec {
            min_version: 0x0303,
            max_version: 0x0304,
            compression_methods: vec![0],
            cipher_suites: vec![],
            extensions: vec![],
        };
        assert!(spec.offers_tls13());
    }

    #[test]
    fn test_tls12_only() {
        let spec = ClientHelloSpec {
            min_version: 0x0303,
            max_version: 0x0303,
            compression_methods: vec![0],
            cipher_suites: vec![],
            extensions: vec![Extension::SupportedVersions(vec![0x0303])],
        };
        assert!(!spec.offers_tls13());
    }
}
