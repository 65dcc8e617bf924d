//! TLS 握手消息
//!
//! 按 ClientHelloSpec 逐字节序列化 ClientHello：不重排、不增删、
//! 不归一化任何偏好，扩展顺序即线上顺序。
//!
//! ClientHello 格式 (RFC 8446 §4.1.2):
//! ```text
//! struct {
//!     ProtocolVersion legacy_version;
//!     Random random;
//!     opaque legacy_session_id<0..32>;
//!     CipherSuite cipher_suites<2..2^16-2>;
//!     opaque legacy_compression_methods<1..2^8-1>;
//!     Extension extensions<8..2^16-1>;
//! } ClientHello;
//! ```

use crate::dicttls::extension_types::*;
use crate::random::{grease_value, obfuscated_ticket_age, random_binder, random_bytes, random_identity};
use crate::tls_config::{ClientHelloSpec, Extension};
use rand::rngs::OsRng;
use rand::Rng;
use std::collections::HashMap;
use std::io;

/// 握手消息类型
pub mod handshake_types {
    pub const CLIENT_HELLO: u8 = 1;
    pub const SERVER_HELLO: u8 = 2;
    pub const NEW_SESSION_TICKET: u8 = 4;
    pub const ENCRYPTED_EXTENSIONS: u8 = 8;
    pub const CERTIFICATE: u8 = 11;
    pub const SERVER_KEY_EXCHANGE: u8 = 12;
    pub const CERTIFICATE_REQUEST: u8 = 13;
    pub const SERVER_HELLO_DONE: u8 = 14;
    pub const CERTIFICATE_VERIFY: u8 = 15;
    pub const CLIENT_KEY_EXCHANGE: u8 = 16;
    pub const FINISHED: u8 = 20;
    pub const CERTIFICATE_STATUS: u8 = 22;
    pub const KEY_UPDATE: u8 = 24;
}

/// HelloRetryRequest 的固定 random (RFC 8446 §4.1.3)
pub const HELLO_RETRY_REQUEST_RANDOM: [u8; 32] = [
    0xcf, 0x21, 0xad, 0x74, 0xe5, 0x9a, 0x61, 0x11, 0xbe, 0x1d, 0x8c, 0x02, 0x1e, 0x65, 0xb8,
    0x91, 0xc2, 0xa2, 0x11, 0x16, 0x7a, 0xbb, 0x8c, 0x5e, 0x07, 0x9e, 0x09, 0xe2, 0xc8, 0xa8,
    0x33, 0x9c,
];

fn invalid(msg: impl Into<String>) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, msg.into())
}

/// 带握手头（类型 + uint24 长度）的握手消息
pub fn handshake_message(msg_type: u8, body: &[u8]) -> Vec<u8> {
    let mut msg = Vec::with_capacity(4 + body.len());
    msg.push(msg_type);
    let len = body.len() as u32;
    msg.push((len >> 16) as u8);
    msg.push((len >> 8) as u8);
    msg.push(len as u8);
    msg.extend_from_slice(body);
    msg
}

/// 若缓冲开头是一条完整握手消息，返回（类型，含头部的总长度）
pub fn split_handshake_message(buf: &[u8]) -> Option<(u8, usize)> {
    if buf.len() < 4 {
        return None;
    }
    let len = ((buf[1] as usize) << 16) | ((buf[2] as usize) << 8) | buf[3] as usize;
    if buf.len() < 4 + len {
        return None;
    }
    Some((buf[0], 4 + len))
}

/// 序列化 ClientHello 握手消息
///
/// `key_share_public` 提供各 group 已生成的公钥，用来填充 spec 中
/// 公钥留空的 key share 条目
pub fn serialize_client_hello(
    spec: &ClientHelloSpec,
    random: &[u8; 32],
    session_id: &[u8; 32],
    key_share_public: &HashMap<u16, Vec<u8>>,
) -> Vec<u8> {
    let mut body = Vec::with_capacity(512);

    // legacy_version：TLS 1.3 也固定写 0x0303
    let legacy_version = spec.max_version.min(0x0303);
    body.extend_from_slice(&legacy_version.to_be_bytes());
    body.extend_from_slice(random);

    body.push(session_id.len() as u8);
    body.extend_from_slice(session_id);

    body.extend_from_slice(&((spec.cipher_suites.len() * 2) as u16).to_be_bytes());
    for suite in &spec.cipher_suites {
        body.extend_from_slice(&suite.to_be_bytes());
    }

    let compression = if spec.compression_methods.is_empty() {
        &[0u8][..]
    } else {
        &spec.compression_methods
    };
    body.push(compression.len() as u8);
    body.extend_from_slice(compression);

    // 扩展：顺序与 spec 一致；两个 GREASE 扩展取不同的值
    let mut ext_bytes = Vec::with_capacity(512);
    let mut last_grease: Option<u16> = None;
    for ext in &spec.extensions {
        let (id, payload) = serialize_extension(ext, key_share_public, &mut last_grease);
        ext_bytes.extend_from_slice(&id.to_be_bytes());
        ext_bytes.extend_from_slice(&(payload.len() as u16).to_be_bytes());
        ext_bytes.extend_from_slice(&payload);
    }
    body.extend_from_slice(&(ext_bytes.len() as u16).to_be_bytes());
    body.extend_from_slice(&ext_bytes);

    handshake_message(handshake_types::CLIENT_HELLO, &body)
}

/// 单个扩展的（类型 ID，负载）
fn serialize_extension(
    ext: &Extension,
    key_share_public: &HashMap<u16, Vec<u8>>,
    last_grease: &mut Option<u16>,
) -> (u16, Vec<u8>) {
    match ext {
        Extension::Grease => {
            let mut value = grease_value();
            while Some(value) == *last_grease {
                value = grease_value();
            }
            *last_grease = Some(value);
            (value, Vec::new())
        }
        Extension::ServerName(host) => {
            let name = host.as_bytes();
            let mut payload = Vec::with_capacity(5 + name.len());
            payload.extend_from_slice(&((3 + name.len()) as u16).to_be_bytes());
            payload.push(0); // NameType: host_name
            payload.extend_from_slice(&(name.len() as u16).to_be_bytes());
            payload.extend_from_slice(name);
            (EXT_TYPE_SERVER_NAME, payload)
        }
        Extension::ExtendedMasterSecret => (EXT_TYPE_EXTENDED_MASTER_SECRET, Vec::new()),
        Extension::RenegotiationInfo(_) => {
            // 首次握手：空的 renegotiated_connection
            (EXT_TYPE_RENEGOTIATION_INFO, vec![0])
        }
        Extension::SupportedCurves(curves) => {
            let mut payload = Vec::with_capacity(2 + curves.len() * 2);
            payload.extend_from_slice(&((curves.len() * 2) as u16).to_be_bytes());
            for curve in curves {
                payload.extend_from_slice(&curve.to_be_bytes());
            }
            (EXT_TYPE_SUPPORTED_GROUPS, payload)
        }
        Extension::SupportedPoints(formats) => {
            let mut payload = Vec::with_capacity(1 + formats.len());
            payload.push(formats.len() as u8);
            payload.extend_from_slice(formats);
            (EXT_TYPE_EC_POINT_FORMATS, payload)
        }
        Extension::SessionTicket => (EXT_TYPE_SESSION_TICKET, Vec::new()),
        Extension::Alpn(protocols) => {
            let mut list = Vec::new();
            for protocol in protocols {
                list.push(protocol.len() as u8);
                list.extend_from_slice(protocol.as_bytes());
            }
            let mut payload = Vec::with_capacity(2 + list.len());
            payload.extend_from_slice(&(list.len() as u16).to_be_bytes());
            payload.extend_from_slice(&list);
            (EXT_TYPE_APPLICATION_LAYER_PROTOCOL_NEGOTIATION, payload)
        }
        Extension::StatusRequest => {
            // OCSP，responder id 与 extensions 均为空
            (EXT_TYPE_STATUS_REQUEST, vec![1, 0, 0, 0, 0])
        }
        Extension::SignatureAlgorithms(algorithms) => {
            (EXT_TYPE_SIGNATURE_ALGORITHMS, u16_vector(algorithms))
        }
        Extension::SignatureAlgorithmsCert(algorithms) => {
            (EXT_TYPE_SIGNATURE_ALGORITHMS_CERT, u16_vector(algorithms))
        }
        Extension::Sct => (EXT_TYPE_SIGNED_CERTIFICATE_TIMESTAMP, Vec::new()),
        Extension::KeyShare(entries) => {
            let mut list = Vec::new();
            for entry in entries {
                let data = if entry.data.is_empty() {
                    key_share_public.get(&entry.group).cloned().unwrap_or_default()
                } else {
                    entry.data.clone()
                };
                list.extend_from_slice(&entry.group.to_be_bytes());
                list.extend_from_slice(&(data.len() as u16).to_be_bytes());
                list.extend_from_slice(&data);
            }
            let mut payload = Vec::with_capacity(2 + list.len());
            payload.extend_from_slice(&(list.len() as u16).to_be_bytes());
            payload.extend_from_slice(&list);
            (EXT_TYPE_KEY_SHARE, payload)
        }
        Extension::PskKeyExchangeModes(modes) => {
            let mut payload = Vec::with_capacity(1 + modes.len());
            payload.push(modes.len() as u8);
            payload.extend_from_slice(modes);
            (EXT_TYPE_PSK_KEY_EXCHANGE_MODES, payload)
        }
        Extension::SupportedVersions(versions) => {
            let mut payload = Vec::with_capacity(1 + versions.len() * 2);
            payload.push((versions.len() * 2) as u8);
            for version in versions {
                payload.extend_from_slice(&version.to_be_bytes());
            }
            (EXT_TYPE_SUPPORTED_VERSIONS, payload)
        }
        Extension::Padding(length) => (EXT_TYPE_PADDING, vec![0u8; *length]),
        Extension::CompressCertificate(algorithms) => {
            let mut payload = Vec::with_capacity(1 + algorithms.len() * 2);
            payload.push((algorithms.len() * 2) as u8);
            for alg in algorithms {
                payload.extend_from_slice(&alg.to_be_bytes());
            }
            (EXT_TYPE_COMPRESS_CERTIFICATE, payload)
        }
        Extension::ApplicationSettings(protocols) => {
            let mut list = Vec::new();
            for protocol in protocols {
                list.push(protocol.len() as u8);
                list.extend_from_slice(protocol.as_bytes());
            }
            let mut payload = Vec::with_capacity(2 + list.len());
            payload.extend_from_slice(&(list.len() as u16).to_be_bytes());
            payload.extend_from_slice(&list);
            (EXT_TYPE_APPLICATION_SETTINGS, payload)
        }
        Extension::PreSharedKey { identity_length, binder_length } => {
            let identity = random_identity(*identity_length);
            let binder = random_binder(*binder_length);

            let mut payload = Vec::new();
            payload.extend_from_slice(&((2 + identity.len() + 4) as u16).to_be_bytes());
            payload.extend_from_slice(&(identity.len() as u16).to_be_bytes());
            payload.extend_from_slice(&identity);
            payload.extend_from_slice(&obfuscated_ticket_age().to_be_bytes());
            payload.extend_from_slice(&((1 + binder.len()) as u16).to_be_bytes());
            payload.push(binder.len() as u8);
            payload.extend_from_slice(&binder);
            (EXT_TYPE_PRE_SHARED_KEY, payload)
        }
        Extension::GreaseEch { cipher_suites, payload_lengths } => {
            let suite = if cipher_suites.is_empty() {
                crate::tls_config::HpkeSymmetricCipherSuite { kdf_id: 0x0001, aead_id: 0x0001 }
            } else {
                cipher_suites[OsRng.gen_range(0..cipher_suites.len())]
            };
            let payload_len = if payload_lengths.is_empty() {
                128
            } else {
                payload_lengths[OsRng.gen_range(0..payload_lengths.len())] as usize
            };
            let enc = random_bytes(32);
            let ech_payload = random_bytes(payload_len);

            let mut payload = Vec::with_capacity(12 + enc.len() + ech_payload.len());
            payload.push(0); // ECHClientHelloType: outer
            payload.extend_from_slice(&suite.kdf_id.to_be_bytes());
            payload.extend_from_slice(&suite.aead_id.to_be_bytes());
            payload.push(OsRng.gen::<u8>()); // config id
            payload.extend_from_slice(&(enc.len() as u16).to_be_bytes());
            payload.extend_from_slice(&enc);
            payload.extend_from_slice(&(ech_payload.len() as u16).to_be_bytes());
            payload.extend_from_slice(&ech_payload);
            (EXT_TYPE_ECH, payload)
        }
    }
}

fn u16_vector(values: &[u16]) -> Vec<u8> {
    let mut payload = Vec::with_capacity(2 + values.len() * 2);
    payload.extend_from_slice(&((values.len() * 2) as u16).to_be_bytes());
    for value in values {
        payload.extend_from_slice(&value.to_be_bytes());
    }
    payload
}

/// 解析出的 ServerHello
#[derive(Debug, Clone)]
pub struct ServerHello {
    pub legacy_version: u16,
    pub random: [u8; 32],
    pub cipher_suite: u16,
    /// supported_versions 扩展选中的版本（TLS 1.3）
    pub selected_version: Option<u16>,
    /// 服务器的 key share（TLS 1.3）
    pub key_share: Option<(u16, Vec<u8>)>,
    /// 服务器是否回应了 extended_master_secret（TLS 1.2）
    pub extended_master_secret: bool,
}

impl ServerHello {
    pub fn is_hello_retry_request(&self) -> bool {
        self.random == HELLO_RETRY_REQUEST_RANDOM
    }
}

/// 解析 ServerHello 消息体
pub fn parse_server_hello(body: &[u8]) -> io::Result<ServerHello> {
    let mut r = ByteReader::new(body);

    let legacy_version = r.u16()?;
    let mut random = [0u8; 32];
    random.copy_from_slice(r.take(32)?);
    let _session_id = r.vec8()?;
    let cipher_suite = r.u16()?;
    let _compression = r.u8()?;

    let mut hello = ServerHello {
        legacy_version,
        random,
        cipher_suite,
        selected_version: None,
        key_share: None,
        extended_master_secret: false,
    };

    if r.is_empty() {
        return Ok(hello);
    }

    let mut exts = ByteReader::new(r.vec16()?);
    while !exts.is_empty() {
        let ext_type = exts.u16()?;
        let data = exts.vec16()?;
        match ext_type {
            EXT_TYPE_SUPPORTED_VERSIONS => {
                if data.len() != 2 {
                    return Err(invalid("bad supported_versions in server hello"));
                }
                hello.selected_version = Some(u16::from_be_bytes([data[0], data[1]]));
            }
            EXT_TYPE_KEY_SHARE => {
                let mut ks = ByteReader::new(data);
                let group = ks.u16()?;
                // HelloRetryRequest 中 key_share 只有 group，没有公钥
                let public = if ks.is_empty() { Vec::new() } else { ks.vec16()?.to_vec() };
                hello.key_share = Some((group, public));
            }
            EXT_TYPE_EXTENDED_MASTER_SECRET => {
                hello.extended_master_secret = true;
            }
            _ => {}
        }
    }

    Ok(hello)
}

/// TLS 1.2 的 ServerKeyExchange：命名曲线 + 服务器临时公钥
/// 签名部分被跳过（本客户端不做证书校验）
pub fn parse_server_key_exchange(body: &[u8]) -> io::Result<(u16, Vec<u8>)> {
    let mut r = ByteReader::new(body);
    let curve_type = r.u8()?;
    if curve_type != 3 {
        return Err(invalid(format!("unsupported ec curve type {}", curve_type)));
    }
    let named_curve = r.u16()?;
    let public = r.vec8()?.to_vec();
    Ok((named_curve, public))
}

/// TLS 1.2 的 ClientKeyExchange 消息体：带长度前缀的客户端公钥
pub fn client_key_exchange_body(public_key: &[u8]) -> Vec<u8> {
    let mut body = Vec::with_capacity(1 + public_key.len());
    body.push(public_key.len() as u8);
    body.extend_from_slice(public_key);
    body
}

/// KeyUpdate 消息体（0 = update_not_requested）
pub fn key_update_body(request_update: bool) -> Vec<u8> {
    vec![u8::from(request_update)]
}

/// 带边界检查的字节读取器
pub struct ByteReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub fn is_empty(&self) -> bool {
        self.pos >= self.buf.len()
    }

    pub fn take(&mut self, n: usize) -> io::Result<&'a [u8]> {
        if self.buf.len() - self.pos < n {
            return Err(invalid("truncated tls message"));
        }
        let out = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(out)
    }

    pub fn u8(&mut self) -> io::Result<u8> {
        Ok(self.take(1)?[0])
    }

    pub fn u16(&mut self) -> io::Result<u16> {
        let b = self.take(2)?;
        Ok(u16::from_be_bytes([b[0], b[1]]))
    }

    /// uint8 长度前缀的向量
    pub fn vec8(&mut self) -> io::Result<&'a [u8]> {
        let len = self.u8()? as usize;
        self.take(len)
    }

    /// uint16 长度前缀的向量
    pub fn vec16(&mut self) -> io::Result<&'a [u8]> {
        let len = self.u16()? as usize;
        self.take(len)
    }
}
