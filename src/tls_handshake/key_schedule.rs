//! 密钥调度
//!
//! TLS 1.3 密钥调度 (RFC 8446 §7.1) 与 TLS 1.2 PRF (RFC 5246 §5)。
//! HKDF 直接基于 HMAC 实现，所有中间密钥以字节形式流转。

use ring::hmac;
use sha2::{Digest, Sha256, Sha384};

/// 握手哈希算法，由协商出的密码套件决定
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashAlg {
    Sha256,
    Sha384,
}

impl HashAlg {
    pub fn output_len(self) -> usize {
        match self {
            HashAlg::Sha256 => 32,
            HashAlg::Sha384 => 48,
        }
    }

    fn hmac_alg(self) -> hmac::Algorithm {
        match self {
            HashAlg::Sha256 => hmac::HMAC_SHA256,
            HashAlg::Sha384 => hmac::HMAC_SHA384,
        }
    }

    pub fn hash(self, data: &[u8]) -> Vec<u8> {
        match self {
            HashAlg::Sha256 => Sha256::digest(data).to_vec(),
            HashAlg::Sha384 => Sha384::digest(data).to_vec(),
        }
    }
}

/// 握手消息的运行哈希，可在任意时刻取快照
#[derive(Clone)]
pub enum TranscriptHash {
    Sha256(Sha256),
    Sha384(Sha384),
}

impl TranscriptHash {
    pub fn new(alg: HashAlg) -> Self {
        match alg {
            HashAlg::Sha256 => TranscriptHash::Sha256(Sha256::new()),
            HashAlg::Sha384 => TranscriptHash::Sha384(Sha384::new()),
        }
    }

    pub fn update(&mut self, data: &[u8]) {
        match self {
            TranscriptHash::Sha256(h) => h.update(data),
            TranscriptHash::Sha384(h) => h.update(data),
        }
    }

    pub fn finalize(&self) -> Vec<u8> {
        match self.clone() {
            TranscriptHash::Sha256(h) => h.finalize().to_vec(),
            TranscriptHash::Sha384(h) => h.finalize().to_vec(),
        }
    }
}

pub fn hmac_sign(alg: HashAlg, key: &[u8], data: &[u8]) -> Vec<u8> {
    let key = hmac::Key::new(alg.hmac_alg(), key);
    hmac::sign(&key, data).as_ref().to_vec()
}

/// HKDF-Extract (RFC 5869)
pub fn hkdf_extract(alg: HashAlg, salt: &[u8], ikm: &[u8]) -> Vec<u8> {
    hmac_sign(alg, salt, ikm)
}

/// HKDF-Expand (RFC 5869)
pub fn hkdf_expand(alg: HashAlg, prk: &[u8], info: &[u8], length: usize) -> Vec<u8> {
    let key = hmac::Key::new(alg.hmac_alg(), prk);
    let mut out = Vec::with_capacity(length);
    let mut block: Vec<u8> = Vec::new();
    let mut counter = 1u8;
    while out.len() < length {
        let mut ctx = hmac::Context::with_key(&key);
        ctx.update(&block);
        ctx.update(info);
        ctx.update(&[counter]);
        block = ctx.sign().as_ref().to_vec();
        let take = (length - out.len()).min(block.len());
        out.extend_from_slice(&block[..take]);
        counter += 1;
    }
    out
}

/// HKDF-Expand-Label (RFC 8446 §7.1)
pub fn hkdf_expand_label(
    alg: HashAlg,
    secret: &[u8],
    label: &str,
    context: &[u8],
    length: usize,
) -> Vec<u8> {
    let mut info = Vec::with_capacity(4 + 6 + label.len() + context.len());
    info.extend_from_slice(&(length as u16).to_be_bytes());
    info.push((6 + label.len()) as u8);
    info.extend_from_slice(b"tls13 ");
    info.extend_from_slice(label.as_bytes());
    info.push(context.len() as u8);
    info.extend_from_slice(context);
    hkdf_expand(alg, secret, &info, length)
}

/// Derive-Secret (RFC 8446 §7.1)：上下文是消息哈希而非消息本身
pub fn derive_secret(alg: HashAlg, secret: &[u8], label: &str, transcript_hash: &[u8]) -> Vec<u8> {
    hkdf_expand_label(alg, secret, label, transcript_hash, alg.output_len())
}

/// 单方向的流量密钥材料
#[derive(Debug, Clone)]
pub struct TrafficKeys {
    pub key: Vec<u8>,
    pub iv: [u8; 12],
}

/// 从 traffic secret 推导记录层密钥与 IV
pub fn traffic_keys(alg: HashAlg, secret: &[u8], key_len: usize) -> TrafficKeys {
    let key = hkdf_expand_label(alg, secret, "key", &[], key_len);
    let iv_bytes = hkdf_expand_label(alg, secret, "iv", &[], 12);
    let mut iv = [0u8; 12];
    iv.copy_from_slice(&iv_bytes);
    TrafficKeys { key, iv }
}

/// TLS 1.3 握手阶段的全部秘密
pub struct HandshakeSecrets {
    pub client_hs_traffic: Vec<u8>,
    pub server_hs_traffic: Vec<u8>,
    pub master_secret: Vec<u8>,
}

/// ClientHello..ServerHello 之后推导握手流量秘密与主秘密
pub fn derive_handshake_secrets(
    alg: HashAlg,
    shared_secret: &[u8],
    hello_transcript_hash: &[u8],
) -> HandshakeSecrets {
    let zeros = vec![0u8; alg.output_len()];
    let empty_hash = alg.hash(&[]);

    let early_secret = hkdf_extract(alg, &[], &zeros);
    let derived = derive_secret(alg, &early_secret, "derived", &empty_hash);
    let handshake_secret = hkdf_extract(alg, &derived, shared_secret);

    let client_hs_traffic =
        derive_secret(alg, &handshake_secret, "c hs traffic", hello_transcript_hash);
    let server_hs_traffic =
        derive_secret(alg, &handshake_secret, "s hs traffic", hello_transcript_hash);

    let derived = derive_secret(alg, &handshake_secret, "derived", &empty_hash);
    let master_secret = hkdf_extract(alg, &derived, &zeros);

    HandshakeSecrets {
        client_hs_traffic,
        server_hs_traffic,
        master_secret,
    }
}

/// 服务器 Finished 之后推导应用流量秘密
pub fn derive_application_secrets(
    alg: HashAlg,
    master_secret: &[u8],
    server_finished_transcript_hash: &[u8],
) -> (Vec<u8>, Vec<u8>) {
    let client = derive_secret(alg, master_secret, "c ap traffic", server_finished_transcript_hash);
    let server = derive_secret(alg, master_secret, "s ap traffic", server_finished_transcript_hash);
    (client, server)
}

/// KeyUpdate 之后的下一代 traffic secret (RFC 8446 §7.2)
pub fn next_traffic_secret(alg: HashAlg, secret: &[u8]) -> Vec<u8> {
    hkdf_expand_label(alg, secret, "traffic upd", &[], alg.output_len())
}

/// Finished 校验值：HMAC(finished_key, transcript_hash)
pub fn finished_verify_data(alg: HashAlg, traffic_secret: &[u8], transcript_hash: &[u8]) -> Vec<u8> {
    let finished_key = hkdf_expand_label(alg, traffic_secret, "finished", &[], alg.output_len());
    hmac_sign(alg, &finished_key, transcript_hash)
}

/// TLS 1.2 PRF (RFC 5246 §5)：P_hash(secret, label || seed)
pub fn prf12(alg: HashAlg, secret: &[u8], label: &str, seed: &[u8], length: usize) -> Vec<u8> {
    let key = hmac::Key::new(alg.hmac_alg(), secret);
    let mut label_seed = Vec::with_capacity(label.len() + seed.len());
    label_seed.extend_from_slice(label.as_bytes());
    label_seed.extend_from_slice(seed);

    let mut out = Vec::with_capacity(length);
    // A(1) = HMAC(secret, A(0)), A(0) = label || seed
    let mut a = hmac::sign(&key, &label_seed).as_ref().to_vec();
    while out.len() < length {
        let mut ctx = hmac::Context::with_key(&key);
        ctx.update(&a);
        ctx.update(&label_seed);
        let block = ctx.sign().as_ref().to_vec();
        let take = (length - out.len()).min(block.len());
        out.extend_from_slice(&block[..take]);
        a = hmac::sign(&key, &a).as_ref().to_vec();
    }
    out
}
