//! TLS 握手驱动
//!
//! 在已拨通的 TCP 流上发出编译好的 ClientHello（逐字节，不做任何改写），
//! 完成 TLS 1.3 或 TLS 1.2 (ECDHE + AEAD) 握手。
//!
//! 证书不做校验：本客户端的用途是握手层面的指纹伪装，服务器证书
//! 消息只进转写哈希，内容被跳过。
//! HelloRetryRequest 不跟进，单飞客户端直接报错。

use super::key_schedule::{
    derive_application_secrets, derive_handshake_secrets, finished_verify_data, next_traffic_secret,
    prf12, traffic_keys, HashAlg, TranscriptHash,
};
use super::messages::{
    client_key_exchange_body, handshake_message, handshake_types, parse_server_hello,
    parse_server_key_exchange, serialize_client_hello, split_handshake_message,
};
use super::record::{
    content_types, read_raw_record, write_raw_record, OpenState, Protection, SealState,
    MAX_PLAINTEXT,
};
use crate::error::{RequesterError, Result};
use crate::random::{is_grease_value, random_bytes, random_session_id};
use crate::tls_config::{ClientHelloSpec, Extension};
use ring::agreement;
use ring::rand::SystemRandom;
use std::collections::HashMap;
use std::io::{self, Read, Write};
use std::net::TcpStream;
use std::time::Duration;

/// 协商出的协议版本
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Version {
    Tls12,
    Tls13,
}

/// 套件的 AEAD / 哈希参数
struct SuiteParams {
    aead: &'static ring::aead::Algorithm,
    hash: HashAlg,
    key_len: usize,
}

fn tls13_suite(id: u16) -> Option<SuiteParams> {
    match id {
        0x1301 => Some(SuiteParams { aead: &ring::aead::AES_128_GCM, hash: HashAlg::Sha256, key_len: 16 }),
        0x1302 => Some(SuiteParams { aead: &ring::aead::AES_256_GCM, hash: HashAlg::Sha384, key_len: 32 }),
        0x1303 => Some(SuiteParams { aead: &ring::aead::CHACHA20_POLY1305, hash: HashAlg::Sha256, key_len: 32 }),
        _ => None,
    }
}

/// TLS 1.2 仅支持 ECDHE + AEAD 套件；静态 RSA 与 CBC 套件协商即失败
fn tls12_suite(id: u16) -> Option<(SuiteParams, Protection, usize)> {
    match id {
        // (params, protection, fixed_iv_len)
        0xc02b | 0xc02f => Some((
            SuiteParams { aead: &ring::aead::AES_128_GCM, hash: HashAlg::Sha256, key_len: 16 },
            Protection::Tls12Gcm,
            4,
        )),
        0xc02c | 0xc030 => Some((
            SuiteParams { aead: &ring::aead::AES_256_GCM, hash: HashAlg::Sha384, key_len: 32 },
            Protection::Tls12Gcm,
            4,
        )),
        0xcca8 | 0xcca9 => Some((
            SuiteParams { aead: &ring::aead::CHACHA20_POLY1305, hash: HashAlg::Sha256, key_len: 32 },
            Protection::Tls12ChaCha,
            12,
        )),
        _ => None,
    }
}

fn agreement_alg(group: u16) -> Option<&'static agreement::Algorithm> {
    match group {
        0x001d => Some(&agreement::X25519),
        0x0017 => Some(&agreement::ECDH_P256),
        0x0018 => Some(&agreement::ECDH_P384),
        _ => None,
    }
}

/// ML-KEM 混合组的客户端份额长度（经典点 + ML-KEM 封装密钥）
fn placeholder_share(group: u16) -> Vec<u8> {
    match group {
        0x11ec => random_bytes(32 + 1184),  // X25519MLKEM768
        0x11eb => random_bytes(65 + 1184),  // SecP256r1MLKEM768
        0x11ed => random_bytes(97 + 1568),  // SecP384r1MLKEM1024
        g if is_grease_value(g) => vec![0],
        _ => vec![0],
    }
}

fn handshake_err(err: io::Error) -> RequesterError {
    match err.kind() {
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => {
            RequesterError::Timeout(format!("tls handshake timeout: {}", err))
        }
        _ => RequesterError::Network(format!("tls handshake failed: {}", err)),
    }
}

fn invalid(msg: impl Into<String>) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, msg.into())
}

fn alert_error(data: &[u8]) -> io::Error {
    let description = data.get(1).copied().unwrap_or(0);
    invalid(format!("tls alert received: {}", description))
}

/// 握手期间的记录收发；pending_open 在收到服务器 CCS 时生效（TLS 1.2）
struct HandshakeTransport<'a> {
    stream: &'a mut TcpStream,
    open: Option<OpenState>,
    pending_open: Option<OpenState>,
    hs_buf: Vec<u8>,
}

impl<'a> HandshakeTransport<'a> {
    fn new(stream: &'a mut TcpStream) -> Self {
        Self { stream, open: None, pending_open: None, hs_buf: Vec::new() }
    }

    /// 下一条完整的握手消息（类型 + 含头部的完整字节）
    fn next_handshake(&mut self) -> io::Result<(u8, Vec<u8>)> {
        loop {
            if let Some((msg_type, consumed)) = split_handshake_message(&self.hs_buf) {
                let full: Vec<u8> = self.hs_buf.drain(..consumed).collect();
                return Ok((msg_type, full));
            }

            let record = read_raw_record(&mut *self.stream)?;
            if record.content_type == content_types::CHANGE_CIPHER_SPEC {
                if let Some(open) = self.pending_open.take() {
                    self.open = Some(open);
                }
                continue;
            }

            let (content_type, data) = match &mut self.open {
                Some(open) => open.open(record)?,
                None => (record.content_type, record.payload),
            };
            match content_type {
                content_types::HANDSHAKE => self.hs_buf.extend_from_slice(&data),
                content_types::ALERT => return Err(alert_error(&data)),
                content_types::CHANGE_CIPHER_SPEC => continue,
                other => {
                    return Err(invalid(format!(
                        "unexpected record type {} during handshake",
                        other
                    )))
                }
            }
        }
    }
}

/// 写一条握手消息；seal 为 None 时走明文记录
fn write_handshake(
    stream: &mut TcpStream,
    seal: Option<&mut SealState>,
    version: u16,
    msg: &[u8],
) -> io::Result<()> {
    match seal {
        Some(seal) => {
            let (wire_type, payload) = seal.seal(content_types::HANDSHAKE, msg)?;
            write_raw_record(stream, wire_type, 0x0303, &payload)
        }
        None => write_raw_record(stream, content_types::HANDSHAKE, version, msg),
    }
}

/// 对已拨通的 socket 执行握手，成功后 socket 的所有权移交给 TlsStream
pub fn connect(mut stream: TcpStream, spec: &ClientHelloSpec) -> Result<TlsStream> {
    connect_io(&mut stream, spec)
        .map(|(read, write)| TlsStream { tcp: stream, read, write })
        .map_err(handshake_err)
}

fn connect_io(stream: &mut TcpStream, spec: &ClientHelloSpec) -> io::Result<(ReadState, WriteState)> {
    let rng = SystemRandom::new();

    // 为公钥留空的 key share 条目生成密钥对；
    // ML-KEM 混合组与 GREASE 组只能给占位份额
    let mut publics: HashMap<u16, Vec<u8>> = HashMap::new();
    let mut privates: HashMap<u16, agreement::EphemeralPrivateKey> = HashMap::new();
    for ext in &spec.extensions {
        if let Extension::KeyShare(entries) = ext {
            for entry in entries {
                if !entry.data.is_empty() || publics.contains_key(&entry.group) {
                    continue;
                }
                match agreement_alg(entry.group) {
                    Some(alg) => {
                        let private = agreement::EphemeralPrivateKey::generate(alg, &rng)
                            .map_err(|_| invalid("key share generation failed"))?;
                        let public = private
                            .compute_public_key()
                            .map_err(|_| invalid("key share generation failed"))?;
                        publics.insert(entry.group, public.as_ref().to_vec());
                        privates.insert(entry.group, private);
                    }
                    None => {
                        publics.insert(entry.group, placeholder_share(entry.group));
                    }
                }
            }
        }
    }

    let client_random = {
        let bytes = random_bytes(32);
        let mut random = [0u8; 32];
        random.copy_from_slice(&bytes);
        random
    };
    let session_id = random_session_id();

    let client_hello = serialize_client_hello(spec, &client_random, &session_id, &publics);
    // 首条记录沿用 0x0301 的 legacy 记录版本（浏览器行为）
    write_raw_record(stream, content_types::HANDSHAKE, 0x0301, &client_hello)?;
    stream.flush()?;

    let mut transport = HandshakeTransport::new(stream);
    let (msg_type, server_hello_msg) = transport.next_handshake()?;
    if msg_type != handshake_types::SERVER_HELLO {
        return Err(invalid(format!("expected server hello, got message type {}", msg_type)));
    }
    let server_hello = parse_server_hello(&server_hello_msg[4..])?;
    if server_hello.is_hello_retry_request() {
        return Err(invalid("server sent HelloRetryRequest"));
    }

    let version = match server_hello.selected_version {
        Some(0x0304) => Version::Tls13,
        Some(v) => return Err(invalid(format!("server selected unsupported version {:#06x}", v))),
        None if server_hello.legacy_version == 0x0303 => Version::Tls12,
        None => {
            return Err(invalid(format!(
                "server selected unsupported version {:#06x}",
                server_hello.legacy_version
            )))
        }
    };

    match version {
        Version::Tls13 => handshake_tls13(
            transport,
            &client_hello,
            &server_hello_msg,
            server_hello,
            privates,
        ),
        Version::Tls12 => handshake_tls12(
            transport,
            spec,
            &client_hello,
            &server_hello_msg,
            server_hello,
            &client_random,
            privates,
        ),
    }
}

fn agree(
    private: agreement::EphemeralPrivateKey,
    alg: &'static agreement::Algorithm,
    peer_public: &[u8],
) -> io::Result<Vec<u8>> {
    agreement::agree_ephemeral(
        private,
        &agreement::UnparsedPublicKey::new(alg, peer_public),
        |secret| secret.to_vec(),
    )
    .map_err(|_| invalid("key agreement failed"))
}

fn handshake_tls13(
    mut transport: HandshakeTransport<'_>,
    client_hello: &[u8],
    server_hello_msg: &[u8],
    server_hello: super::messages::ServerHello,
    mut privates: HashMap<u16, agreement::EphemeralPrivateKey>,
) -> io::Result<(ReadState, WriteState)> {
    let suite = tls13_suite(server_hello.cipher_suite)
        .ok_or_else(|| invalid(format!("server selected unsupported cipher suite {:#06x}", server_hello.cipher_suite)))?;
    let hash = suite.hash;

    let (group, server_public) = server_hello
        .key_share
        .ok_or_else(|| invalid("server hello missing key share"))?;
    let alg = agreement_alg(group)
        .ok_or_else(|| invalid(format!("server selected unsupported group {:#06x}", group)))?;
    let private = privates
        .remove(&group)
        .ok_or_else(|| invalid(format!("server selected group {:#06x} we did not offer a usable key for", group)))?;
    let shared_secret = agree(private, alg, &server_public)?;

    let mut transcript = TranscriptHash::new(hash);
    transcript.update(client_hello);
    transcript.update(server_hello_msg);

    let secrets = derive_handshake_secrets(hash, &shared_secret, &transcript.finalize());
    let server_keys = traffic_keys(hash, &secrets.server_hs_traffic, suite.key_len);
    transport.open = Some(OpenState::new(suite.aead, &server_keys.key, &server_keys.iv, Protection::Tls13)?);
    let client_keys = traffic_keys(hash, &secrets.client_hs_traffic, suite.key_len);
    let mut client_seal = SealState::new(suite.aead, &client_keys.key, &client_keys.iv, Protection::Tls13)?;

    // 中间盒兼容：ServerHello 之后发一条明文 CCS
    write_raw_record(
        &mut *transport.stream,
        content_types::CHANGE_CIPHER_SPEC,
        0x0303,
        &[1],
    )?;

    // 吃掉加密 flight，直到服务器 Finished；证书内容不校验，只进转写哈希
    let mut certificate_requested = false;
    loop {
        let (msg_type, msg) = transport.next_handshake()?;
        match msg_type {
            handshake_types::FINISHED => {
                let expected = finished_verify_data(hash, &secrets.server_hs_traffic, &transcript.finalize());
                if msg[4..] != expected[..] {
                    return Err(invalid("server finished verification failed"));
                }
                transcript.update(&msg);
                break;
            }
            handshake_types::CERTIFICATE_REQUEST => {
                certificate_requested = true;
                transcript.update(&msg);
            }
            handshake_types::ENCRYPTED_EXTENSIONS
            | handshake_types::CERTIFICATE
            | handshake_types::CERTIFICATE_VERIFY => {
                transcript.update(&msg);
            }
            other => return Err(invalid(format!("unexpected handshake message {} in server flight", other))),
        }
    }

    // 应用流量秘密基于服务器 Finished 为止的转写
    let (client_app_secret, server_app_secret) =
        derive_application_secrets(hash, &secrets.master_secret, &transcript.finalize());

    // 被要求客户端证书时回一条空 Certificate
    if certificate_requested {
        let empty_certificate = handshake_message(handshake_types::CERTIFICATE, &[0, 0, 0, 0]);
        write_handshake(&mut *transport.stream, Some(&mut client_seal), 0x0303, &empty_certificate)?;
        transcript.update(&empty_certificate);
    }

    let verify = finished_verify_data(hash, &secrets.client_hs_traffic, &transcript.finalize());
    let finished = handshake_message(handshake_types::FINISHED, &verify);
    write_handshake(&mut *transport.stream, Some(&mut client_seal), 0x0303, &finished)?;
    transport.stream.flush()?;

    let server_app_keys = traffic_keys(hash, &server_app_secret, suite.key_len);
    let open = OpenState::new(suite.aead, &server_app_keys.key, &server_app_keys.iv, Protection::Tls13)?;
    let client_app_keys = traffic_keys(hash, &client_app_secret, suite.key_len);
    let seal = SealState::new(suite.aead, &client_app_keys.key, &client_app_keys.iv, Protection::Tls13)?;

    let read = ReadState {
        open,
        plain: Vec::new(),
        plain_pos: 0,
        hs_buf: Vec::new(),
        eof: false,
        key_update: Some(Tls13ReadSecret {
            secret: server_app_secret,
            hash,
            aead: suite.aead,
            key_len: suite.key_len,
        }),
    };
    Ok((read, WriteState { seal }))
}

#[allow(clippy::too_many_arguments)]
fn handshake_tls12(
    mut transport: HandshakeTransport<'_>,
    spec: &ClientHelloSpec,
    client_hello: &[u8],
    server_hello_msg: &[u8],
    server_hello: super::messages::ServerHello,
    client_random: &[u8; 32],
    mut privates: HashMap<u16, agreement::EphemeralPrivateKey>,
) -> io::Result<(ReadState, WriteState)> {
    let (suite, protection, fixed_iv_len) = tls12_suite(server_hello.cipher_suite)
        .ok_or_else(|| invalid(format!("server selected unsupported cipher suite {:#06x}", server_hello.cipher_suite)))?;
    let hash = suite.hash;

    // extended_master_secret 只有双方都带了扩展才生效
    let offered_ems = spec.extensions.iter().any(|e| matches!(e, Extension::ExtendedMasterSecret));
    let use_ems = offered_ems && server_hello.extended_master_secret;

    let mut transcript = TranscriptHash::new(hash);
    transcript.update(client_hello);
    transcript.update(server_hello_msg);

    // 服务器第一个 flight：Certificate ... ServerHelloDone
    let mut server_kx: Option<(u16, Vec<u8>)> = None;
    let mut certificate_requested = false;
    loop {
        let (msg_type, msg) = transport.next_handshake()?;
        transcript.update(&msg);
        match msg_type {
            handshake_types::CERTIFICATE | handshake_types::CERTIFICATE_STATUS => {}
            handshake_types::SERVER_KEY_EXCHANGE => {
                server_kx = Some(parse_server_key_exchange(&msg[4..])?);
            }
            handshake_types::CERTIFICATE_REQUEST => certificate_requested = true,
            handshake_types::SERVER_HELLO_DONE => break,
            other => return Err(invalid(format!("unexpected handshake message {} in server flight", other))),
        }
    }

    let (curve, server_public) =
        server_kx.ok_or_else(|| invalid("server key exchange missing (static key exchange unsupported)"))?;
    let alg = agreement_alg(curve)
        .ok_or_else(|| invalid(format!("server selected unsupported curve {:#06x}", curve)))?;

    // 优先复用 key_share 里已生成的密钥，没有就为该曲线新生成
    let private = match privates.remove(&curve) {
        Some(private) => private,
        None => agreement::EphemeralPrivateKey::generate(alg, &SystemRandom::new())
            .map_err(|_| invalid("key generation failed"))?,
    };
    let client_public = private
        .compute_public_key()
        .map_err(|_| invalid("key generation failed"))?
        .as_ref()
        .to_vec();
    let pre_master = agree(private, alg, &server_public)?;

    // 客户端 flight：[空 Certificate]、ClientKeyExchange、CCS、Finished
    if certificate_requested {
        let empty_certificate = handshake_message(handshake_types::CERTIFICATE, &[0, 0, 0]);
        write_handshake(&mut *transport.stream, None, 0x0303, &empty_certificate)?;
        transcript.update(&empty_certificate);
    }

    let key_exchange =
        handshake_message(handshake_types::CLIENT_KEY_EXCHANGE, &client_key_exchange_body(&client_public));
    write_handshake(&mut *transport.stream, None, 0x0303, &key_exchange)?;
    transcript.update(&key_exchange);

    let master_secret = if use_ems {
        // RFC 7627：session_hash 截止到 ClientKeyExchange
        prf12(hash, &pre_master, "extended master secret", &transcript.finalize(), 48)
    } else {
        let mut seed = Vec::with_capacity(64);
        seed.extend_from_slice(client_random);
        seed.extend_from_slice(&server_hello.random);
        prf12(hash, &pre_master, "master secret", &seed, 48)
    };

    // key_block：client_key || server_key || client_iv || server_iv
    let mut key_seed = Vec::with_capacity(64);
    key_seed.extend_from_slice(&server_hello.random);
    key_seed.extend_from_slice(client_random);
    let key_block = prf12(
        hash,
        &master_secret,
        "key expansion",
        &key_seed,
        2 * suite.key_len + 2 * fixed_iv_len,
    );
    let (client_key, rest) = key_block.split_at(suite.key_len);
    let (server_key, rest) = rest.split_at(suite.key_len);
    let (client_iv, server_iv) = rest.split_at(fixed_iv_len);

    write_raw_record(&mut *transport.stream, content_types::CHANGE_CIPHER_SPEC, 0x0303, &[1])?;
    let mut client_seal = SealState::new(suite.aead, client_key, client_iv, protection)?;

    let client_verify = prf12(hash, &master_secret, "client finished", &transcript.finalize(), 12);
    let finished = handshake_message(handshake_types::FINISHED, &client_verify);
    write_handshake(&mut *transport.stream, Some(&mut client_seal), 0x0303, &finished)?;
    transport.stream.flush()?;
    transcript.update(&finished);

    // 服务器 CCS 到达后切换解密状态，再验证服务器 Finished
    transport.pending_open = Some(OpenState::new(suite.aead, server_key, server_iv, protection)?);
    loop {
        let (msg_type, msg) = transport.next_handshake()?;
        match msg_type {
            handshake_types::NEW_SESSION_TICKET => {
                transcript.update(&msg);
            }
            handshake_types::FINISHED => {
                let expected = prf12(hash, &master_secret, "server finished", &transcript.finalize(), 12);
                if msg[4..] != expected[..] {
                    return Err(invalid("server finished verification failed"));
                }
                break;
            }
            other => return Err(invalid(format!("unexpected handshake message {} after client finished", other))),
        }
    }

    let open = transport
        .open
        .take()
        .ok_or_else(|| invalid("server finished arrived before change cipher spec"))?;

    let read = ReadState {
        open,
        plain: Vec::new(),
        plain_pos: 0,
        hs_buf: Vec::new(),
        eof: false,
        key_update: None,
    };
    Ok((read, WriteState { seal: client_seal }))
}

/// TLS 1.3 读方向的 KeyUpdate 材料
struct Tls13ReadSecret {
    secret: Vec<u8>,
    hash: HashAlg,
    aead: &'static ring::aead::Algorithm,
    key_len: usize,
}

struct ReadState {
    open: OpenState,
    plain: Vec<u8>,
    plain_pos: usize,
    hs_buf: Vec<u8>,
    eof: bool,
    key_update: Option<Tls13ReadSecret>,
}

struct WriteState {
    seal: SealState,
}

impl ReadState {
    fn read_from(&mut self, tcp: &mut TcpStream, buf: &mut [u8]) -> io::Result<usize> {
        loop {
            if self.plain_pos < self.plain.len() {
                let n = buf.len().min(self.plain.len() - self.plain_pos);
                buf[..n].copy_from_slice(&self.plain[self.plain_pos..self.plain_pos + n]);
                self.plain_pos += n;
                return Ok(n);
            }
            if self.eof {
                return Ok(0);
            }

            let record = match read_raw_record(tcp) {
                Ok(record) => record,
                // 对端不发 close_notify 直接断开的情况按 EOF 处理
                Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
                    self.eof = true;
                    return Ok(0);
                }
                Err(e) => return Err(e),
            };
            if record.content_type == content_types::CHANGE_CIPHER_SPEC {
                continue;
            }

            let (content_type, data) = self.open.open(record)?;
            match content_type {
                content_types::APPLICATION_DATA => {
                    if data.is_empty() {
                        continue;
                    }
                    self.plain = data;
                    self.plain_pos = 0;
                }
                content_types::ALERT => {
                    // close_notify = 干净的 EOF，其余警报为错误
                    if data.get(1) == Some(&0) {
                        self.eof = true;
                        return Ok(0);
                    }
                    return Err(alert_error(&data));
                }
                content_types::HANDSHAKE => self.handle_post_handshake(&data)?,
                _ => continue,
            }
        }
    }

    /// 握手后消息：NewSessionTicket 忽略，KeyUpdate 滚动读方向密钥
    fn handle_post_handshake(&mut self, data: &[u8]) -> io::Result<()> {
        self.hs_buf.extend_from_slice(data);
        while let Some((msg_type, consumed)) = split_handshake_message(&self.hs_buf) {
            match msg_type {
                handshake_types::KEY_UPDATE => {
                    if let Some(ku) = &mut self.key_update {
                        ku.secret = next_traffic_secret(ku.hash, &ku.secret);
                        let keys = traffic_keys(ku.hash, &ku.secret, ku.key_len);
                        self.open = OpenState::new(ku.aead, &keys.key, &keys.iv, Protection::Tls13)?;
                    }
                }
                handshake_types::NEW_SESSION_TICKET => {}
                _ => {}
            }
            self.hs_buf.drain(..consumed);
        }
        Ok(())
    }
}

impl WriteState {
    fn write_to(&mut self, tcp: &mut TcpStream, buf: &[u8]) -> io::Result<usize> {
        for chunk in buf.chunks(MAX_PLAINTEXT) {
            let (wire_type, payload) = self.seal.seal(content_types::APPLICATION_DATA, chunk)?;
            write_raw_record(tcp, wire_type, 0x0303, &payload)?;
        }
        Ok(buf.len())
    }
}

/// 握手完成后的加密流；持有 socket 的所有权
pub struct TlsStream {
    tcp: TcpStream,
    read: ReadState,
    write: WriteState,
}

impl TlsStream {
    /// 设置底层 TCP 的读超时
    pub fn set_read_timeout(&self, timeout: Option<Duration>) -> io::Result<()> {
        self.tcp.set_read_timeout(timeout)
    }

    /// 清除读超时（流式转发前调用）
    pub fn clear_read_deadline(&self) -> io::Result<()> {
        self.tcp.set_read_timeout(None)
    }

    /// 底层 TCP 的另一个句柄，用于在流拆分后继续控制读超时
    pub fn tcp_clone(&self) -> io::Result<TcpStream> {
        self.tcp.try_clone()
    }

    /// 拆成读写两半（HTTP/2 适配层使用）
    pub fn split(self) -> io::Result<(TlsReadHalf, TlsWriteHalf)> {
        let tcp_write = self.tcp.try_clone()?;
        Ok((
            TlsReadHalf { tcp: self.tcp, state: self.read },
            TlsWriteHalf { tcp: tcp_write, state: self.write },
        ))
    }
}

impl Read for TlsStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.read.read_from(&mut self.tcp, buf)
    }
}

impl Write for TlsStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.write.write_to(&mut self.tcp, buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.tcp.flush()
    }
}

/// 读半部
pub struct TlsReadHalf {
    tcp: TcpStream,
    state: ReadState,
}

impl Read for TlsReadHalf {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.state.read_from(&mut self.tcp, buf)
    }
}

/// 写半部
pub struct TlsWriteHalf {
    tcp: TcpStream,
    state: WriteState,
}

impl Write for TlsWriteHalf {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.state.write_to(&mut self.tcp, buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.tcp.flush()
    }
}
