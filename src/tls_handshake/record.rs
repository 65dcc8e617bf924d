//! TLS 记录层
//!
//! 明文记录的读写与两代 AEAD 保护：
//! TLS 1.3 按 RFC 8446 §5.2（内层内容类型 + 序号异或 IV），
//! TLS 1.2 按 RFC 5288 GCM 显式 nonce / RFC 7905 ChaCha20 隐式 nonce。

use ring::aead::{Aad, LessSafeKey, Nonce, UnboundKey};
use std::io::{self, Read, Write};

/// 记录内容类型
pub mod content_types {
    pub const CHANGE_CIPHER_SPEC: u8 = 20;
    pub const ALERT: u8 = 21;
    pub const HANDSHAKE: u8 = 22;
    pub const APPLICATION_DATA: u8 = 23;
}

/// 明文记录上限
pub const MAX_PLAINTEXT: usize = 16_384;
/// 密文记录上限（明文 + AEAD 开销余量）
pub const MAX_CIPHERTEXT: usize = MAX_PLAINTEXT + 256;

/// 线上的一条原始记录
#[derive(Debug, Clone)]
pub struct RawRecord {
    pub content_type: u8,
    pub version: u16,
    pub payload: Vec<u8>,
}

/// 读取一条记录（5 字节头 + 负载）
pub fn read_raw_record(r: &mut impl Read) -> io::Result<RawRecord> {
    let mut header = [0u8; 5];
    r.read_exact(&mut header)?;
    let content_type = header[0];
    let version = u16::from_be_bytes([header[1], header[2]]);
    let length = u16::from_be_bytes([header[3], header[4]]) as usize;
    if length > MAX_CIPHERTEXT {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("oversized tls record: {} bytes", length),
        ));
    }
    let mut payload = vec![0u8; length];
    r.read_exact(&mut payload)?;
    Ok(RawRecord { content_type, version, payload })
}

/// 写出一条记录
pub fn write_raw_record(
    w: &mut impl Write,
    content_type: u8,
    version: u16,
    payload: &[u8],
) -> io::Result<()> {
    let mut record = Vec::with_capacity(5 + payload.len());
    record.push(content_type);
    record.extend_from_slice(&version.to_be_bytes());
    record.extend_from_slice(&(payload.len() as u16).to_be_bytes());
    record.extend_from_slice(payload);
    w.write_all(&record)
}

/// AEAD 保护方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protection {
    /// TLS 1.3：内层内容类型，nonce = iv XOR seq
    Tls13,
    /// TLS 1.2 AES-GCM：4 字节隐式盐 + 8 字节显式 nonce
    Tls12Gcm,
    /// TLS 1.2 ChaCha20-Poly1305：nonce = iv XOR seq
    Tls12ChaCha,
}

fn xor_nonce(iv: &[u8; 12], seq: u64) -> Nonce {
    let mut nonce = *iv;
    let seq_bytes = seq.to_be_bytes();
    for (n, s) in nonce[4..].iter_mut().zip(seq_bytes.iter()) {
        *n ^= s;
    }
    Nonce::assume_unique_for_key(nonce)
}

fn crypto_err(what: &str) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, format!("tls record {} failed", what))
}

/// 加密方向状态
pub struct SealState {
    key: LessSafeKey,
    iv: [u8; 12],
    seq: u64,
    protection: Protection,
}

impl SealState {
    pub fn new(
        aead: &'static ring::aead::Algorithm,
        key: &[u8],
        iv: &[u8],
        protection: Protection,
    ) -> io::Result<Self> {
        let unbound = UnboundKey::new(aead, key).map_err(|_| crypto_err("key setup"))?;
        let mut iv_buf = [0u8; 12];
        iv_buf[..iv.len()].copy_from_slice(iv);
        Ok(Self {
            key: LessSafeKey::new(unbound),
            iv: iv_buf,
            seq: 0,
            protection,
        })
    }

    /// 封装一条记录，返回（线上内容类型，线上负载）
    pub fn seal(&mut self, content_type: u8, plaintext: &[u8]) -> io::Result<(u8, Vec<u8>)> {
        let result = match self.protection {
            Protection::Tls13 => {
                let mut inner = Vec::with_capacity(plaintext.len() + 1);
                inner.extend_from_slice(plaintext);
                inner.push(content_type);

                let total_len = inner.len() + 16;
                let aad = [
                    content_types::APPLICATION_DATA,
                    0x03,
                    0x03,
                    (total_len >> 8) as u8,
                    total_len as u8,
                ];
                let nonce = xor_nonce(&self.iv, self.seq);
                let tag = self
                    .key
                    .seal_in_place_separate_tag(nonce, Aad::from(aad), &mut inner)
                    .map_err(|_| crypto_err("seal"))?;
                inner.extend_from_slice(tag.as_ref());
                (content_types::APPLICATION_DATA, inner)
            }
            Protection::Tls12Gcm => {
                let explicit = self.seq.to_be_bytes();
                let mut nonce_bytes = [0u8; 12];
                nonce_bytes[..4].copy_from_slice(&self.iv[..4]);
                nonce_bytes[4..].copy_from_slice(&explicit);
                let nonce = Nonce::assume_unique_for_key(nonce_bytes);

                let aad = tls12_aad(self.seq, content_type, plaintext.len());
                let mut buf = plaintext.to_vec();
                let tag = self
                    .key
                    .seal_in_place_separate_tag(nonce, Aad::from(aad), &mut buf)
                    .map_err(|_| crypto_err("seal"))?;

                let mut payload = Vec::with_capacity(8 + buf.len() + 16);
                payload.extend_from_slice(&explicit);
                payload.extend_from_slice(&buf);
                payload.extend_from_slice(tag.as_ref());
                (content_type, payload)
            }
            Protection::Tls12ChaCha => {
                let nonce = xor_nonce(&self.iv, self.seq);
                let aad = tls12_aad(self.seq, content_type, plaintext.len());
                let mut buf = plaintext.to_vec();
                let tag = self
                    .key
                    .seal_in_place_separate_tag(nonce, Aad::from(aad), &mut buf)
                    .map_err(|_| crypto_err("seal"))?;
                buf.extend_from_slice(tag.as_ref());
                (content_type, buf)
            }
        };
        self.seq = self.seq.wrapping_add(1);
        Ok(result)
    }
}

/// 解密方向状态
pub struct OpenState {
    key: LessSafeKey,
    iv: [u8; 12],
    seq: u64,
    protection: Protection,
}

impl OpenState {
    pub fn new(
        aead: &'static ring::aead::Algorithm,
        key: &[u8],
        iv: &[u8],
        protection: Protection,
    ) -> io::Result<Self> {
        let unbound = UnboundKey::new(aead, key).map_err(|_| crypto_err("key setup"))?;
        let mut iv_buf = [0u8; 12];
        iv_buf[..iv.len()].copy_from_slice(iv);
        Ok(Self {
            key: LessSafeKey::new(unbound),
            iv: iv_buf,
            seq: 0,
            protection,
        })
    }

    /// 解开一条记录，返回（真实内容类型，明文）
    pub fn open(&mut self, record: RawRecord) -> io::Result<(u8, Vec<u8>)> {
        let result = match self.protection {
            Protection::Tls13 => {
                let mut buf = record.payload;
                let aad = [
                    record.content_type,
                    (record.version >> 8) as u8,
                    record.version as u8,
                    (buf.len() >> 8) as u8,
                    buf.len() as u8,
                ];
                let nonce = xor_nonce(&self.iv, self.seq);
                let plain_len = self
                    .key
                    .open_in_place(nonce, Aad::from(aad), &mut buf)
                    .map_err(|_| crypto_err("open"))?
                    .len();
                buf.truncate(plain_len);

                // 去掉尾部零填充，末字节为内层内容类型
                while buf.last() == Some(&0) {
                    buf.pop();
                }
                let content_type = buf
                    .pop()
                    .ok_or_else(|| crypto_err("inner content type"))?;
                (content_type, buf)
            }
            Protection::Tls12Gcm => {
                if record.payload.len() < 8 + 16 {
                    return Err(crypto_err("short record"));
                }
                let (explicit, ciphertext) = record.payload.split_at(8);
                let mut nonce_bytes = [0u8; 12];
                nonce_bytes[..4].copy_from_slice(&self.iv[..4]);
                nonce_bytes[4..].copy_from_slice(explicit);
                let nonce = Nonce::assume_unique_for_key(nonce_bytes);

                let plain_len = ciphertext.len() - 16;
                let aad = tls12_aad(self.seq, record.content_type, plain_len);
                let mut buf = ciphertext.to_vec();
                let got = self
                    .key
                    .open_in_place(nonce, Aad::from(aad), &mut buf)
                    .map_err(|_| crypto_err("open"))?
                    .len();
                buf.truncate(got);
                (record.content_type, buf)
            }
            Protection::Tls12ChaCha => {
                if record.payload.len() < 16 {
                    return Err(crypto_err("short record"));
                }
                let nonce = xor_nonce(&self.iv, self.seq);
                let plain_len = record.payload.len() - 16;
                let aad = tls12_aad(self.seq, record.content_type, plain_len);
                let mut buf = record.payload;
                let got = self
                    .key
                    .open_in_place(nonce, Aad::from(aad), &mut buf)
                    .map_err(|_| crypto_err("open"))?
                    .len();
                buf.truncate(got);
                (record.content_type, buf)
            }
        };
        self.seq = self.seq.wrapping_add(1);
        Ok(result)
    }
}

/// TLS 1.2 的 additional_data：seq || type || version || length
fn tls12_aad(seq: u64, content_type: u8, plain_len: usize) -> [u8; 13] {
    let mut aad = [0u8; 13];
    aad[..8].copy_from_slice(&seq.to_be_bytes());
    aad[8] = content_type;
    aad[9] = 0x03;
    aad[10] = 0x03;
    aad[11] = (plain_len >> 8) as u8;
    aad[12] = plain_len as u8;
    aad
}

#[cfg(test)]
mod tests {
    use super::*;
    use ring::aead::AES_128_GCM;
    use std::io::Cursor;

    #[test]
    fn test_raw_record_roundtrip() {
        let mut buf = Vec::new();
        write_raw_record(&mut buf, content_types::HANDSHAKE, 0x0301, b"hello").unwrap();
        assert_eq!(&buf[..5], &[22, 3, 1, 0, 5]);

        let rec = read_raw_record(&mut Cursor::new(buf)).unwrap();
        assert_eq!(rec.content_type, content_types::HANDSHAKE);
        assert_eq!(rec.version, 0x0301);
        assert_eq!(rec.payload, b"hello");
    }

    #[test]
    fn test_oversized_record_rejected() {
        let mut header = vec![22, 3, 3];
        header.extend_from_slice(&((MAX_CIPHERTEXT as u16) + 1).to_be_bytes());
        assert!(read_raw_record(&mut Cursor::new(header)).is_err());
    }

    #[test]
    fn test_tls13_seal_open_roundtrip() {
        let key = [7u8; 16];
        let iv = [9u8; 12];
        let mut seal = SealState::new(&AES_128_GCM, &key, &iv, Protection::Tls13).unwrap();
        let mut open = OpenState::new(&AES_128_GCM, &key, &iv, Protection::Tls13).unwrap();

        for i in 0..3u8 {
            let plaintext = vec![i; 100];
            let (wire_type, payload) = seal.seal(content_types::APPLICATION_DATA, &plaintext).unwrap();
            assert_eq!(wire_type, content_types::APPLICATION_DATA);
            let record = RawRecord {
                content_type: wire_type,
                version: 0x0303,
                payload,
            };
            let (content_type, plain) = open.open(record).unwrap();
            assert_eq!(content_type, content_types::APPLICATION_DATA);
            assert_eq!(plain, plaintext);
        }
    }

    #[test]
    fn test_tls13_inner_handshake_type() {
        let key = [1u8; 16];
        let iv = [2u8; 12];
        let mut seal = SealState::new(&AES_128_GCM, &key, &iv, Protection::Tls13).unwrap();
        let mut open = OpenState::new(&AES_128_GCM, &key, &iv, Protection::Tls13).unwrap();

        let (wire_type, payload) = seal.seal(content_types::HANDSHAKE, b"finished").unwrap();
        // 线上统一伪装为 application_data
        assert_eq!(wire_type, content_types::APPLICATION_DATA);
        let (content_type, plain) = open
            .open(RawRecord { content_type: wire_type, version: 0x0303, payload })
            .unwrap();
        assert_eq!(content_type, content_types::HANDSHAKE);
        assert_eq!(plain, b"finished");
    }

    #[test]
    fn test_tls12_gcm_roundtrip() {
        let key = [3u8; 16];
        let salt = [5u8; 4];
        let mut seal = SealState::new(&AES_128_GCM, &key, &salt, Protection::Tls12Gcm).unwrap();
        let mut open = OpenState::new(&AES_128_GCM, &key, &salt, Protection::Tls12Gcm).unwrap();

        let (wire_type, payload) = seal.seal(content_types::APPLICATION_DATA, b"data").unwrap();
        assert_eq!(wire_type, content_types::APPLICATION_DATA);
        // 显式 nonce 在负载头部
        assert_eq!(&payload[..8], &0u64.to_be_bytes());
        let (_, plain) = open
            .open(RawRecord { content_type: wire_type, version: 0x0303, payload })
            .unwrap();
        assert_eq!(plain, b"data");
    }

    #[test]
    fn test_open_rejects_tampered_record() {
        let key = [7u8; 16];
        let iv = [9u8; 12];
        let mut seal = SealState::new(&AES_128_GCM, &key, &iv, Protection::Tls13).unwrap();
        let mut open = OpenState::new(&AES_128_GCM, &key, &iv, Protection::Tls13).unwrap();

        let (wire_type, mut payload) = seal.seal(content_types::APPLICATION_DATA, b"x").unwrap();
        payload[0] ^= 0xff;
        assert!(open
            .open(RawRecord { content_type: wire_type, version: 0x0303, payload })
            .is_err());
    }
}
