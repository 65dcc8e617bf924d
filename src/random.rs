//! 随机值模块
//!
//! GREASE 值、PSK 占位字节与会话 ID 均取自操作系统 CSPRNG

use rand::rngs::OsRng;
use rand::RngCore;

/// 16 个规范 GREASE 值 (RFC 8701)
pub const TLS_GREASE_VALUES: [u16; 16] = [
    0x0a0a, 0x1a1a, 0x2a2a, 0x3a3a, 0x4a4a, 0x5a5a, 0x6a6a, 0x7a7a, 0x8a8a, 0x9a9a, 0xaaaa,
    0xbaba, 0xcaca, 0xdada, 0xeaea, 0xfafa,
];

/// 判断一个 16 位值是否为 GREASE 值
pub fn is_grease_value(value: u16) -> bool {
    TLS_GREASE_VALUES.contains(&value)
}

/// 均匀随机选取一个 GREASE 值
pub fn grease_value() -> u16 {
    TLS_GREASE_VALUES[(OsRng.next_u32() % 16) as usize]
}

/// n 字节随机 PSK identity
pub fn random_identity(n: usize) -> Vec<u8> {
    random_bytes(n)
}

/// n 字节随机 PSK binder
pub fn random_binder(n: usize) -> Vec<u8> {
    random_bytes(n)
}

/// 随机的 obfuscated ticket age（大端序 32 位）
pub fn obfuscated_ticket_age() -> u32 {
    OsRng.next_u32()
}

/// TLS 1.3 兼容模式使用的 32 字节会话 ID
pub fn random_session_id() -> [u8; 32] {
    let mut id = [0u8; 32];
    OsRng.fill_bytes(&mut id);
    id
}

/// n 个 CSPRNG 字节
pub fn random_bytes(n: usize) -> Vec<u8> {
    let mut buf = vec![0u8; n];
    OsRng.fill_bytes(&mut buf);
    buf
}
