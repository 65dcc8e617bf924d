//! TLS 支持的组（椭圆曲线）常量
//!
//! 来源：https://www.iana.org/assignments/tls-parameters/tls-parameters.xhtml#tls-parameters-8

use once_cell::sync::Lazy;
use std::collections::HashMap;

pub const SECP256R1: u16 = 0x0017; // 23
pub const SECP384R1: u16 = 0x0018; // 24
pub const SECP521R1: u16 = 0x0019; // 25
pub const X25519: u16 = 0x001d; // 29

// 后量子混合组（IANA 正式分配的码点）
pub const SECP256R1_MLKEM768: u16 = 0x11eb;
pub const X25519_MLKEM768: u16 = 0x11ec;
pub const SECP384R1_MLKEM1024: u16 = 0x11ed;

// GREASE placeholder
pub const GREASE_PLACEHOLDER: u16 = 0x0a0a;

/// 为了与 Go 版本保持一致，提供别名
pub const CURVE_P256: u16 = SECP256R1;
pub const CURVE_P384: u16 = SECP384R1;
pub const CURVE_P521: u16 = SECP521R1;

/// 曲线名 → group id
/// 内部名（对应 Go 版本的 tls.CurveP256 等）与 IANA 别名都可解析
pub static CURVE_MAP: Lazy<HashMap<&'static str, u16>> = Lazy::new(|| {
    HashMap::from([
        ("X25519", X25519),
        ("CurveP256", CURVE_P256),
        ("CurveP384", CURVE_P384),
        ("CurveP521", CURVE_P521),
        ("secp256r1", SECP256R1),
        ("secp384r1", SECP384R1),
        ("secp521r1", SECP521R1),
        ("X25519MLKEM768", X25519_MLKEM768),
        ("SecP256r1MLKEM768", SECP256R1_MLKEM768),
        ("SecP384r1MLKEM1024", SECP384R1_MLKEM1024),
    ])
});
