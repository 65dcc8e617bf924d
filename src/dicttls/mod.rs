//! TLS 字典模块
//!
//! 提供 TLS 相关的常量与名称映射表，对应 Go 版本的 dicttls 包
//! 数据来源：IANA TLS Parameters

pub mod cipher_suites;
pub mod extensions;
pub mod signature_schemes;
pub mod supported_groups;

pub use cipher_suites::CIPHER_MAP;
pub use extensions::*;
pub use signature_schemes::SIG_ALG_MAP;
pub use supported_groups::CURVE_MAP;
