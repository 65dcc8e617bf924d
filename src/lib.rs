//! # tls-requester
//!
//! 按声明式指纹描述逐字节构造 TLS ClientHello 的单次 HTTPS 请求客户端，
//! 从 golang 版本迁移而来。
//!
//! ## 特性
//!
//! - ✅ **声明式指纹**：密码套件、扩展、GREASE、压缩方法、版本区间全部来自配置
//! - ✅ **逐字节 ClientHello**：顺序即声明顺序，不重排、不增删、不归一化
//! - ✅ **GREASE 处理**：套件/扩展前置 GREASE，PSK 结尾时二次插入
//! - ✅ **定制握手引擎**：TLS 1.3 完整握手，TLS 1.2 ECDHE + AEAD
//! - ✅ **代理穿透**：SOCKS5 与 HTTP CONNECT，隧道后再做定制握手
//! - ✅ **自定义 DNS**：按声明顺序 UDP 查询，失败回落系统解析器
//! - ✅ **HTTP/1.1 & HTTP/2**：h2 跑在已握手的 socket 上，绕过 ALPN
//! - ✅ **流式转发**：8 KiB 一块写到 stdout，不整体缓冲响应
//! - ✅ **单次请求**：一进程一请求，严格顺序控制流，无重试

pub mod config;
pub mod dicttls;
pub mod error;
pub mod fingerprint;
pub mod random;
pub mod requester;
pub mod tls_config;
pub mod tls_handshake;
pub mod utils;

pub use config::{
    Config, DnsConfig, ExtensionConfig, FingerprintConfig, ProxyConfig, Request, TimeoutConfig,
    load_config,
};
pub use error::{RequesterError, Result};
pub use random::{grease_value, is_grease_value, TLS_GREASE_VALUES};
pub use requester::make_request;
pub use tls_config::{ClientHelloSpec, Extension, HpkeSymmetricCipherSuite, KeyShareEntry};
pub use tls_handshake::serialize_client_hello;
