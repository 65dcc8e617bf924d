//! 定制 ClientHello 的 TLS 客户端引擎
//!
//! 分四层：
//! - `messages`：握手消息的逐字节序列化与解析
//! - `record`：记录层（明文帧 + 两代 AEAD 保护）
//! - `key_schedule`：TLS 1.3 密钥调度与 TLS 1.2 PRF
//! - `session`：握手状态机与加密流 `TlsStream`

pub mod key_schedule;
pub mod messages;
pub mod record;
pub mod session;

pub use messages::serialize_client_hello;
pub use session::{connect, TlsReadHalf, TlsStream, TlsWriteHalf};
