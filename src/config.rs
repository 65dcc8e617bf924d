//! 配置与请求类型
//!
//! 与配置文件/标准输入的 JSON 形状一一对应，
//! 字段全部带默认值，缺省字段按 Go 版本的零值处理

use crate::error::{RequesterError, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;

/// 磁盘配置文件：`{timeout, proxy, fingerprint}`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub timeout: TimeoutConfig,
    pub proxy: ProxyConfig,
    pub fingerprint: FingerprintConfig,
    pub dns: Option<DnsConfig>,
}

/// 超时配置（秒）
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TimeoutConfig {
    pub connect: u64,
    pub read: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { connect: 30, read: 30 }
    }
}

/// 代理配置
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProxyConfig {
    pub enabled: bool,
    #[serde(rename = "type")]
    pub proxy_type: String,
    pub url: String,
}

/// 自定义 DNS 服务器配置
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DnsConfig {
    /// `host:port` 形式的服务器列表，按声明顺序查询
    pub servers: Vec<String>,
}

/// 指纹声明
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FingerprintConfig {
    pub tls_version_min: String,
    pub tls_version_max: String,
    pub http2: bool,
    pub grease: bool,
    pub ciphers: Vec<String>,
    pub compression_methods: Vec<u8>,
    pub extensions: Vec<ExtensionConfig>,
}

/// 单个扩展声明：名称 + 动态参数表
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExtensionConfig {
    pub name: String,
    #[serde(default)]
    pub data: serde_json::Map<String, serde_json::Value>,
}

/// 一次请求
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Request {
    pub method: String,
    pub url: String,
    pub headers: HashMap<String, String>,
    pub body: String,
    pub config_path: String,
    pub timeout: Option<TimeoutConfig>,
    pub proxy: Option<ProxyConfig>,
    pub dns: Option<DnsConfig>,
}

/// 从磁盘加载配置文件
pub fn load_config(path: &str) -> Result<Config> {
    let data = fs::read_to_string(path)
        .map_err(|e| RequesterError::Config(format!("failed to load config {}: {}", path, e)))?;
    serde_json::from_str(&data)
        .map_err(|e| RequesterError::Config(format!("failed to parse config {}: {}", path, e)))
}

impl Config {
    /// 把请求级别的覆盖合并进配置
    /// 超时字段为正时覆盖；proxy/dns 整体替换
    pub fn apply_request_overrides(&mut self, req: &Request) {
        if let Some(timeout) = &req.timeout {
            if timeout.connect > 0 {
                self.timeout.connect = timeout.connect;
            }
            if timeout.read > 0 {
                self.timeout.read = timeout.read;
            }
        }
        if let Some(proxy) = &req.proxy {
            self.proxy = proxy.clone();
        }
        if let Some(dns) = &req.dns {
            self.dns = Some(dns.clone());
        }
    }
}
