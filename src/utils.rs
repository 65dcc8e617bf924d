//! 工具函数模块
//!
//! 十六进制版本号解析与 URL 拆分

use crate::error::{RequesterError, Result};

/// 解析 `"0x0303"` 形式的 TLS 版本号
/// 对应 Go 版本的 parseHex：解析失败时返回 0
pub fn parse_hex(s: &str) -> u16 {
    let s = s.trim().trim_start_matches("0x").trim_start_matches("0X");
    u16::from_str_radix(s, 16).unwrap_or(0)
}

/// 拆分后的 URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedUrl {
    pub scheme: String,
    pub host: String,
    pub port: Option<u16>,
    pub path: String,
}

impl ParsedUrl {
    /// 端口：显式端口优先，否则按 scheme 取默认值
    pub fn port_or_default(&self) -> u16 {
        match self.port {
            Some(p) => p,
            None => {
                if self.scheme == "https" {
                    443
                } else {
                    80
                }
            }
        }
    }

    /// `host:port`，IPv6 地址加方括号
    pub fn host_port(&self) -> String {
        join_host_port(&self.host, self.port_or_default())
    }
}

/// 拆分 URL 为 scheme/host/port/path
///
/// 不依赖 url crate，按请求器需要的最小语法解析；
/// 支持 IPv6 方括号主机，缺少闭括号视为错误
pub fn parse_url(url: &str) -> Result<ParsedUrl> {
    let url = url.trim();

    let (scheme, rest) = url
        .split_once("://")
        .ok_or_else(|| RequesterError::Input(format!("invalid url {:?}: missing scheme", url)))?;
    if scheme.is_empty() {
        return Err(RequesterError::Input(format!("invalid url {:?}: empty scheme", url)));
    }

    // host[:port] 与 path 的分界
    let (host_port, path) = match rest.find(['/', '?']) {
        Some(i) if rest.as_bytes()[i] == b'/' => (&rest[..i], rest[i..].to_string()),
        Some(i) => (&rest[..i], format!("/{}", &rest[i..])),
        None => (rest, "/".to_string()),
    };

    let (host, port_str) = if let Some(stripped) = host_port.strip_prefix('[') {
        // IPv6 字面量
        let close = stripped.find(']').ok_or_else(|| {
            RequesterError::Input(format!("invalid url {:?}: unclosed '[' in host", url))
        })?;
        let host = &stripped[..close];
        let after = &stripped[close + 1..];
        if after.is_empty() {
            (host, None)
        } else if let Some(p) = after.strip_prefix(':') {
            (host, Some(p))
        } else {
            return Err(RequesterError::Input(format!(
                "invalid url {:?}: unexpected {:?} after ipv6 host",
                url, after
            )));
        }
    } else {
        match host_port.rsplit_once(':') {
            Some((h, p)) => {
                if h.contains(':') {
                    return Err(RequesterError::Input(format!(
                        "invalid url {:?}: unbracketed ipv6 host",
                        url
                    )));
                }
                (h, Some(p))
            }
            None => (host_port, None),
        }
    };

    if host.is_empty() {
        return Err(RequesterError::Input(format!("invalid url {:?}: empty host", url)));
    }

    let port = match port_str {
        Some(p) => Some(p.parse::<u16>().map_err(|_| {
            RequesterError::Input(format!("invalid url {:?}: invalid port {:?}", url, p))
        })?),
        None => None,
    };

    Ok(ParsedUrl {
        scheme: scheme.to_string(),
        host: host.to_string(),
        port,
        path,
    })
}

/// `host:port`；IPv6 地址加方括号，对应 Go 版本的 net.JoinHostPort
pub fn join_host_port(host: &str, port: u16) -> String {
    if host.contains(':') {
        format!("[{}]:{}", host, port)
    } else {
        format!("{}:{}", host, port)
    }
}
