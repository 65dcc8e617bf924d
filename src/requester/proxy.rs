//! 代理支持
//!
//! 支持 HTTP CONNECT 与 SOCKS5 隧道。隧道建立后返回的 socket
//! 对调用方而言就指向源服务器；不尝试任何代理认证。

use crate::config::{DnsConfig, ProxyConfig};
use crate::error::{RequesterError, Result};
use crate::requester::dialer;
use crate::utils::parse_url;
use std::io::{Read, Write};
use std::net::TcpStream;
use std::time::Duration;

/// 通过代理连接到目标
pub fn connect_through_proxy(
    proxy: &ProxyConfig,
    target_host: &str,
    target_port: u16,
    dns: Option<&DnsConfig>,
    timeout: Duration,
) -> Result<TcpStream> {
    let proxy_url = parse_url(&proxy.url)
        .map_err(|e| RequesterError::Config(format!("invalid proxy url: {}", e)))?;
    let proxy_port = match proxy_url.port {
        Some(port) => port,
        None if proxy_url.scheme.starts_with("socks") => 1080,
        None => proxy_url.port_or_default(),
    };

    let stream = dialer::dial_addr(&proxy_url.host, proxy_port, dns, timeout)?;

    match proxy.proxy_type.as_str() {
        "socks5" => connect_socks5(stream, target_host, target_port),
        _ => connect_http(stream, target_host, target_port),
    }
}

/// HTTP CONNECT 隧道；非 200 响应为致命错误，原因短语原样带出
fn connect_http(mut stream: TcpStream, target_host: &str, target_port: u16) -> Result<TcpStream> {
    let target = crate::utils::join_host_port(target_host, target_port);
    let connect_request = format!(
        "CONNECT {} HTTP/1.1\r\nHost: {}\r\n\r\n",
        target, target
    );
    stream.write_all(connect_request.as_bytes())?;
    stream.flush()?;

    // 读完响应头（到空行为止）
    let mut buf = Vec::with_capacity(512);
    let mut byte = [0u8; 1];
    while !buf.ends_with(b"\r\n\r\n") {
        if buf.len() > 8192 {
            return Err(RequesterError::Network("proxy connect response too large".to_string()));
        }
        let n = stream.read(&mut byte)?;
        if n == 0 {
            return Err(RequesterError::Network(
                "proxy closed connection during connect".to_string(),
            ));
        }
        buf.push(byte[0]);
    }

    let head = String::from_utf8_lossy(&buf);
    let status_line = head.lines().next().unwrap_or("");
    // "HTTP/1.1 200 Connection established"
    let mut parts = status_line.splitn(3, ' ');
    let _proto = parts.next().unwrap_or("");
    let code = parts.next().unwrap_or("");
    let reason = parts.next().unwrap_or("");
    if code != "200" {
        return Err(RequesterError::Network(format!(
            "proxy connect failed: {} {}",
            code, reason
        )));
    }

    Ok(stream)
}

/// SOCKS5 隧道（RFC 1928，无认证，域名地址类型）
fn connect_socks5(mut stream: TcpStream, target_host: &str, target_port: u16) -> Result<TcpStream> {
    // 1. 问候：版本 5，1 个方法（无认证）
    stream.write_all(&[0x05, 0x01, 0x00])?;

    // 2. 服务器选择的方法
    let mut response = [0u8; 2];
    stream.read_exact(&mut response)?;
    if response[0] != 0x05 {
        return Err(RequesterError::Network("invalid socks5 version".to_string()));
    }
    if response[1] != 0x00 {
        return Err(RequesterError::Network(format!(
            "socks5 proxy requires unsupported auth method: {}",
            response[1]
        )));
    }

    // 3. 连接请求：CONNECT，域名类型
    if target_host.len() > 255 {
        return Err(RequesterError::Network("socks5 target host too long".to_string()));
    }
    let mut connect_request = vec![
        0x05, // 版本
        0x01, // CONNECT
        0x00, // 保留
        0x03, // 域名类型
    ];
    connect_request.push(target_host.len() as u8);
    connect_request.extend_from_slice(target_host.as_bytes());
    connect_request.extend_from_slice(&target_port.to_be_bytes());
    stream.write_all(&connect_request)?;

    // 4. 连接响应
    let mut reply = [0u8; 4];
    stream.read_exact(&mut reply)?;
    if reply[1] != 0x00 {
        return Err(RequesterError::Network(format!(
            "socks5 connect failed, reply code {}",
            reply[1]
        )));
    }

    // 5. 消费绑定地址
    match reply[3] {
        0x01 => {
            let mut addr = [0u8; 6];
            stream.read_exact(&mut addr)?;
        }
        0x03 => {
            let mut len = [0u8; 1];
            stream.read_exact(&mut len)?;
            let mut addr = vec![0u8; len[0] as usize + 2];
            stream.read_exact(&mut addr)?;
        }
        0x04 => {
            let mut addr = [0u8; 18];
            stream.read_exact(&mut addr)?;
        }
        other => {
            return Err(RequesterError::Network(format!(
                "socks5 unsupported address type: {}",
                other
            )));
        }
    }

    Ok(stream)
}
