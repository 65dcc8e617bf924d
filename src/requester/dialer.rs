//! 拨号器
//!
//! 解析目标主机并建立 TCP 连接。配置了自定义 DNS 服务器时按声明顺序
//! 逐个用 UDP 查询（hickory-resolver），全部失败回落到系统解析器；
//! 连接超时作用于每一次拨号（直连或代理）。

use crate::config::{Config, DnsConfig};
use crate::error::{RequesterError, Result};
use crate::requester::proxy;
use hickory_resolver::config::{NameServerConfig, Protocol, ResolverConfig, ResolverOpts};
use hickory_resolver::Resolver;
use std::net::{IpAddr, SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;

/// 解析 `host` 为 socket 地址列表
pub fn resolve(
    host: &str,
    port: u16,
    dns: Option<&DnsConfig>,
    timeout: Duration,
) -> Result<Vec<SocketAddr>> {
    // IP 字面量不查询
    if let Ok(ip) = host.parse::<IpAddr>() {
        return Ok(vec![SocketAddr::new(ip, port)]);
    }

    if let Some(dns) = dns {
        for server in &dns.servers {
            let server_addr: SocketAddr = match server.parse() {
                Ok(addr) => addr,
                Err(_) => {
                    eprintln!("warning: skipping unparseable dns server {:?}", server);
                    continue;
                }
            };

            let mut resolver_config = ResolverConfig::new();
            resolver_config.add_name_server(NameServerConfig::new(server_addr, Protocol::Udp));
            let mut opts = ResolverOpts::default();
            opts.timeout = timeout;
            opts.attempts = 1;

            let resolver = match Resolver::new(resolver_config, opts) {
                Ok(resolver) => resolver,
                Err(_) => continue,
            };
            match resolver.lookup_ip(host) {
                Ok(lookup) => {
                    let addrs: Vec<SocketAddr> =
                        lookup.iter().map(|ip| SocketAddr::new(ip, port)).collect();
                    if !addrs.is_empty() {
                        return Ok(addrs);
                    }
                }
                Err(_) => continue,
            }
        }
        // 配置的服务器全部失败，回落系统解析器
    }

    let addrs: Vec<SocketAddr> = (host, port)
        .to_socket_addrs()
        .map_err(|e| RequesterError::network(format!("dns lookup for {} failed: {}", host, e)))?
        .collect();
    if addrs.is_empty() {
        return Err(RequesterError::Network(format!("dns lookup for {} returned no addresses", host)));
    }
    Ok(addrs)
}

/// 按连接超时逐个地址尝试 TCP 连接
pub fn dial_tcp(addrs: &[SocketAddr], timeout: Duration) -> Result<TcpStream> {
    let mut last_err: Option<std::io::Error> = None;
    for addr in addrs {
        match TcpStream::connect_timeout(addr, timeout) {
            Ok(stream) => {
                stream.set_nodelay(true).ok();
                return Ok(stream);
            }
            Err(e) => last_err = Some(e),
        }
    }
    match last_err {
        Some(e) => Err(RequesterError::from(e)),
        None => Err(RequesterError::Network("no addresses to dial".to_string())),
    }
}

/// 解析并拨号一个 `host:port`
pub fn dial_addr(host: &str, port: u16, dns: Option<&DnsConfig>, timeout: Duration) -> Result<TcpStream> {
    let addrs = resolve(host, port, dns, timeout)?;
    dial_tcp(&addrs, timeout)
}

/// 建立到目标的连接；启用代理时先穿过 SOCKS5 / HTTP CONNECT 隧道
pub fn dial_with_proxy(cfg: &Config, target_host: &str, target_port: u16) -> Result<TcpStream> {
    let timeout = Duration::from_secs(cfg.timeout.connect);
    if cfg.proxy.enabled {
        proxy::connect_through_proxy(&cfg.proxy, target_host, target_port, cfg.dns.as_ref(), timeout)
    } else {
        dial_addr(target_host, target_port, cfg.dns.as_ref(), timeout)
    }
}
