//! 请求器
//!
//! 一次请求的顺序控制流：编译指纹 → 解析 URL → 拨号（可经代理）→
//! 武装读超时 → https 则做定制握手 → HTTP/1.1 或 HTTP/2 交换 →
//! 流式转发。socket 在任意时刻只有一个持有者，转发结束即关闭。

pub mod dialer;
pub mod http1;
pub mod http2;
pub mod proxy;
pub mod response;

use crate::config::{Config, Request};
use crate::error::Result;
use crate::fingerprint;
use crate::tls_handshake::{self, TlsStream};
use crate::utils::{join_host_port, parse_url};
use std::io::{self, Read, Write};
use std::net::TcpStream;
use std::time::Duration;

/// 明文或 TLS 包装后的连接
enum Conn {
    Plain(TcpStream),
    Tls(Box<TlsStream>),
}

impl Conn {
    fn clear_read_deadline(&self) -> io::Result<()> {
        match self {
            Conn::Plain(stream) => stream.set_read_timeout(None),
            Conn::Tls(stream) => stream.clear_read_deadline(),
        }
    }

    /// 拆成 HTTP/2 适配层需要的读写两半，外加控制读超时的 TCP 句柄
    fn into_split(self) -> io::Result<(Box<dyn Read + Send>, Box<dyn Write + Send>, TcpStream)> {
        match self {
            Conn::Plain(stream) => {
                let ctl = stream.try_clone()?;
                let read_half = stream.try_clone()?;
                Ok((Box::new(read_half), Box::new(stream), ctl))
            }
            Conn::Tls(stream) => {
                let ctl = stream.tcp_clone()?;
                let (read_half, write_half) = stream.split()?;
                Ok((Box::new(read_half), Box::new(write_half), ctl))
            }
        }
    }
}

impl Read for Conn {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Conn::Plain(stream) => stream.read(buf),
            Conn::Tls(stream) => stream.read(buf),
        }
    }
}

impl Write for Conn {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Conn::Plain(stream) => stream.write(buf),
            Conn::Tls(stream) => stream.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Conn::Plain(stream) => stream.flush(),
            Conn::Tls(stream) => stream.flush(),
        }
    }
}

/// 执行一次请求，响应原样写到 `out`
pub fn make_request<W: Write>(req: &Request, cfg: &Config, out: &mut W) -> Result<()> {
    let spec = fingerprint::build(&cfg.fingerprint, &req.url)?;

    let parsed = parse_url(&req.url)?;
    let port = parsed.port_or_default();
    // Host 头带不带端口与 URL 写法一致
    let host_header = match parsed.port {
        Some(port) => join_host_port(&parsed.host, port),
        None => parsed.host.clone(),
    };

    let stream = dialer::dial_with_proxy(cfg, &parsed.host, port)?;

    // 读超时只武装握手与响应头阶段
    if cfg.timeout.read > 0 {
        stream.set_read_timeout(Some(Duration::from_secs(cfg.timeout.read)))?;
    }

    // https 之外的 scheme 一律不包 TLS
    let conn = if parsed.scheme == "https" {
        Conn::Tls(Box::new(tls_handshake::connect(stream, &spec)?))
    } else {
        Conn::Plain(stream)
    };

    if cfg.fingerprint.http2 {
        let (read_half, write_half, deadline_ctl) = conn.into_split()?;
        http2::exchange(read_half, write_half, deadline_ctl, req, out)
    } else {
        let mut conn = conn;
        http1::write_request(&mut conn, req, &host_header, &parsed.path)?;
        let (head, leftover) = http1::read_response_head(&mut conn)?;

        let head_request = req.method.eq_ignore_ascii_case("HEAD");
        let framing = http1::body_framing(&head, head_request)?;

        // 流式 body 可以任意长，转发前撤掉读期限
        conn.clear_read_deadline().ok();

        let mut body = http1::BodyReader::new(&mut conn, leftover, framing);
        response::forward_response(out, &head, &mut body)
        // conn 在此丢弃，socket 随之关闭
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FingerprintConfig;
    use std::collections::HashMap;
    use std::io::BufRead;
    use std::net::TcpListener;
    use std::thread;

    fn http_config() -> Config {
        Config {
            fingerprint: FingerprintConfig { http2: false, ..Default::default() },
            ..Default::default()
        }
    }

    /// 单连接的 mock HTTP 服务器
    fn spawn_http_server(response: &'static [u8]) -> std::net::SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut reader = io::BufReader::new(stream.try_clone().unwrap());
            let mut line = String::new();
            loop {
                line.clear();
                reader.read_line(&mut line).unwrap();
                if line == "\r\n" || line.is_empty() {
                    break;
                }
            }
            let mut stream = stream;
            stream.write_all(response).unwrap();
        });
        addr
    }

    #[test]
    fn test_plain_http_roundtrip() {
        let addr = spawn_http_server(
            b"HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\nContent-Length: 5\r\n\r\nhello",
        );
        let req = Request {
            method: "GET".to_string(),
            url: format!("http://{}/x", addr),
            headers: HashMap::new(),
            ..Default::default()
        };

        let mut out = Vec::new();
        make_request(&req, &http_config(), &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(text.ends_with("\r\n\r\nhello"));
    }

    #[test]
    fn test_chunked_body_forwarded_dechunked() {
        let addr = spawn_http_server(
            b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n5\r\nhello\r\n6\r\n world\r\n0\r\n\r\n",
        );
        let req = Request {
            url: format!("http://{}/", addr),
            ..Default::default()
        };

        let mut out = Vec::new();
        make_request(&req, &http_config(), &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.ends_with("\r\n\r\nhello world"));
        assert!(!text.contains("Transfer-Encoding"));
    }

    #[test]
    fn test_malformed_url_is_input_error() {
        let req = Request {
            url: "http://[::".to_string(),
            ..Default::default()
        };
        let err = make_request(&req, &http_config(), &mut Vec::new()).unwrap_err();
        assert_eq!(err.exit_code(), 1);
        assert_eq!(err.error_type(), "INPUT_ERROR");
    }
}
