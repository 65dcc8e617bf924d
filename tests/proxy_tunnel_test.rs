//! HTTP CONNECT 代理隧道的端到端测试
//!
//! 本地 mock 代理 + mock 源站：建隧道后请求字节原样到达源站；
//! 代理拒绝时错误类别与原因短语按规定带出。

use std::io::{BufRead, BufReader, Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::thread;
use tls_requester::{make_request, Config, FingerprintConfig, ProxyConfig, Request};

/// 单连接 mock 源站：返回固定响应
fn spawn_origin(response: &'static [u8]) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    thread::spawn(move || {
        let (stream, _) = listener.accept().unwrap();
        let mut reader = BufReader::new(stream.try_clone().unwrap());
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

/// 接受任意目标的单连接 CONNECT 代理，把隧道双向接到 `origin`
fn spawn_connect_proxy(origin: SocketAddr) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    thread::spawn(move || {
        let (client, _) = listener.accept().unwrap();
        let mut reader = BufReader::new(client.try_clone().unwrap());
        let mut line = String::new();
        loop {
            line.clear();
            reader.read_line(&mut line).unwrap();
            if line == "\r\n" || line.is_empty() {
                break;
            }
        }
        let mut client = client;
        client
            .write_all(b"HTTP/1.1 200 Connection established\r\n\r\n")
            .unwrap();

        let upstream = TcpStream::connect(origin).unwrap();
        let mut client_read = client.try_clone().unwrap();
        let mut upstream_write = upstream.try_clone().unwrap();
        let mut upstream_read = upstream;
        let mut client_write = client;
        let t = thread::spawn(move || {
            let _ = std::io::copy(&mut client_read, &mut upstream_write);
        });
        let _ = std::io::copy(&mut upstream_read, &mut client_write);
        let _ = t.join();
    });
    addr
}

/// 只会说 407 的代理
fn spawn_rejecting_proxy() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    thread::spawn(move || {
        let (stream, _) = listener.accept().unwrap();
        let mut reader = BufReader::new(stream.try_clone().unwrap());
        let mut line = String::new();
        loop {
            line.clear();
            reader.read_line(&mut line).unwrap();
            if line == "\r\n" || line.is_empty() {
                break;
            }
        }
        let mut stream = stream;
        stream
            .write_all(b"HTTP/1.1 407 Proxy Authentication Required\r\n\r\n")
            .unwrap();
    });
    addr
}

fn config_with_proxy(proxy: SocketAddr) -> Config {
    Config {
        proxy: ProxyConfig {
            enabled: true,
            proxy_type: "http".to_string(),
            url: format!("http://{}", proxy),
        },
        fingerprint: FingerprintConfig { http2: false, ..Default::default() },
        ..Default::default()
    }
}

#[test]
fn connect_tunnel_carries_request_to_origin() {
    let origin = spawn_origin(b"HTTP/1.1 200 OK\r\nContent-Length: 8\r\n\r\ntunneled");
    let proxy = spawn_connect_proxy(origin);

    let req = Request {
        method: "GET".to_string(),
        url: "http://origin.internal/".to_string(),
        ..Default::default()
    };
    let mut out = Vec::new();
    make_request(&req, &config_with_proxy(proxy), &mut out).unwrap();

    let text = String::from_utf8(out).unwrap();
    assert!(text.starts_with("HTTP/1.1 200 OK\r\n"));
    assert!(text.ends_with("\r\n\r\ntunneled"));
}

#[test]
fn proxy_rejection_surfaces_status_and_reason() {
    let proxy = spawn_rejecting_proxy();

    let req = Request {
        url: "http://origin.internal/".to_string(),
        ..Default::default()
    };
    let err = make_request(&req, &config_with_proxy(proxy), &mut Vec::new()).unwrap_err();

    assert_eq!(err.error_type(), "NETWORK_ERROR");
    assert_eq!(err.exit_code(), 2);
    let msg = err.to_string();
    assert!(msg.contains("407"), "message should carry the status: {}", msg);
    assert!(msg.contains("Proxy Authentication Required"));
}

#[test]
fn raw_socket_read_after_tunnel() {
    // 不经 make_request，验证隧道 socket 的后续写确实到达目标
    let origin = spawn_origin(b"HTTP/1.1 204 No Content\r\n\r\n");
    let proxy = spawn_connect_proxy(origin);

    let cfg = config_with_proxy(proxy);
    let mut stream =
        tls_requester::requester::dialer::dial_with_proxy(&cfg, "origin.internal", 80).unwrap();
    stream.write_all(b"GET / HTTP/1.1\r\nHost: origin.internal\r\n\r\n").unwrap();

    let mut buf = [0u8; 32];
    let n = stream.read(&mut buf).unwrap();
    assert!(std::str::from_utf8(&buf[..n]).unwrap().starts_with("HTTP/1.1 204"));
}
