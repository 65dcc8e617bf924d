//! HTTP/2 实现
//!
//! 用 h2 在已完成 TLS 握手的 socket 上跑一次 HTTP/2 交换，
//! 绕过 h2 自己的 ALPN/TLS 建立（socket 视为已升级）。
//! 同步的 TLS 流经一对读写线程桥接成 tokio I/O，只发一个请求，
//! 完成即关闭。

use crate::config::Request;
use crate::error::{RequesterError, Result};
use crate::requester::response;
use bytes::Bytes;
use std::io::{self, Read, Write};
use std::net::TcpStream;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};
use std::thread;
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio::runtime::Runtime;
use tokio::sync::mpsc;

/// 请求里不随 HTTP/2 转发的逐跳 header
const HOP_BY_HOP: [&str; 6] = [
    "host",
    "connection",
    "keep-alive",
    "proxy-connection",
    "transfer-encoding",
    "upgrade",
];

/// 在已握手的流上执行一次 HTTP/2 请求并把响应转发到 `out`
///
/// `deadline_ctl` 是底层 TCP 的另一个句柄，响应头到达后用它清除读超时
pub fn exchange<W: Write>(
    read_half: Box<dyn Read + Send>,
    write_half: Box<dyn Write + Send>,
    deadline_ctl: TcpStream,
    req: &Request,
    out: &mut W,
) -> Result<()> {
    let rt = Runtime::new()
        .map_err(|e| RequesterError::Network(format!("failed to create runtime: {}", e)))?;
    rt.block_on(exchange_async(read_half, write_half, deadline_ctl, req, out))
}

fn h2_err(err: h2::Error) -> RequesterError {
    RequesterError::network(format!("http/2 request failed: {}", err))
}

async fn exchange_async<W: Write>(
    read_half: Box<dyn Read + Send>,
    write_half: Box<dyn Write + Send>,
    deadline_ctl: TcpStream,
    req: &Request,
    out: &mut W,
) -> Result<()> {
    let deadline_cleared = Arc::new(AtomicBool::new(false));
    let io = H2Io::spawn(read_half, write_half, deadline_cleared.clone());

    // HTTP/2 握手（socket 已经是加密流，无 ALPN）
    let (client, connection) = h2::client::handshake(io).await.map_err(h2_err)?;

    // 在后台驱动连接
    tokio::spawn(async move {
        let _ = connection.await;
    });

    let mut client = client.ready().await.map_err(h2_err)?;

    let method = if req.method.is_empty() { "GET" } else { &req.method };
    let mut builder = http::Request::builder()
        .method(method)
        .uri(req.url.as_str())
        .version(http::Version::HTTP_2);
    for (key, value) in &req.headers {
        if HOP_BY_HOP.iter().any(|h| key.eq_ignore_ascii_case(h)) {
            continue;
        }
        builder = builder.header(key.as_str(), value.as_str());
    }
    let request = builder
        .body(())
        .map_err(|e| RequesterError::Input(format!("invalid request: {}", e)))?;

    let (response_future, mut send_stream) = client
        .send_request(request, req.body.is_empty())
        .map_err(h2_err)?;
    if !req.body.is_empty() {
        send_stream
            .send_data(Bytes::copy_from_slice(req.body.as_bytes()), true)
            .map_err(h2_err)?;
    }

    let response = response_future.await.map_err(h2_err)?;
    let (parts, mut body) = response.into_parts();

    // 转发端把 HTTP/2 状态归一成 HTTP/1 风格的状态行
    let reason = parts.status.canonical_reason().unwrap_or("");
    let status_line = if reason.is_empty() {
        format!("HTTP/2.0 {}\r\n", parts.status.as_u16())
    } else {
        format!("HTTP/2.0 {} {}\r\n", parts.status.as_u16(), reason)
    };
    let headers: Vec<(String, String)> = parts
        .headers
        .iter()
        .map(|(name, value)| {
            (
                canonical_header_name(name.as_str()),
                String::from_utf8_lossy(value.as_bytes()).to_string(),
            )
        })
        .collect();
    response::write_head(out, &status_line, headers.iter().map(|(k, v)| (k.as_str(), v.as_str())))?;

    // 响应头已到，流式 body 不再受读超时约束
    deadline_ctl.set_read_timeout(None).ok();
    deadline_cleared.store(true, Ordering::SeqCst);

    while let Some(chunk) = body.data().await {
        let chunk = chunk.map_err(h2_err)?;
        out.write_all(&chunk)?;
        out.flush()?;
        let _ = body.flow_control().release_capacity(chunk.len());
    }

    Ok(())
}

/// `Name-Segment` 风格的 header 名（h2 线上全小写，输出对齐 HTTP/1 习惯）
fn canonical_header_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut upper_next = true;
    for c in name.chars() {
        if upper_next {
            out.extend(c.to_uppercase());
        } else {
            out.push(c);
        }
        upper_next = c == '-';
    }
    out
}

/// 把阻塞的读写两半桥接成 tokio I/O
///
/// 读线程阻塞读 TLS 流并往通道里送字节；写线程从通道取字节写回。
/// 读超时被清除后，读线程把超时错误当作重试信号。
struct H2Io {
    rx: mpsc::Receiver<io::Result<Vec<u8>>>,
    rx_buf: Vec<u8>,
    rx_pos: usize,
    tx: mpsc::UnboundedSender<Vec<u8>>,
}

impl H2Io {
    fn spawn(
        mut read_half: Box<dyn Read + Send>,
        mut write_half: Box<dyn Write + Send>,
        deadline_cleared: Arc<AtomicBool>,
    ) -> Self {
        let (data_tx, data_rx) = mpsc::channel::<io::Result<Vec<u8>>>(32);
        thread::spawn(move || {
            let mut buf = vec![0u8; 16384];
            loop {
                match read_half.read(&mut buf) {
                    Ok(0) => break,
                    Ok(n) => {
                        if data_tx.blocking_send(Ok(buf[..n].to_vec())).is_err() {
                            break;
                        }
                    }
                    Err(e)
                        if matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut)
                            && deadline_cleared.load(Ordering::SeqCst) =>
                    {
                        // 清超时前已阻塞的读带着旧期限返回，重试即可
                        continue;
                    }
                    Err(e) => {
                        let _ = data_tx.blocking_send(Err(e));
                        break;
                    }
                }
            }
        });

        let (write_tx, mut write_rx) = mpsc::unbounded_channel::<Vec<u8>>();
        thread::spawn(move || {
            while let Some(chunk) = write_rx.blocking_recv() {
                if write_half.write_all(&chunk).is_err() || write_half.flush().is_err() {
                    break;
                }
            }
        });

        Self {
            rx: data_rx,
            rx_buf: Vec::new(),
            rx_pos: 0,
            tx: write_tx,
        }
    }
}

impl AsyncRead for H2Io {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        loop {
            if this.rx_pos < this.rx_buf.len() {
                let n = buf.remaining().min(this.rx_buf.len() - this.rx_pos);
                buf.put_slice(&this.rx_buf[this.rx_pos..this.rx_pos + n]);
                this.rx_pos += n;
                return Poll::Ready(Ok(()));
            }
            match this.rx.poll_recv(cx) {
                Poll::Ready(Some(Ok(data))) => {
                    this.rx_buf = data;
                    this.rx_pos = 0;
                }
                Poll::Ready(Some(Err(e))) => return Poll::Ready(Err(e)),
                Poll::Ready(None) => return Poll::Ready(Ok(())),
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}

impl AsyncWrite for H2Io {
    fn poll_write(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        match self.get_mut().tx.send(buf.to_vec()) {
            Ok(()) => Poll::Ready(Ok(buf.len())),
            Err(_) => Poll::Ready(Err(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "write side closed",
            ))),
        }
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}
