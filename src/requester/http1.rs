//! HTTP/1.1 实现
//!
//! 请求序列化（调用方提供的 header 原样写出）与响应解析。
//! 响应头用 httparse 解析，body 按 Content-Length / chunked / 读到 EOF
//! 三种分帧方式以流的形式暴露，chunked 在转发前解除分块。

use crate::config::Request;
use crate::error::{RequesterError, Result};
use std::io::{self, Read, Write};

/// 解析后的响应头
#[derive(Debug, Clone)]
pub struct ResponseHead {
    /// HTTP/1.x 的小版本号
    pub version_minor: u8,
    pub status: u16,
    /// 原因短语，按接收原样
    pub reason: String,
    /// header 按接收顺序保留，重复的键重复出现
    pub headers: Vec<(String, String)>,
}

impl ResponseHead {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// body 分帧方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyFraming {
    Length(u64),
    Chunked,
    UntilEof,
}

/// 序列化并写出一个 HTTP/1.1 请求
///
/// 调用方的 header 原样写出；Host、Content-Length 和 Connection: close
/// 只在调用方没给的时候补上
pub fn write_request<W: Write>(w: &mut W, req: &Request, host_header: &str, path: &str) -> Result<()> {
    let method = if req.method.is_empty() { "GET" } else { &req.method };
    let mut out = format!("{} {} HTTP/1.1\r\n", method, path);

    let has = |name: &str| req.headers.keys().any(|k| k.eq_ignore_ascii_case(name));
    if !has("host") {
        out.push_str(&format!("Host: {}\r\n", host_header));
    }
    for (key, value) in &req.headers {
        out.push_str(&format!("{}: {}\r\n", key, value));
    }
    if !req.body.is_empty() && !has("content-length") {
        out.push_str(&format!("Content-Length: {}\r\n", req.body.len()));
    }
    if !has("connection") {
        out.push_str("Connection: close\r\n");
    }
    out.push_str("\r\n");

    w.write_all(out.as_bytes())?;
    w.write_all(req.body.as_bytes())?;
    w.flush()?;
    Ok(())
}

/// 读取并解析一个响应头，返回（响应头，读超出的 body 字节）
pub fn read_response_head<R: Read>(r: &mut R) -> Result<(ResponseHead, Vec<u8>)> {
    const MAX_HEAD: usize = 1024 * 1024;

    let mut buf: Vec<u8> = Vec::with_capacity(8192);
    loop {
        let mut header_storage = [httparse::EMPTY_HEADER; 128];
        let mut response = httparse::Response::new(&mut header_storage);
        match response.parse(&buf) {
            Ok(httparse::Status::Complete(head_len)) => {
                let head = ResponseHead {
                    version_minor: response.version.unwrap_or(1),
                    status: response
                        .code
                        .ok_or_else(|| RequesterError::Network("response missing status code".to_string()))?,
                    reason: response.reason.unwrap_or("").to_string(),
                    headers: response
                        .headers
                        .iter()
                        .map(|h| {
                            (
                                h.name.to_string(),
                                String::from_utf8_lossy(h.value).to_string(),
                            )
                        })
                        .collect(),
                };
                return Ok((head, buf[head_len..].to_vec()));
            }
            Ok(httparse::Status::Partial) => {}
            Err(e) => {
                return Err(RequesterError::Network(format!("invalid http response: {}", e)));
            }
        }

        if buf.len() > MAX_HEAD {
            return Err(RequesterError::Network("http response head too large".to_string()));
        }
        let mut chunk = [0u8; 8192];
        let n = r.read(&mut chunk)?;
        if n == 0 {
            return Err(RequesterError::Network(
                "connection closed before response headers".to_string(),
            ));
        }
        buf.extend_from_slice(&chunk[..n]);
    }
}

/// 由响应头决定 body 分帧
pub fn body_framing(head: &ResponseHead, head_request: bool) -> Result<BodyFraming> {
    if head_request || head.status == 204 || head.status == 304 || (100..200).contains(&head.status) {
        return Ok(BodyFraming::Length(0));
    }
    if let Some(te) = head.header("transfer-encoding") {
        if te.to_ascii_lowercase().contains("chunked") {
            return Ok(BodyFraming::Chunked);
        }
    }
    if let Some(cl) = head.header("content-length") {
        let length = cl
            .trim()
            .parse::<u64>()
            .map_err(|_| RequesterError::Network(format!("invalid content-length {:?}", cl)))?;
        return Ok(BodyFraming::Length(length));
    }
    Ok(BodyFraming::UntilEof)
}

/// chunked 解码状态
#[derive(Debug)]
enum ChunkState {
    Size,
    Data { remaining: u64 },
    DataCrlf,
    Trailers,
    Done,
}

/// 流式 body 读取器：先吃解析响应头时多读的字节，再读底层流
pub struct BodyReader<'a, S: Read> {
    stream: &'a mut S,
    leftover: Vec<u8>,
    leftover_pos: usize,
    framing: BodyFraming,
    remaining: u64,
    chunk_state: ChunkState,
}

impl<'a, S: Read> BodyReader<'a, S> {
    pub fn new(stream: &'a mut S, leftover: Vec<u8>, framing: BodyFraming) -> Self {
        let remaining = match framing {
            BodyFraming::Length(n) => n,
            _ => 0,
        };
        Self {
            stream,
            leftover,
            leftover_pos: 0,
            framing,
            remaining,
            chunk_state: ChunkState::Size,
        }
    }

    fn read_source(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.leftover_pos < self.leftover.len() {
            let n = buf.len().min(self.leftover.len() - self.leftover_pos);
            buf[..n].copy_from_slice(&self.leftover[self.leftover_pos..self.leftover_pos + n]);
            self.leftover_pos += n;
            return Ok(n);
        }
        self.stream.read(buf)
    }

    fn read_source_byte(&mut self) -> io::Result<Option<u8>> {
        let mut byte = [0u8; 1];
        match self.read_source(&mut byte)? {
            0 => Ok(None),
            _ => Ok(Some(byte[0])),
        }
    }

    /// 读一行（到 \n 为止），去掉行尾 CRLF
    fn read_line(&mut self) -> io::Result<String> {
        let mut line = Vec::with_capacity(16);
        loop {
            match self.read_source_byte()? {
                Some(b'\n') => break,
                Some(b) => line.push(b),
                None => {
                    return Err(io::Error::new(
                        io::ErrorKind::UnexpectedEof,
                        "eof inside chunked body",
                    ))
                }
            }
            if line.len() > 4096 {
                return Err(io::Error::new(io::ErrorKind::InvalidData, "chunk line too long"));
            }
        }
        if line.last() == Some(&b'\r') {
            line.pop();
        }
        Ok(String::from_utf8_lossy(&line).to_string())
    }

    fn read_chunked(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        loop {
            match self.chunk_state {
                ChunkState::Size => {
                    let line = self.read_line()?;
                    let size_str = line.split(';').next().unwrap_or("").trim();
                    if size_str.is_empty() {
                        continue;
                    }
                    let size = u64::from_str_radix(size_str, 16).map_err(|_| {
                        io::Error::new(
                            io::ErrorKind::InvalidData,
                            format!("invalid chunk size {:?}", size_str),
                        )
                    })?;
                    self.chunk_state = if size == 0 {
                        ChunkState::Trailers
                    } else {
                        ChunkState::Data { remaining: size }
                    };
                }
                ChunkState::Data { remaining } => {
                    let want = buf.len().min(remaining.min(usize::MAX as u64) as usize);
                    let n = self.read_source(&mut buf[..want])?;
                    if n == 0 {
                        return Err(io::Error::new(
                            io::ErrorKind::UnexpectedEof,
                            "eof inside chunk data",
                        ));
                    }
                    let left = remaining - n as u64;
                    self.chunk_state = if left == 0 {
                        ChunkState::DataCrlf
                    } else {
                        ChunkState::Data { remaining: left }
                    };
                    return Ok(n);
                }
                ChunkState::DataCrlf => {
                    self.read_line()?;
                    self.chunk_state = ChunkState::Size;
                }
                ChunkState::Trailers => {
                    let line = self.read_line()?;
                    if line.is_empty() {
                        self.chunk_state = ChunkState::Done;
                    }
                }
                ChunkState::Done => return Ok(0),
            }
        }
    }
}

impl<S: Read> Read for BodyReader<'_, S> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        match self.framing {
            BodyFraming::Length(_) => {
                if self.remaining == 0 {
                    return Ok(0);
                }
                let want = buf.len().min(self.remaining.min(usize::MAX as u64) as usize);
                let n = self.read_source(&mut buf[..want])?;
                if n == 0 {
                    return Err(io::Error::new(
                        io::ErrorKind::UnexpectedEof,
                        "connection closed before full body",
                    ));
                }
                self.remaining -= n as u64;
                Ok(n)
            }
            BodyFraming::UntilEof => self.read_source(buf),
            BodyFraming::Chunked => self.read_chunked(buf),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Cursor;

    #[test]
    fn test_write_request_verbatim_headers() {
        let mut headers = HashMap::new();
        headers.insert("X-Custom".to_string(), "Value".to_string());
        headers.insert("User-Agent".to_string(), "agent/1.0".to_string());
        let req = Request {
            method: "POST".to_string(),
            url: "http://example.com/api".to_string(),
            headers,
            body: "hello".to_string(),
            ..Default::default()
        };

        let mut out = Vec::new();
        write_request(&mut out, &req, "example.com", "/api").unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.starts_with("POST /api HTTP/1.1\r\n"));
        assert!(text.contains("Host: example.com\r\n"));
        assert!(text.contains("X-Custom: Value\r\n"));
        assert!(text.contains("User-Agent: agent/1.0\r\n"));
        assert!(text.contains("Content-Length: 5\r\n"));
        assert!(text.contains("Connection: close\r\n"));
        assert!(text.ends_with("\r\n\r\nhello"));
    }

    #[test]
    fn test_write_request_defaults_to_get() {
        let req = Request::default();
        let mut out = Vec::new();
        write_request(&mut out, &req, "example.com", "/").unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("GET / HTTP/1.1\r\n"));
        assert!(!text.contains("Content-Length"));
    }

    #[test]
    fn test_read_response_head() {
        let raw = b"HTTP/1.1 200 OK\r\nContent-Type: text/html\r\nSet-Cookie: a=1\r\nSet-Cookie: b=2\r\n\r\nbody-bytes";
        let mut cursor = Cursor::new(raw.to_vec());
        let (head, leftover) = read_response_head(&mut cursor).unwrap();

        assert_eq!(head.status, 200);
        assert_eq!(head.reason, "OK");
        assert_eq!(head.version_minor, 1);
        assert_eq!(head.headers.len(), 3);
        // 重复 header 原序保留
        assert_eq!(head.headers[1], ("Set-Cookie".to_string(), "a=1".to_string()));
        assert_eq!(head.headers[2], ("Set-Cookie".to_string(), "b=2".to_string()));
        assert_eq!(leftover, b"body-bytes");
    }

    #[test]
    fn test_body_framing_rules() {
        let mut head = ResponseHead {
            version_minor: 1,
            status: 200,
            reason: "OK".to_string(),
            headers: vec![("Content-Length".to_string(), "12".to_string())],
        };
        assert_eq!(body_framing(&head, false).unwrap(), BodyFraming::Length(12));
        assert_eq!(body_framing(&head, true).unwrap(), BodyFraming::Length(0));

        head.headers = vec![("Transfer-Encoding".to_string(), "chunked".to_string())];
        assert_eq!(body_framing(&head, false).unwrap(), BodyFraming::Chunked);

        head.headers = vec![];
        assert_eq!(body_framing(&head, false).unwrap(), BodyFraming::UntilEof);

        head.status = 204;
        assert_eq!(body_framing(&head, false).unwrap(), BodyFraming::Length(0));
    }

    #[test]
    fn test_body_reader_content_length_with_leftover() {
        let mut stream = Cursor::new(b"world".to_vec());
        let mut reader = BodyReader::new(&mut stream, b"hello ".to_vec(), BodyFraming::Length(11));
        let mut out = Vec::new();
        reader.read_to_end(&mut out).unwrap();
        assert_eq!(out, b"hello world");
    }

    #[test]
    fn test_body_reader_chunked() {
        let raw = b"5\r\nhello\r\n7\r\n, world\r\n0\r\n\r\n";
        let mut stream = Cursor::new(raw.to_vec());
        let mut reader = BodyReader::new(&mut stream, Vec::new(), BodyFraming::Chunked);
        let mut out = Vec::new();
        reader.read_to_end(&mut out).unwrap();
        assert_eq!(out, b"hello, world");
    }

    #[test]
    fn test_body_reader_chunked_with_extension_and_trailer() {
        let raw = b"6;ext=1\r\nstream\r\n0\r\nTrailer: x\r\n\r\n";
        let mut stream = Cursor::new(raw.to_vec());
        let mut reader = BodyReader::new(&mut stream, Vec::new(), BodyFraming::Chunked);
        let mut out = Vec::new();
        reader.read_to_end(&mut out).unwrap();
        assert_eq!(out, b"stream");
    }

    #[test]
    fn test_body_reader_truncated_length_errors() {
        let mut stream = Cursor::new(b"abc".to_vec());
        let mut reader = BodyReader::new(&mut stream, Vec::new(), BodyFraming::Length(10));
        let mut out = Vec::new();
        let err = reader.read_to_end(&mut out).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }
}
