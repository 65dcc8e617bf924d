//! 流式转发器
//!
//! 把响应按原样写到输出：状态行、CRLF 分隔的 header、空行、body 字节。
//! body 按 8 KiB 一块边读边写边刷新，不整体缓冲；读到 EOF 正常结束。
//! body 已在 HTTP 层解除分块，Transfer-Encoding 头不再转发。

use crate::error::{RequesterError, Result};
use crate::requester::http1::ResponseHead;
use std::io::{Read, Write};

/// body 读块大小
pub const CHUNK_SIZE: usize = 8192;

/// 转发一个 HTTP/1.x 响应
pub fn forward_response<W: Write, R: Read>(
    out: &mut W,
    head: &ResponseHead,
    body: &mut R,
) -> Result<()> {
    let status_line = format!("HTTP/1.{} {} {}\r\n", head.version_minor, head.status, head.reason);
    write_head(out, &status_line, head.headers.iter().map(|(k, v)| (k.as_str(), v.as_str())))?;
    stream_body(out, body)
}

/// 写状态行与 header，空行后立即刷新，让调用方先看到响应头
pub fn write_head<'a, W: Write>(
    out: &mut W,
    status_line: &str,
    headers: impl Iterator<Item = (&'a str, &'a str)>,
) -> Result<()> {
    out.write_all(status_line.as_bytes())?;
    for (name, value) in headers {
        if name.eq_ignore_ascii_case("transfer-encoding") {
            continue;
        }
        out.write_all(name.as_bytes())?;
        out.write_all(b": ")?;
        out.write_all(value.as_bytes())?;
        out.write_all(b"\r\n")?;
    }
    out.write_all(b"\r\n")?;
    out.flush()?;
    Ok(())
}

/// 8 KiB 一块转发 body，每块写出后刷新再读下一块
pub fn stream_body<W: Write, R: Read>(out: &mut W, body: &mut R) -> Result<()> {
    let mut buf = [0u8; CHUNK_SIZE];
    loop {
        let n = body.read(&mut buf).map_err(RequesterError::from)?;
        if n == 0 {
            break;
        }
        out.write_all(&buf[..n])?;
        out.flush()?;
    }
    Ok(())
}
