//! 命令行入口
//!
//! 无位置参数：从 stdin 读一个 JSON Request（模式 A）。
//! 有位置参数：curl 风格的参数（模式 B）。
//! stdout 输出原样响应；出错时 stderr 输出一行 JSON 并按错误类别退出。

use std::collections::HashMap;
use std::io::Read;
use std::process;

use tls_requester::{
    load_config, make_request, Config, ProxyConfig, Request, RequesterError,
};

fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();

    let result = if args.is_empty() {
        run_stdin_mode()
    } else {
        run_cli_mode(&args)
    };

    if let Err(err) = result {
        let payload = serde_json::json!({
            "success": false,
            "error": err.to_string(),
            "error_type": err.error_type(),
        });
        eprintln!("{}", payload);
        process::exit(err.exit_code());
    }
}

/// 模式 A：stdin 上的 JSON 请求
fn run_stdin_mode() -> Result<(), RequesterError> {
    let mut input = String::new();
    std::io::stdin()
        .read_to_string(&mut input)
        .map_err(|e| RequesterError::Input(format!("failed to read stdin: {}", e)))?;

    let req: Request = serde_json::from_str(&input)
        .map_err(|e| RequesterError::Input(format!("failed to parse request: {}", e)))?;

    let config_path = if req.config_path.is_empty() {
        "config.json"
    } else {
        &req.config_path
    };
    let mut cfg = load_config(config_path)?;
    cfg.apply_request_overrides(&req);

    run(&req, &cfg)
}

/// 模式 B：curl 风格参数
fn run_cli_mode(args: &[String]) -> Result<(), RequesterError> {
    let mut method = "GET".to_string();
    let mut headers: HashMap<String, String> = HashMap::new();
    let mut body = String::new();
    let mut config_path = "config.json".to_string();
    let mut proxy: Option<ProxyConfig> = None;
    let mut url: Option<String> = None;

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "-X" => method = required_value(&mut iter, "-X")?,
            "-H" => parse_headers_arg(&required_value(&mut iter, "-H")?, &mut headers)?,
            "-d" => body = required_value(&mut iter, "-d")?,
            "-c" => config_path = required_value(&mut iter, "-c")?,
            "-x" => {
                let proxy_url = required_value(&mut iter, "-x")?;
                let proxy_type = if proxy_url.starts_with("socks") {
                    "socks5"
                } else {
                    "http"
                };
                proxy = Some(ProxyConfig {
                    enabled: true,
                    proxy_type: proxy_type.to_string(),
                    url: proxy_url,
                });
            }
            "-v" => {
                println!("tls-requester {}", env!("CARGO_PKG_VERSION"));
                process::exit(0);
            }
            flag if flag.starts_with('-') => {
                return Err(RequesterError::Input(format!("unknown flag: {}", flag)));
            }
            positional => url = Some(positional.to_string()),
        }
    }

    let url = url.ok_or_else(|| RequesterError::Input("missing target url".to_string()))?;

    let req = Request {
        method,
        url,
        headers,
        body,
        config_path: config_path.clone(),
        timeout: None,
        proxy,
        dns: None,
    };

    let mut cfg = load_config(&config_path)?;
    cfg.apply_request_overrides(&req);

    run(&req, &cfg)
}

fn required_value(iter: &mut std::slice::Iter<'_, String>, flag: &str) -> Result<String, RequesterError> {
    iter.next()
        .cloned()
        .ok_or_else(|| RequesterError::Input(format!("flag {} requires a value", flag)))
}

/// `-H` 接受 JSON 对象或单条 `Name: Value`
fn parse_headers_arg(arg: &str, headers: &mut HashMap<String, String>) -> Result<(), RequesterError> {
    let trimmed = arg.trim();
    if trimmed.starts_with('{') {
        let parsed: HashMap<String, String> = serde_json::from_str(trimmed)
            .map_err(|e| RequesterError::Input(format!("invalid headers json: {}", e)))?;
        headers.extend(parsed);
        return Ok(());
    }
    match trimmed.split_once(':') {
        Some((name, value)) => {
            headers.insert(name.trim().to_string(), value.trim().to_string());
            Ok(())
        }
        None => Err(RequesterError::Input(format!(
            "invalid header {:?}: expected JSON object or \"Name: Value\"",
            arg
        ))),
    }
}

fn run(req: &Request, cfg: &Config) -> Result<(), RequesterError> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    make_request(req, cfg, &mut out)
}
