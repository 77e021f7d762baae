use std::fmt;
use std::time::{Duration, Instant};

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{redirect, Certificate, Method, Proxy};

use crate::builder::AUTH_BASIC;
use crate::{
    DiagnosticLog, ErrorCode, GatewayError, OptionSet, OptionValue, ResponseInfo, Result,
    TransportOption,
};

const DEFAULT_MAX_REDIRECTS: usize = 10;

/// Body and metadata of one completed exchange.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RawResponse {
    pub info: ResponseInfo,
    pub body: Vec<u8>,
}

/// Performs one physical request/response cycle.
///
/// `request` holds every option applied to the handle, client-wide settings
/// first and request-level settings (method, payload) after them. A failure
/// is reported as a transport [`ErrorCode`]; implementations never retry.
pub trait Transport: Send {
    fn perform(
        &mut self,
        request: &OptionSet,
        diagnostics: &mut DiagnosticLog,
    ) -> std::result::Result<RawResponse, ErrorCode>;
}

/// Production [`Transport`] on top of `reqwest`'s blocking client.
///
/// Client-wide settings (TLS, proxy, timeouts, redirects, default headers)
/// are fixed when the transport is built; URL, method, credentials and body
/// are read from the request options on every attempt.
#[derive(Clone)]
pub struct ReqwestTransport {
    http: Client,
}

impl fmt::Debug for ReqwestTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReqwestTransport").finish_non_exhaustive()
    }
}

impl ReqwestTransport {
    pub fn new(options: &OptionSet) -> Result<Self> {
        reject_unsupported(options)?;

        let verify_peer = options.flag(&TransportOption::SslVerifyPeer).unwrap_or(true);
        let verify_host = options.flag(&TransportOption::SslVerifyHost).unwrap_or(true);

        let mut builder = Client::builder()
            .redirect(redirect_policy(options))
            .danger_accept_invalid_certs(!verify_peer)
            .danger_accept_invalid_hostnames(!verify_host)
            .connect_timeout(seconds(options, &TransportOption::ConnectTimeout))
            .timeout(seconds(options, &TransportOption::Timeout))
            .default_headers(parse_headers(options)?);

        if let Some(agent) = options
            .text(&TransportOption::UserAgent)
            .filter(|agent| !agent.is_empty())
        {
            builder = builder.user_agent(agent);
        }
        if let Some(path) = options.text(&TransportOption::CaInfo) {
            builder = builder.add_root_certificate(load_certificate(&path)?);
        }
        if let Some(proxy) = proxy_url(options) {
            let proxy = Proxy::all(&proxy)
                .map_err(|err| GatewayError::Config(format!("invalid proxy '{proxy}': {err}")))?;
            builder = builder.proxy(proxy);
        }

        let http = builder.build().map_err(GatewayError::Transport)?;
        Ok(Self { http })
    }
}

impl Transport for ReqwestTransport {
    fn perform(
        &mut self,
        request: &OptionSet,
        diagnostics: &mut DiagnosticLog,
    ) -> std::result::Result<RawResponse, ErrorCode> {
        let url = request.text(&TransportOption::Url).unwrap_or_default();
        let method = request_method(request)?;

        diagnostics.info(format_args!("Connecting to {url}"));
        diagnostics.sent(format_args!("{method} {url}"));

        let mut builder = self.http.request(method, url.as_str());
        if let Some((username, password)) = basic_credentials(request) {
            diagnostics.sent(format_args!("Authorization: Basic <{username}>"));
            builder = builder.basic_auth(username, Some(password));
        }
        if let Some(body) = request.get(&TransportOption::PostFields) {
            let body = body.as_text();
            diagnostics.sent(format_args!("Content-Length: {}", body.len()));
            builder = builder.body(body);
        }

        let started = Instant::now();
        let response = builder.send().map_err(|err| {
            let code = ErrorCode::from_reqwest(&err);
            diagnostics.info(format_args!("error {code}: {err}"));
            code
        })?;

        let status = response.status();
        let effective_url = response.url().to_string();
        let remote_addr = response.remote_addr();
        let headers: Vec<(String, String)> = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_owned(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect();

        diagnostics.received(format_args!("{:?} {status}", response.version()));
        for (name, value) in &headers {
            diagnostics.received(format_args!("{name}: {value}"));
        }

        let body = response.bytes().map_err(|err| {
            let code = ErrorCode::from_reqwest(&err);
            diagnostics.info(format_args!("error {code} reading body: {err}"));
            code
        })?;
        diagnostics.info(format_args!("Received {} bytes", body.len()));

        Ok(RawResponse {
            info: ResponseInfo {
                status: status.as_u16(),
                effective_url,
                headers,
                size_download: body.len() as u64,
                total_time: started.elapsed(),
                remote_addr,
            },
            body: body.to_vec(),
        })
    }
}

fn reject_unsupported(options: &OptionSet) -> Result<()> {
    match options.iter().find_map(|(option, _)| match option {
        TransportOption::Other(name) => Some(name),
        _ => None,
    }) {
        Some(name) => Err(GatewayError::Config(format!(
            "unsupported transport option '{name}'"
        ))),
        None => Ok(()),
    }
}

fn redirect_policy(options: &OptionSet) -> redirect::Policy {
    if !options.flag(&TransportOption::FollowLocation).unwrap_or(false) {
        return redirect::Policy::none();
    }
    let limit = options
        .get(&TransportOption::MaxRedirs)
        .and_then(OptionValue::as_secs)
        .filter(|limit| *limit >= 0.0)
        .map_or(DEFAULT_MAX_REDIRECTS, |limit| limit as usize);
    redirect::Policy::limited(limit)
}

/// Positive seconds as a timeout; zero or absent disables it.
fn seconds(options: &OptionSet, option: &TransportOption) -> Option<Duration> {
    options
        .get(option)
        .and_then(OptionValue::as_secs)
        .filter(|secs| *secs > 0.0)
        .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
}

fn parse_headers(options: &OptionSet) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    let lines = options
        .get(&TransportOption::HttpHeader)
        .map(OptionValue::as_list)
        .unwrap_or_default();
    for line in lines {
        let (name, value) = line
            .split_once(':')
            .ok_or_else(|| GatewayError::Config(format!("malformed header '{line}'")))?;
        let name = HeaderName::from_bytes(name.trim().as_bytes())
            .map_err(|err| GatewayError::Config(format!("malformed header '{line}': {err}")))?;
        let value = HeaderValue::from_str(value.trim())
            .map_err(|err| GatewayError::Config(format!("malformed header '{line}': {err}")))?;
        headers.append(name, value);
    }
    Ok(headers)
}

fn load_certificate(path: &str) -> Result<Certificate> {
    let pem = std::fs::read(path)
        .map_err(|err| GatewayError::Config(format!("cannot read CA file '{path}': {err}")))?;
    Certificate::from_pem(&pem)
        .map_err(|err| GatewayError::Config(format!("invalid CA file '{path}': {err}")))
}

/// Proxy URL from host and port; a port without a host is ignored.
fn proxy_url(options: &OptionSet) -> Option<String> {
    let host = options.text(&TransportOption::Proxy)?;
    let mut url = if host.contains("://") {
        host
    } else {
        format!("http://{host}")
    };
    if let Some(port) = options.text(&TransportOption::ProxyPort) {
        url = format!("{}:{port}", url.trim_end_matches('/'));
    }
    Some(url)
}

fn request_method(request: &OptionSet) -> std::result::Result<Method, ErrorCode> {
    if let Some(custom) = request.text(&TransportOption::CustomRequest) {
        return Method::from_bytes(custom.as_bytes()).map_err(|_| ErrorCode::FAILED_INIT);
    }
    if request.flag(&TransportOption::Post).unwrap_or(false) {
        return Ok(Method::POST);
    }
    Ok(Method::GET)
}

fn basic_credentials(request: &OptionSet) -> Option<(String, String)> {
    let scheme = request.text(&TransportOption::HttpAuth)?;
    if !scheme.eq_ignore_ascii_case(AUTH_BASIC) {
        return None;
    }
    let credentials = request.text(&TransportOption::UserPwd)?;
    let (username, password) = credentials.split_once(':')?;
    Some((username.to_owned(), password.to_owned()))
}
