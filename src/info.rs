use std::net::SocketAddr;
use std::time::Duration;

/// Metadata field reported about a completed exchange.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum InfoKey {
    /// Final HTTP status code, `0` before any response.
    HttpCode,
    /// URL of the last request after redirects.
    EffectiveUrl,
    /// `Content-Type` response header.
    ContentType,
    /// Body size in bytes.
    SizeDownload,
    /// Wall time of the attempt that produced the response, in seconds.
    TotalTime,
    /// Remote address the response came from.
    PrimaryIp,
    /// Remote port the response came from.
    PrimaryPort,
}

#[derive(Clone, Debug, PartialEq)]
pub enum InfoValue {
    Int(i64),
    Float(f64),
    Text(String),
}

/// Metadata of the most recent response.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ResponseInfo {
    pub status: u16,
    pub effective_url: String,
    pub headers: Vec<(String, String)>,
    pub size_download: u64,
    pub total_time: Duration,
    pub remote_addr: Option<SocketAddr>,
}

impl ResponseInfo {
    /// First header value named `name`, compared case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn get(&self, key: InfoKey) -> Option<InfoValue> {
        match key {
            InfoKey::HttpCode => Some(InfoValue::Int(self.status.into())),
            InfoKey::EffectiveUrl => Some(InfoValue::Text(self.effective_url.clone())),
            InfoKey::ContentType => self
                .header("content-type")
                .map(|value| InfoValue::Text(value.to_owned())),
            InfoKey::SizeDownload => i64::try_from(self.size_download).ok().map(InfoValue::Int),
            InfoKey::TotalTime => Some(InfoValue::Float(self.total_time.as_secs_f64())),
            InfoKey::PrimaryIp => self
                .remote_addr
                .map(|addr| InfoValue::Text(addr.ip().to_string())),
            InfoKey::PrimaryPort => self
                .remote_addr
                .map(|addr| InfoValue::Int(addr.port().into())),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::{InfoKey, InfoValue, ResponseInfo};

    fn sample() -> ResponseInfo {
        ResponseInfo {
            status: 201,
            effective_url: "https://gateway.example/pay".to_owned(),
            headers: vec![("Content-Type".to_owned(), "text/xml".to_owned())],
            size_download: 12,
            total_time: Duration::from_millis(250),
            remote_addr: Some("10.0.0.7:443".parse().expect("socket addr")),
        }
    }

    #[test]
    fn reads_every_field() {
        let info = sample();
        assert_eq!(info.get(InfoKey::HttpCode), Some(InfoValue::Int(201)));
        assert_eq!(
            info.get(InfoKey::ContentType),
            Some(InfoValue::Text("text/xml".to_owned()))
        );
        assert_eq!(info.get(InfoKey::SizeDownload), Some(InfoValue::Int(12)));
        assert_eq!(info.get(InfoKey::TotalTime), Some(InfoValue::Float(0.25)));
        assert_eq!(
            info.get(InfoKey::PrimaryIp),
            Some(InfoValue::Text("10.0.0.7".to_owned()))
        );
        assert_eq!(info.get(InfoKey::PrimaryPort), Some(InfoValue::Int(443)));
    }

    #[test]
    fn empty_info_reports_zero_status() {
        let info = ResponseInfo::default();
        assert_eq!(info.get(InfoKey::HttpCode), Some(InfoValue::Int(0)));
        assert_eq!(info.get(InfoKey::ContentType), None);
        assert_eq!(info.get(InfoKey::PrimaryIp), None);
    }
}
