use std::sync::Arc;

use gateway_http::{Config, GatewayClient, InfoKey, TracingLogger};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let url = std::env::var("GATEWAY_URL")?;
    let mut config = Config::new()
        .with("url", url)
        .with("connect_attempts", 3)
        .with("connect_attempts_timeout", 30)
        .with("http_headers", serde_json::json!(["Content-Type: text/xml"]));
    if let (Ok(username), Ok(password)) = (
        std::env::var("GATEWAY_USERNAME"),
        std::env::var("GATEWAY_PASSWORD"),
    ) {
        config = config.with("username", username).with("password", password);
    }

    let mut client = GatewayClient::new(Arc::new(TracingLogger), config)?;
    let body = client.post(Some("<payment><amount>10.00</amount></payment>"))?;

    println!("status: {}", client.response_code());
    println!("content type: {:?}", client.info(InfoKey::ContentType));
    println!("{}", String::from_utf8_lossy(&body));

    Ok(())
}
