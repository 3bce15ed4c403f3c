pub mod config;
pub mod scan;
pub mod serve;
pub mod status;
pub mod trigger;

/// Client URL for a server bound to `bind`; wildcard addresses map to loopback
pub fn server_url(bind: &str) -> String {
    let (host, port) = bind.rsplit_once(':').unwrap_or((bind, "5000"));
    let host = match host {
        "" | "0.0.0.0" | "[::]" => "127.0.0.1",
        other => other,
    };
    format!("http://{}:{}", host, port)
}
