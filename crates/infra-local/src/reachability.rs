// Network reachability probe
// reason: reqwest for the single timed GET

use std::time::Duration;

use reqwest::{Client, StatusCode};
use tracing::debug;

use tether_core::domain::normalize_address;

/// One GET against `address`; true only on HTTP 200.
///
/// Network errors, timeouts and other statuses all report false.
pub async fn is_reachable(client: &Client, address: &str, timeout: Duration) -> bool {
    let url = normalize_address(address);

    match client.get(&url).timeout(timeout).send().await {
        Ok(response) => {
            let status = response.status();
            debug!(url = %url, status = %status, "Reachability probe answered");
            status == StatusCode::OK
        }
        Err(e) => {
            debug!(url = %url, error = %e, "Reachability probe failed");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve `status` to every connection after `delay`; returns host:port
    async fn serve(status: &'static str, delay: Duration) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            loop {
                let Ok((mut socket, _)) = listener.accept().await else {
                    return;
                };
                tokio::spawn(async move {
                    let mut buf = [0u8; 1024];
                    let _ = socket.read(&mut buf).await;
                    tokio::time::sleep(delay).await;
                    let response = format!(
                        "HTTP/1.1 {}\r\ncontent-length: 2\r\nconnection: close\r\n\r\nok",
                        status
                    );
                    let _ = socket.write_all(response.as_bytes()).await;
                });
            }
        });

        addr.to_string()
    }

    const TIMEOUT: Duration = Duration::from_millis(1000);

    fn client() -> Client {
        Client::builder().no_proxy().build().unwrap()
    }

    #[tokio::test]
    async fn test_ok_is_reachable() {
        let host = serve("200 OK", Duration::ZERO).await;
        assert!(is_reachable(&client(), &host, TIMEOUT).await);
        assert!(is_reachable(&client(), &format!("http://{}/health", host), TIMEOUT).await);
    }

    #[tokio::test]
    async fn test_not_found_is_unreachable() {
        let host = serve("404 Not Found", Duration::ZERO).await;
        assert!(!is_reachable(&client(), &host, TIMEOUT).await);
    }

    #[tokio::test]
    async fn test_non_200_success_is_unreachable() {
        let host = serve("201 Created", Duration::ZERO).await;
        assert!(!is_reachable(&client(), &host, TIMEOUT).await);
    }

    #[tokio::test]
    async fn test_slow_server_is_unreachable() {
        let host = serve("200 OK", Duration::from_millis(1500)).await;
        assert!(!is_reachable(&client(), &host, TIMEOUT).await);
    }

    #[tokio::test]
    async fn test_refused_connection_is_unreachable() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        assert!(!is_reachable(&client(), &addr.to_string(), TIMEOUT).await);
    }
}
