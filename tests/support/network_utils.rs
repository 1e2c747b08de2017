//! Shared mock endpoints for throughput tests (ranged files, redirects, stalls).

use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Mounts a range-capable file: `HEAD` advertises `Accept-Ranges: bytes`,
/// `GET` answers 206 with `size` bytes.
#[allow(dead_code)]
pub async fn mount_ranged_file(server: &MockServer, at: &str, size: usize) {
    Mock::given(method("HEAD"))
        .and(path(at))
        .respond_with(ResponseTemplate::new(200).insert_header("Accept-Ranges", "bytes"))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path(at))
        .respond_with(ResponseTemplate::new(206).set_body_bytes(vec![0x5a; size]))
        .mount(server)
        .await;
}

/// Mounts a `HEAD` redirect from `from` to `to`.
#[allow(dead_code)]
pub async fn mount_head_redirect(server: &MockServer, from: &str, to: &str, status: u16) {
    Mock::given(method("HEAD"))
        .and(path(from))
        .respond_with(ResponseTemplate::new(status).insert_header("Location", to))
        .mount(server)
        .await;
}

/// Mounts a `HEAD` that answers with `status` and no headers.
#[allow(dead_code)]
pub async fn mount_head_status(server: &MockServer, at: &str, status: u16) {
    Mock::given(method("HEAD"))
        .and(path(at))
        .respond_with(ResponseTemplate::new(status))
        .mount(server)
        .await;
}

/// Starts a raw HTTP server whose ranged `GET` sends headers and `sent` body
/// bytes of a larger declared length, then stalls without closing.
///
/// Returns the base URL (`http://127.0.0.1:port`).
#[allow(dead_code)]
pub async fn stalling_server(sent: usize) -> Option<String> {
    let listener = TcpListener::bind("127.0.0.1:0").await.ok()?;
    let addr = listener.local_addr().ok()?;
    tokio::spawn(async move {
        while let Ok((socket, _)) = listener.accept().await {
            tokio::spawn(serve_stalling(socket, sent));
        }
    });
    Some(format!("http://{addr}"))
}

async fn serve_stalling(mut socket: TcpStream, sent: usize) {
    let mut request = Vec::new();
    let mut buf = [0u8; 1024];
    while !request.windows(4).any(|w| w == b"\r\n\r\n") {
        match socket.read(&mut buf).await {
            Ok(0) | Err(_) => return,
            Ok(n) => request.extend_from_slice(&buf[..n]),
        }
    }

    let declared = sent * 1024;
    if request.starts_with(b"HEAD") {
        let head = format!(
            "HTTP/1.1 200 OK\r\nAccept-Ranges: bytes\r\nContent-Length: {declared}\r\nConnection: close\r\n\r\n"
        );
        let _ = socket.write_all(head.as_bytes()).await;
        let _ = socket.shutdown().await;
        return;
    }

    let head = format!(
        "HTTP/1.1 206 Partial Content\r\nContent-Length: {declared}\r\nContent-Range: bytes 0-{}/{declared}\r\n\r\n",
        declared - 1
    );
    if socket.write_all(head.as_bytes()).await.is_err() {
        return;
    }
    let _ = socket.write_all(&vec![0x5a; sent]).await;
    let _ = socket.flush().await;
    // Hold the connection open with no further bytes.
    tokio::time::sleep(Duration::from_secs(60)).await;
}
