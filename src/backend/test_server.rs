//! Minimal HTTP/1.1 server for network tests.

use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

#[derive(Clone)]
pub struct Route {
    pub path: String,
    pub status: u16,
    pub body: Vec<u8>,
    pub declare_length: bool,
    pub chunked: bool,
    pub cut_after: Option<usize>,
    pub delay: Option<Duration>,
}

impl Route {
    pub fn ok(path: &str, body: Vec<u8>) -> Self {
        Route {
            path: path.to_string(),
            status: 200,
            body,
            declare_length: true,
            chunked: false,
            cut_after: None,
            delay: None,
        }
    }

    pub fn status(path: &str, status: u16) -> Self {
        Route {
            body: b"error".to_vec(),
            status,
            ..Route::ok(path, Vec::new())
        }
    }

    pub fn without_length(mut self) -> Self {
        self.declare_length = false;
        self
    }

    /// Uses chunked transfer encoding. Combined with `cut_after`, the
    /// connection closes without the terminating chunk.
    pub fn chunked(mut self) -> Self {
        self.chunked = true;
        self.declare_length = false;
        self
    }

    /// Sends the declared headers but drops the connection after `n` body bytes.
    pub fn cut_after(mut self, n: usize) -> Self {
        self.cut_after = Some(n);
        self
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

/// Starts serving `routes` on an ephemeral port and returns the base URL.
pub async fn serve(routes: Vec<Route>) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let routes = Arc::new(routes);

    tokio::spawn(async move {
        while let Ok((socket, _)) = listener.accept().await {
            let routes = routes.clone();
            tokio::spawn(async move {
                let _ = respond(socket, &routes).await;
            });
        }
    });

    format!("http://{}", addr)
}

async fn respond(mut socket: TcpStream, routes: &[Route]) -> std::io::Result<()> {
    let mut request = Vec::new();
    let mut buf = [0u8; 1024];
    while !request.windows(4).any(|w| w == b"\r\n\r\n") {
        let n = socket.read(&mut buf).await?;
        if n == 0 {
            return Ok(());
        }
        request.extend_from_slice(&buf[..n]);
    }

    let head = String::from_utf8_lossy(&request);
    let path = head.split_whitespace().nth(1).unwrap_or("/").to_string();
    let route = routes
        .iter()
        .find(|r| r.path == path)
        .cloned()
        .unwrap_or_else(|| Route::status(&path, 404));

    if let Some(delay) = route.delay {
        tokio::time::sleep(delay).await;
    }

    let mut response = format!(
        "HTTP/1.1 {} {}\r\nConnection: close\r\nContent-Type: video/mp4\r\n",
        route.status,
        reason(route.status)
    );
    if route.declare_length {
        response.push_str(&format!("Content-Length: {}\r\n", route.body.len()));
    }
    if route.chunked {
        response.push_str("Transfer-Encoding: chunked\r\n");
    }
    response.push_str("\r\n");

    socket.write_all(response.as_bytes()).await?;
    let sent = route.cut_after.unwrap_or(route.body.len()).min(route.body.len());
    if route.chunked {
        if sent > 0 {
            socket.write_all(format!("{:x}\r\n", sent).as_bytes()).await?;
            socket.write_all(&route.body[..sent]).await?;
            socket.write_all(b"\r\n").await?;
        }
        if route.cut_after.is_none() {
            socket.write_all(b"0\r\n\r\n").await?;
        }
    } else {
        socket.write_all(&route.body[..sent]).await?;
    }
    socket.flush().await?;
    socket.shutdown().await
}

fn reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        404 => "Not Found",
        500 => "Internal Server Error",
        503 => "Service Unavailable",
        _ => "Unknown",
    }
}

/// Smallest playable-looking MP4: `ftyp`, empty `moov`, then `mdat` padding
/// up to `size` bytes (minimum 32).
pub fn fake_mp4(size: usize) -> Vec<u8> {
    let mut data = Vec::with_capacity(size.max(32));
    data.extend_from_slice(&16u32.to_be_bytes());
    data.extend_from_slice(b"ftypisom");
    data.extend_from_slice(&0u32.to_be_bytes());
    data.extend_from_slice(&8u32.to_be_bytes());
    data.extend_from_slice(b"moov");

    let mdat_len = size.saturating_sub(data.len()).max(8);
    data.extend_from_slice(&(mdat_len as u32).to_be_bytes());
    data.extend_from_slice(b"mdat");
    data.resize(data.len() + mdat_len - 8, 0);
    data
}
