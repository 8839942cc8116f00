//! A minimal HTTP/1.1 server answering with canned responses.
//!
//! Each connection carries exactly one request and is closed after the
//! response, which keeps the parsing trivial. Requests are recorded so tests
//! can inspect what a backend actually put on the wire.

use std::io;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

/// A response served by [`FakeHttpServer`].
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CannedResponse {
    status: u16,
    content_type: String,
    body: String,
}

impl CannedResponse {
    /// Creates a JSON response.
    #[inline]
    pub fn json<S: Into<String>>(status: u16, body: S) -> Self {
        Self {
            status,
            content_type: "application/json".to_owned(),
            body: body.into(),
        }
    }

    /// Replaces the content type.
    #[inline]
    pub fn with_content_type<S: Into<String>>(mut self, content_type: S) -> Self {
        self.content_type = content_type.into();
        self
    }
}

/// A request received by [`FakeHttpServer`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordedRequest {
    /// The method, e.g. `POST`.
    pub method: String,
    /// The request target, e.g. `/v1/chat/completions`.
    pub path: String,
    /// Headers with lowercase names, in arrival order.
    pub headers: Vec<(String, String)>,
    /// The body, decoded lossily as UTF-8.
    pub body: String,
}

impl RecordedRequest {
    /// Returns the first header named `name`, ignoring case.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Default)]
struct SharedState {
    responses: Vec<CannedResponse>,
    served: usize,
    received: Vec<RecordedRequest>,
}

/// A local HTTP server for exercising the HTTP backends offline.
///
/// Responses are served in order; once they run out every request gets a
/// `500`. The server stops when dropped.
pub struct FakeHttpServer {
    addr: SocketAddr,
    state: Arc<Mutex<SharedState>>,
    task: JoinHandle<()>,
}

impl FakeHttpServer {
    /// Binds to an ephemeral port on the loopback interface and starts
    /// serving. Must be called within a Tokio runtime.
    pub async fn start<I>(responses: I) -> io::Result<Self>
    where
        I: IntoIterator<Item = CannedResponse>,
    {
        let listener = TcpListener::bind(("127.0.0.1", 0)).await?;
        let addr = listener.local_addr()?;
        let state = Arc::new(Mutex::new(SharedState {
            responses: responses.into_iter().collect(),
            ..Default::default()
        }));

        let task = tokio::spawn({
            let state = Arc::clone(&state);
            async move {
                while let Ok((stream, _)) = listener.accept().await {
                    tokio::spawn(serve(stream, Arc::clone(&state)));
                }
            }
        });
        Ok(Self { addr, state, task })
    }

    /// Returns `http://127.0.0.1:<port>`.
    #[inline]
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Returns the requests received so far, oldest first.
    pub fn received_requests(&self) -> Vec<RecordedRequest> {
        lock(&self.state).received.clone()
    }
}

impl Drop for FakeHttpServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

fn lock(state: &Mutex<SharedState>) -> MutexGuard<'_, SharedState> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

async fn serve(mut stream: TcpStream, state: Arc<Mutex<SharedState>>) {
    let Ok(request) = read_request(&mut stream).await else {
        return;
    };
    let response = {
        let mut state = lock(&state);
        state.received.push(request);
        let next = state.responses.get(state.served).cloned();
        state.served += 1;
        next.unwrap_or_else(|| CannedResponse::json(500, "{}"))
    };

    let head = format!(
        "HTTP/1.1 {} Canned\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        response.status,
        response.content_type,
        response.body.len()
    );
    if stream.write_all(head.as_bytes()).await.is_err() {
        return;
    }
    if stream.write_all(response.body.as_bytes()).await.is_err() {
        return;
    }
    let _ = stream.shutdown().await;
}

async fn read_request(stream: &mut TcpStream) -> io::Result<RecordedRequest> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    let header_end = loop {
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos;
        }
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            return Err(io::ErrorKind::UnexpectedEof.into());
        }
        buf.extend_from_slice(&chunk[..n]);
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).into_owned();
    let mut lines = head.split("\r\n");
    let mut request_line = lines.next().unwrap_or_default().split(' ');
    let method = request_line.next().unwrap_or_default().to_owned();
    let path = request_line.next().unwrap_or_default().to_owned();
    let headers: Vec<(String, String)> = lines
        .filter_map(|line| line.split_once(':'))
        .map(|(k, v)| (k.trim().to_ascii_lowercase(), v.trim().to_owned()))
        .collect();
    let content_length = headers
        .iter()
        .find(|(k, _)| k == "content-length")
        .and_then(|(_, v)| v.parse::<usize>().ok())
        .unwrap_or(0);

    let body_start = header_end + 4;
    while buf.len() < body_start + content_length {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            return Err(io::ErrorKind::UnexpectedEof.into());
        }
        buf.extend_from_slice(&chunk[..n]);
    }
    let body =
        String::from_utf8_lossy(&buf[body_start..body_start + content_length])
            .into_owned();

    Ok(RecordedRequest {
        method,
        path,
        headers,
        body,
    })
}
