use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::{Duration, Instant};

use tonic::codegen::http;
use tower::{Layer, Service};

type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Request logging for the gRPC server.
///
/// Logs every RPC as a structured `tracing` event carrying the method path,
/// the gRPC status code and the elapsed time.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestLogLayer;

impl RequestLogLayer {
    pub fn new() -> Self {
        Self
    }
}

impl<S> Layer<S> for RequestLogLayer {
    type Service = RequestLog<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RequestLog { inner }
    }
}

#[derive(Debug, Clone)]
pub struct RequestLog<S> {
    inner: S,
}

impl<S, ReqBody, ResBody> Service<http::Request<ReqBody>> for RequestLog<S>
where
    S: Service<http::Request<ReqBody>, Response = http::Response<ResBody>>
        + Clone
        + Send
        + 'static,
    S::Future: Send + 'static,
    ReqBody: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: http::Request<ReqBody>) -> Self::Future {
        // The clone may not be ready; keep the one that was polled.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        let method = req.uri().path().to_string();
        let started = Instant::now();

        Box::pin(async move {
            let result = inner.call(req).await;
            let elapsed_ms = elapsed_millis(started.elapsed());

            match &result {
                Ok(response) => {
                    let code = grpc_status(response.headers());
                    if code == "0" {
                        tracing::info!(method = %method, grpc_status = code, elapsed_ms, "rpc");
                    } else {
                        tracing::warn!(method = %method, grpc_status = code, elapsed_ms, "rpc");
                    }
                }
                Err(_) => {
                    tracing::error!(method = %method, elapsed_ms, "rpc transport failure");
                }
            }

            result
        })
    }
}

/// Status code of a trailers-only response. Successful unary calls carry
/// their status in the trailers, so a missing header means OK.
pub fn grpc_status(headers: &http::HeaderMap) -> &str {
    headers
        .get("grpc-status")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("0")
}

/// Whole milliseconds in `elapsed`, saturating at `u64::MAX`.
pub fn elapsed_millis(elapsed: Duration) -> u64 {
    u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
}
