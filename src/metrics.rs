use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::header::CONTENT_TYPE;
use axum::middleware::Next;
use axum::response::Response;
use futures::StreamExt;
use prometheus::{Counter, Encoder, Gauge, Histogram, HistogramOpts, Registry, TextEncoder};
use tokio::time::interval;
use tracing::info;

// Process-wide request metrics, handed to the router as state. Prometheus
// series are cumulative; the window is what the periodic reporter logs and
// then resets.
pub struct Metrics {
    registry: Registry,
    requests_total: Counter,
    in_flight: Gauge,
    request_latency: Histogram,
    window: Mutex<Window>,
}

#[derive(Default)]
struct Window {
    requests: u64,
    latencies_ms: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WindowReport {
    pub requests: u64,
    pub in_flight: i64,
    pub avg_latency_ms: f64,
    pub max_latency_ms: f64,
}

impl Metrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();
        let requests_total = Counter::new("mock_requests_total", "Total number of requests")?;
        let in_flight = Gauge::new("mock_requests_in_flight", "Requests currently being handled")?;
        let request_latency = Histogram::with_opts(HistogramOpts::new(
            "mock_request_latency_seconds",
            "Request latency in seconds",
        ))?;

        registry.register(Box::new(requests_total.clone()))?;
        registry.register(Box::new(in_flight.clone()))?;
        registry.register(Box::new(request_latency.clone()))?;

        Ok(Self {
            registry,
            requests_total,
            in_flight,
            request_latency,
            window: Mutex::new(Window::default()),
        })
    }

    pub fn request_started(&self) {
        self.requests_total.inc();
        self.in_flight.inc();
    }

    pub fn request_finished(&self, elapsed: Duration) {
        self.in_flight.dec();
        self.request_latency.observe(elapsed.as_secs_f64());
        if let Ok(mut window) = self.window.lock() {
            window.requests += 1;
            window.latencies_ms.push(elapsed.as_secs_f64() * 1000.0);
        }
    }

    // snapshot of the current window; starts a new one
    pub fn take_window(&self) -> WindowReport {
        let window = self
            .window
            .lock()
            .map(|mut w| std::mem::take(&mut *w))
            .unwrap_or_default();
        let samples = &window.latencies_ms;
        let avg_latency_ms = if samples.is_empty() {
            0.0
        } else {
            samples.iter().sum::<f64>() / samples.len() as f64
        };
        WindowReport {
            requests: window.requests,
            in_flight: self.in_flight.get() as i64,
            avg_latency_ms,
            max_latency_ms: samples.iter().copied().fold(0.0, f64::max),
        }
    }

    // prometheus text exposition
    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

// Records the request as finished when dropped.
struct FinishGuard {
    metrics: Arc<Metrics>,
    start: Instant,
}

impl Drop for FinishGuard {
    fn drop(&mut self) {
        self.metrics.request_finished(self.start.elapsed());
    }
}

// middleware: in-flight count and latency for every request. Event streams
// count as in flight until their body is finished or dropped.
pub async fn track_requests(State(metrics): State<Arc<Metrics>>, req: Request, next: Next) -> Response {
    metrics.request_started();
    let guard = FinishGuard {
        metrics,
        start: Instant::now(),
    };
    let response = next.run(req).await;

    let streaming = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("text/event-stream"));
    if !streaming {
        drop(guard);
        return response;
    }

    let (parts, body) = response.into_parts();
    let body = body.into_data_stream().map(move |chunk| {
        let _guard = &guard;
        chunk
    });
    Response::from_parts(parts, Body::from_stream(body))
}

// Logs the request window every `every` and resets it
pub async fn reporter(metrics: Arc<Metrics>, every: Duration) {
    let mut ticker = interval(every);
    // the first tick fires immediately
    ticker.tick().await;

    info!("Metrics reporter started (interval: {:?})", every);
    loop {
        ticker.tick().await;
        let report = metrics.take_window();
        info!(
            requests = report.requests,
            in_flight = report.in_flight,
            avg_latency_ms = report.avg_latency_ms,
            max_latency_ms = report.max_latency_ms,
            "request window"
        );
    }
}
