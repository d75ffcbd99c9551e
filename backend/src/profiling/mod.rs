//! Optional per-request profiling for the account pages.
//!
//! When `PROFILING_ENABLED` is set, requests arriving from a loopback
//! address carry a [`Profiler`]; handlers wrap expensive work (bcrypt,
//! database writes, rendering) in named steps. The timings are logged and
//! returned in a `Server-Timing` header. Every other request carries a
//! disabled handle whose steps are no-ops.

use crate::config::Config;
use axum::{
    Extension,
    extract::{ConnectInfo, Request},
    http::{HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};
use std::{
    net::SocketAddr,
    sync::{Arc, Mutex},
    time::{Duration, Instant},
};

pub const SERVER_TIMING: HeaderName = HeaderName::from_static("server-timing");

#[derive(Debug, Clone)]
pub struct Timing {
    pub name: String,
    pub duration: Duration,
}

/// Collects named step timings for one request.
#[derive(Debug)]
pub struct Profiler {
    name: String,
    started: Instant,
    timings: Mutex<Vec<Timing>>,
}

impl Profiler {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            started: Instant::now(),
            timings: Mutex::new(Vec::new()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Starts a step that is recorded when the returned guard drops.
    pub fn step(&self, name: &str) -> Step<'_> {
        Step {
            profiler: self,
            name: name.to_string(),
            started: Instant::now(),
        }
    }

    pub fn record(&self, name: impl Into<String>, duration: Duration) {
        let mut timings = self.timings.lock().unwrap_or_else(|e| e.into_inner());
        timings.push(Timing {
            name: name.into(),
            duration,
        });
    }

    /// Recorded steps in completion order.
    pub fn timings(&self) -> Vec<Timing> {
        self.timings
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Renders the steps plus the total as a `Server-Timing` header value.
    pub fn server_timing(&self) -> String {
        let mut entries: Vec<String> = self
            .timings()
            .iter()
            .map(|timing| {
                format!(
                    "{};dur={:.3};desc=\"{}\"",
                    metric_name(&timing.name),
                    millis(timing.duration),
                    timing.name.replace('"', "'")
                )
            })
            .collect();
        entries.push(format!("total;dur={:.3}", millis(self.elapsed())));
        entries.join(", ")
    }
}

/// Guard for a running step.
pub struct Step<'a> {
    profiler: &'a Profiler,
    name: String,
    started: Instant,
}

impl Drop for Step<'_> {
    fn drop(&mut self) {
        self.profiler
            .record(std::mem::take(&mut self.name), self.started.elapsed());
    }
}

/// Per-request profiler handle placed in the request extensions.
#[derive(Debug, Clone, Default)]
pub struct RequestProfiler(Option<Arc<Profiler>>);

impl RequestProfiler {
    pub fn disabled() -> Self {
        Self(None)
    }

    pub fn enabled(name: impl Into<String>) -> Self {
        Self(Some(Arc::new(Profiler::new(name))))
    }

    pub fn profiler(&self) -> Option<&Profiler> {
        self.0.as_deref()
    }

    /// Starts a step, or returns `None` when profiling is off for this request.
    pub fn step(&self, name: &str) -> Option<Step<'_>> {
        self.profiler().map(|profiler| profiler.step(name))
    }
}

/// Attaches a [`RequestProfiler`] to every request and reports its timings.
pub async fn profile_request(
    Extension(config): Extension<Arc<Config>>,
    mut request: Request,
    next: Next,
) -> Response {
    let is_local = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .is_some_and(|ConnectInfo(addr)| addr.ip().to_canonical().is_loopback());

    let handle = if config.profiling_enabled && is_local {
        RequestProfiler::enabled(request.uri().to_string())
    } else {
        RequestProfiler::disabled()
    };
    request.extensions_mut().insert(handle.clone());

    let mut response = next.run(request).await;

    if let Some(profiler) = handle.profiler() {
        for timing in profiler.timings() {
            tracing::debug!(
                request = profiler.name(),
                step = %timing.name,
                millis = millis(timing.duration),
                "Profiler step"
            );
        }
        tracing::debug!(
            request = profiler.name(),
            millis = millis(profiler.elapsed()),
            "Profiled request finished"
        );

        match HeaderValue::from_str(&profiler.server_timing()) {
            Ok(value) => {
                response.headers_mut().insert(SERVER_TIMING, value);
            }
            Err(error) => tracing::warn!("Invalid Server-Timing header: {}", error),
        }
    }

    response
}

fn millis(duration: Duration) -> f64 {
    duration.as_secs_f64() * 1000.0
}

/// Turns a step description into a `Server-Timing` metric token.
fn metric_name(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '-' })
        .collect()
}
