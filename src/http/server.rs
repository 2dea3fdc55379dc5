//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum Router for the configured role
//! - Wire up middleware (request ID, tracing)
//! - Enforce the invocation deadline around each handler call
//! - Record invocation metrics
//! - Serve until a shutdown signal arrives

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    extract::State,
    http::{HeaderMap, Method, Uri},
    routing::get,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::config::RelayConfig;
use crate::http::request::Invocation;
use crate::http::response::Envelope;
use crate::lifecycle::signals::shutdown_signal;
use crate::observability::{metrics, Diagnostics};
use crate::relay::payload::ErrorPayload;
use crate::relay::{FetchError, GreetingHandler, InvokerHandler, Role};

pub const DEADLINE_MESSAGE: &str = "Invocation timed out";

/// Handler plus the deadline it runs under.
struct Bound<H> {
    handler: H,
    deadline: Duration,
}

/// HTTP server for one relay role.
pub struct HttpServer {
    router: Router,
    role: Role,
}

impl HttpServer {
    /// Create a server for `role`.
    pub fn new(config: &RelayConfig, role: Role, diagnostics: Diagnostics) -> Result<Self, FetchError> {
        let deadline = Duration::from_secs(config.timeouts.invocation_secs);
        let routes = match role {
            Role::Invoker => {
                let handler = InvokerHandler::new(config, diagnostics)?;
                Router::new()
                    .route("/", get(invoke))
                    .with_state(Arc::new(Bound { handler, deadline }))
            }
            Role::Greeting => {
                let handler = GreetingHandler::new(config, diagnostics);
                Router::new()
                    .route("/", get(greet))
                    .with_state(Arc::new(Bound { handler, deadline }))
            }
        };

        Ok(Self {
            router: Self::build_router(routes),
            role,
        })
    }

    /// Add health probe and middleware layers.
    fn build_router(routes: Router) -> Router {
        routes
            .route("/health", get(|| async { "ok" }))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    pub fn role(&self) -> Role {
        self.role
    }

    /// The fully layered router, for in-process use.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until `shutdown` fires or the process is signalled.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, role = %self.role, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                tokio::select! {
                    _ = shutdown.recv() => {}
                    _ = shutdown_signal() => {}
                }
            })
            .await?;

        tracing::info!(role = %self.role, "HTTP server stopped");
        Ok(())
    }
}

async fn invoke(
    State(bound): State<Arc<Bound<InvokerHandler>>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
) -> Envelope {
    let start = Instant::now();
    let invocation = Invocation::from_http(&method, &uri, &headers);

    let envelope = match tokio::time::timeout(bound.deadline, bound.handler.handle(&invocation)).await {
        Ok(envelope) => envelope,
        Err(_) => deadline_exceeded(&invocation, bound.deadline),
    };

    metrics::record_invocation(Role::Invoker.as_str(), envelope.status_code, start);
    envelope
}

async fn greet(
    State(bound): State<Arc<Bound<GreetingHandler>>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
) -> Envelope {
    let start = Instant::now();
    let invocation = Invocation::from_http(&method, &uri, &headers);
    let envelope = bound.handler.handle(&invocation);
    metrics::record_invocation(Role::Greeting.as_str(), envelope.status_code, start);
    envelope
}

/// Answer for an invocation cancelled by the platform deadline.
///
/// By the time this runs the handler future has been dropped, which closed
/// its span.
fn deadline_exceeded(invocation: &Invocation, deadline: Duration) -> Envelope {
    tracing::error!(
        request_id = %invocation.request_id,
        deadline_secs = deadline.as_secs(),
        "Invocation cancelled at deadline"
    );
    Envelope::json(
        504,
        &ErrorPayload {
            message: DEADLINE_MESSAGE.to_string(),
            error: format!("invocation exceeded its {}s deadline", deadline.as_secs()),
        },
    )
}
