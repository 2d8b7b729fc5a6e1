//! Readiness shared between the HTTP probes and `grpc.health.v1`.
//!
//! During shutdown the service first reports itself as not serving on both
//! surfaces, waits for load balancers to notice, and only then stops the
//! listeners.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::Mutex;
use tonic_health::ServingStatus;
use tonic_health::server::HealthReporter;

/// Health service components returned by [`Readiness::new`].
pub struct HealthComponents<S> {
    /// The health server to add to the gRPC router.
    pub server: tonic_health::pb::health_server::HealthServer<S>,
    /// Handle for flipping readiness.
    pub readiness: Readiness,
}

/// Readiness flag for one named gRPC service.
#[derive(Clone)]
pub struct Readiness {
    ready: Arc<AtomicBool>,
    reporter: Arc<Mutex<HealthReporter>>,
    service_name: String,
}

impl Readiness {
    /// Create the health server and a readiness handle, initially not serving.
    pub fn new(
        service_name: impl Into<String>,
    ) -> HealthComponents<impl tonic_health::pb::health_server::Health> {
        let (reporter, server) = tonic_health::server::health_reporter();
        HealthComponents {
            server,
            readiness: Readiness {
                ready: Arc::new(AtomicBool::new(false)),
                reporter: Arc::new(Mutex::new(reporter)),
                service_name: service_name.into(),
            },
        }
    }

    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    pub async fn set_serving(&self) {
        self.set(true).await;
    }

    pub async fn set_not_serving(&self) {
        self.set(false).await;
    }

    async fn set(&self, serving: bool) {
        self.ready.store(serving, Ordering::SeqCst);
        let status = if serving {
            ServingStatus::Serving
        } else {
            ServingStatus::NotServing
        };
        let mut reporter = self.reporter.lock().await;
        reporter
            .set_service_status(&self.service_name, status)
            .await;
        // The empty name is the overall server status.
        reporter.set_service_status("", status).await;
    }
}
