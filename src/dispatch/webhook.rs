//! Webhook sinks: the JSON marketing hook and the multipart spreadsheet backup.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::Form;

use super::payload::LeadPayload;
use crate::config::{HTTP_TIMEOUT, http_client};
use crate::error::DispatchError;

/// Somewhere a lead can be posted. One attempt, no retry.
#[async_trait]
pub trait LeadSink: Send + Sync {
    /// Sink name for logs.
    fn name(&self) -> &str;

    /// Post the lead. Returns the HTTP status on any response, even non-2xx;
    /// only transport failures are errors.
    async fn submit(&self, payload: &LeadPayload) -> Result<u16, DispatchError>;
}

/// Posts the lead as a JSON body.
pub struct JsonWebhook {
    url: String,
    client: reqwest::Client,
}

impl JsonWebhook {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            client: http_client(HTTP_TIMEOUT),
        }
    }

    /// Override the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.client = http_client(timeout);
        self
    }
}

#[async_trait]
impl LeadSink for JsonWebhook {
    fn name(&self) -> &str {
        "primary"
    }

    async fn submit(&self, payload: &LeadPayload) -> Result<u16, DispatchError> {
        let resp = self
            .client
            .post(&self.url)
            .json(payload)
            .send()
            .await
            .map_err(|e| DispatchError::Webhook {
                sink: self.name().into(),
                reason: e.to_string(),
            })?;

        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        tracing::debug!(sink = self.name(), status = %status, body = %body, "Webhook response");
        Ok(status.as_u16())
    }
}

/// Posts the lead as multipart form fields.
pub struct FormWebhook {
    url: String,
    client: reqwest::Client,
}

impl FormWebhook {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            client: http_client(HTTP_TIMEOUT),
        }
    }

    /// Override the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.client = http_client(timeout);
        self
    }
}

#[async_trait]
impl LeadSink for FormWebhook {
    fn name(&self) -> &str {
        "backup"
    }

    async fn submit(&self, payload: &LeadPayload) -> Result<u16, DispatchError> {
        let form = payload
            .form_fields()
            .into_iter()
            .fold(Form::new(), |form, (key, value)| {
                form.text(key, value.to_string())
            });

        let resp = self
            .client
            .post(&self.url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| DispatchError::Webhook {
                sink: self.name().into(),
                reason: e.to_string(),
            })?;

        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        tracing::debug!(sink = self.name(), status = %status, body = %body, "Webhook response");
        Ok(status.as_u16())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::Router;
    use axum::body::Bytes;
    use axum::extract::State;
    use axum::http::StatusCode;
    use axum::routing::post;

    use super::*;

    type Bodies = Arc<Mutex<Vec<Bytes>>>;

    async fn accept(State(bodies): State<Bodies>, body: Bytes) -> StatusCode {
        bodies.lock().unwrap().push(body);
        StatusCode::OK
    }

    async fn stalled() -> StatusCode {
        tokio::time::sleep(Duration::from_secs(5)).await;
        StatusCode::OK
    }

    async fn start_receiver() -> (String, Bodies) {
        let bodies: Bodies = Arc::default();
        let app = Router::new()
            .route("/hook", post(accept))
            .route("/stalled", post(stalled))
            .with_state(Arc::clone(&bodies));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://127.0.0.1:{port}"), bodies)
    }

    fn payload() -> LeadPayload {
        LeadPayload {
            name: "Dana".into(),
            project_type: "epoxy".into(),
            city: "Roanoke".into(),
            zip: "24011".into(),
            email: "dana@example.com".into(),
            phone: "5401234567".into(),
            phone_verified: "yes".into(),
            ab_variant: "A".into(),
        }
    }

    #[tokio::test]
    async fn json_hook_posts_payload() {
        let (base, bodies) = start_receiver().await;
        let status = JsonWebhook::new(format!("{base}/hook"))
            .submit(&payload())
            .await
            .unwrap();
        assert_eq!(status, 200);

        let body: serde_json::Value =
            serde_json::from_slice(&bodies.lock().unwrap()[0]).unwrap();
        assert_eq!(body["zip"], "24011");
        assert_eq!(body["phone_verified"], "yes");
    }

    #[tokio::test]
    async fn form_hook_sends_multipart_fields() {
        let (base, bodies) = start_receiver().await;
        FormWebhook::new(format!("{base}/hook"))
            .submit(&payload())
            .await
            .unwrap();

        let body = String::from_utf8_lossy(&bodies.lock().unwrap()[0]).to_string();
        assert!(body.contains("name=\"ab_variant\""));
        assert!(body.contains("Roanoke"));
    }

    #[tokio::test]
    async fn stalled_hook_times_out() {
        let (base, _bodies) = start_receiver().await;
        let sink = FormWebhook::new(format!("{base}/stalled"))
            .with_timeout(Duration::from_millis(100));

        let started = std::time::Instant::now();
        let err = sink.submit(&payload()).await.unwrap_err();
        assert!(started.elapsed() < Duration::from_secs(2));
        assert!(matches!(err, DispatchError::Webhook { ref sink, .. } if sink == "backup"));
    }
}
