//! Blocking HTTP implementation of [`CalculationService`].

use std::time::Duration;

use essence_config::config::EssenceConfig;
use essence_core::model::CalculationRequest;
use essence_core::report::CalculationReport;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::error::{ClientError, Result, extract_detail};
use crate::traits::{CalculationService, HealthStatus};

/// Talks to the dose-calculation service over HTTP/JSON.
#[derive(Debug, Clone)]
pub struct HttpCalculationClient {
    agent: ureq::Agent,
    base_url: String,
}

impl HttpCalculationClient {
    /// Creates a client for `base_url` with a whole-request `timeout`.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(timeout)
            .timeout(timeout)
            .build();
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { agent, base_url }
    }

    /// Creates a client from the `service` section of the configuration.
    pub fn from_config(config: &EssenceConfig) -> Self {
        Self::new(config.service.url.clone(), config.service.timeout())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn read<T: DeserializeOwned>(result: std::result::Result<ureq::Response, ureq::Error>) -> Result<T> {
        match result {
            Ok(response) => response
                .into_json::<T>()
                .map_err(|e| ClientError::MalformedResponse(e.to_string())),
            Err(ureq::Error::Status(status, response)) => {
                let body = response.into_string().unwrap_or_default();
                let detail = extract_detail(&body);
                warn!(status, detail = detail.as_deref().unwrap_or(""), "service rejected request");
                Err(ClientError::Service { status, detail })
            }
            Err(ureq::Error::Transport(transport)) => {
                warn!(error = %transport, "service unreachable");
                Err(ClientError::Transport(transport.to_string()))
            }
        }
    }
}

impl CalculationService for HttpCalculationClient {
    fn calculate(&self, request: &CalculationRequest) -> Result<CalculationReport> {
        request.validate_shape()?;
        let url = self.endpoint("calculate");
        debug!(%url, route = request.application.route.as_str(), "sending calculation request");
        Self::read(
            self.agent
                .post(&url)
                .set("Accept", "application/json")
                .send_json(request),
        )
    }

    fn health(&self) -> Result<HealthStatus> {
        let url = self.endpoint("healthz");
        debug!(%url, "probing service health");
        Self::read(self.agent.get(&url).call())
    }

    fn reference_data(&self) -> Result<serde_json::Value> {
        let url = self.endpoint("reference-data");
        debug!(%url, "fetching reference data");
        Self::read(self.agent.get(&url).call())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use essence_core::enums::{AgeCategory, PhysiologicalState, Route, Sex};
    use essence_core::model::{Application, Constituent, EssentialOil, Individual};
    use pretty_assertions::assert_eq;
    use std::io::{BufRead, BufReader, Read, Write};
    use std::net::TcpListener;
    use std::thread::{self, JoinHandle};

    /// Serves exactly one canned response and returns the raw request.
    fn one_shot(status_line: &str, body: &str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        let response = format!(
            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status_line,
            body.len(),
            body
        );
        let handle = thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream);
            let mut head = String::new();
            let mut content_length = 0usize;
            loop {
                let mut line = String::new();
                reader.read_line(&mut line).unwrap();
                if let Some((name, value)) = line.split_once(':') {
                    if name.eq_ignore_ascii_case("content-length") {
                        content_length = value.trim().parse().unwrap();
                    }
                }
                head.push_str(&line);
                if line == "\r\n" || line.is_empty() {
                    break;
                }
            }
            let mut body = vec![0u8; content_length];
            reader.read_exact(&mut body).unwrap();
            let mut stream = reader.into_inner();
            stream.write_all(response.as_bytes()).unwrap();
            stream.flush().unwrap();
            head + &String::from_utf8(body).unwrap()
        });
        (url, handle)
    }

    fn request() -> CalculationRequest {
        CalculationRequest::for_oil(
            Individual {
                body_weight: 70.0,
                age_category: AgeCategory::Adult,
                sex: Sex::Female,
                physiological_state: PhysiologicalState::Normal,
                pathologies: Default::default(),
                treatments: Default::default(),
            },
            EssentialOil::new("Lavender", vec![Constituent::new("linalool", 0.4)]),
            Application::new(Route::Oral, 20.0, 7),
        )
    }

    #[test]
    fn calculate_posts_json_and_parses_report() {
        let (url, server) = one_shot(
            "200 OK",
            r#"{"dose_recommendation": {"final_dose_mg": 4.2, "limiting_factor": "NOAEL"}, "warnings": ["w"]}"#,
        );
        let client = HttpCalculationClient::new(format!("{}/", url), Duration::from_secs(5));
        let report = client.calculate(&request()).unwrap();
        assert_eq!(report.dose_recommendation.final_dose_mg, 4.2);
        assert_eq!(report.warnings, vec!["w"]);

        let raw = server.join().unwrap();
        assert!(raw.starts_with("POST /calculate HTTP/1.1"), "{}", raw);
        assert!(raw.to_ascii_lowercase().contains("content-type: application/json"));
        assert!(raw.contains(r#""route":"orale""#), "{}", raw);
    }

    #[test]
    fn service_error_carries_detail() {
        let (url, server) = one_shot("400 Bad Request", r#"{"detail": "Formula total is not 100%"}"#);
        let client = HttpCalculationClient::new(url, Duration::from_secs(5));
        let err = client.calculate(&request()).unwrap_err();
        assert_eq!(
            err,
            ClientError::Service {
                status: 400,
                detail: Some("Formula total is not 100%".into())
            }
        );
        server.join().unwrap();
    }

    #[test]
    fn service_error_without_detail_uses_generic_message() {
        let (url, server) = one_shot("500 Internal Server Error", r#"{"oops": true}"#);
        let client = HttpCalculationClient::new(url, Duration::from_secs(5));
        let err = client.calculate(&request()).unwrap_err();
        assert_eq!(err.user_message(), crate::error::GENERIC_SERVICE_MESSAGE);
        server.join().unwrap();
    }

    #[test]
    fn malformed_success_body_is_reported() {
        let (url, server) = one_shot("200 OK", r#"{"unexpected": 1}"#);
        let client = HttpCalculationClient::new(url, Duration::from_secs(5));
        let err = client.calculate(&request()).unwrap_err();
        assert!(matches!(err, ClientError::MalformedResponse(_)));
        server.join().unwrap();
    }

    #[test]
    fn unreachable_service_is_transport_error() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        drop(listener);
        let client = HttpCalculationClient::new(url, Duration::from_secs(2));
        let err = client.calculate(&request()).unwrap_err();
        assert!(err.is_transport(), "{:?}", err);
    }

    #[test]
    fn request_without_product_is_not_sent() {
        let client = HttpCalculationClient::new("http://127.0.0.1:9", Duration::from_secs(1));
        let mut bad = request();
        bad.essential_oil = None;
        assert!(matches!(client.calculate(&bad), Err(ClientError::InvalidRequest(_))));
    }

    #[test]
    fn health_probe() {
        let (url, server) = one_shot("200 OK", r#"{"status": "ok"}"#);
        let client = HttpCalculationClient::new(url, Duration::from_secs(5));
        assert!(client.health().unwrap().is_ok());
        assert!(server.join().unwrap().starts_with("GET /healthz"));
    }

    #[test]
    fn from_config_uses_service_section() {
        let mut config = EssenceConfig::default();
        config.service.url = "http://dose.example:8080/api/".into();
        let client = HttpCalculationClient::from_config(&config);
        assert_eq!(client.base_url(), "http://dose.example:8080/api");
        assert_eq!(client.endpoint("/calculate"), "http://dose.example:8080/api/calculate");
    }
}
