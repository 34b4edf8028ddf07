use log::{debug, error};
use reqwest::blocking::Client;
use reqwest::header::CONNECTION;
use reqwest::StatusCode;

use super::{DaemonApi, DaemonConfig, DaemonError, DaemonRequest, ADD_PATH, DEL_PATH};
use crate::error::{KuryrError, KuryrResult, ERR_INVALID_NETWORK_CONFIG};

/// Blocking HTTP client for kuryr-daemon. Every call is a single attempt.
pub struct DaemonClient {
    config: DaemonConfig,
    http: Client,
}

impl DaemonClient {
    pub fn new(config: DaemonConfig) -> KuryrResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| {
                KuryrError::code(
                    ERR_INVALID_NETWORK_CONFIG,
                    format!("failed to create kuryr-daemon client: {}", e),
                )
            })?;
        Ok(DaemonClient { config, http })
    }

    /// POST the request to `path` and return the response body if the
    /// daemon answered with `expected`.
    fn post(
        &self,
        path: &str,
        request: &DaemonRequest,
        expected: StatusCode,
    ) -> KuryrResult<Vec<u8>> {
        let url = self.config.endpoint(path);
        debug!("calling kuryr-daemon: POST {}", url);

        let response = self
            .http
            .post(&url)
            .header(CONNECTION, "close")
            .json(request)
            .send()
            .map_err(|e| transport_error(&url, e))?;

        let status = response.status();
        let body = response
            .bytes()
            .map_err(|e| transport_error(&url, e))?
            .to_vec();
        debug!("kuryr-daemon returned {} ({} bytes)", status, body.len());

        if status != expected {
            error!("kuryr-daemon returned error {} for {}", status, url);
            return Err(KuryrError::Daemon {
                url,
                status: status.as_u16(),
                error: DaemonError::from_body(&body),
            });
        }
        Ok(body)
    }
}

fn transport_error(url: &str, source: reqwest::Error) -> KuryrError {
    if source.is_builder() {
        return KuryrError::code(
            ERR_INVALID_NETWORK_CONFIG,
            format!("invalid kuryr-daemon url {:?}: {}", url, source),
        );
    }
    error!("looks like {} cannot be reached: {}", url, source);
    KuryrError::Transport {
        url: url.to_string(),
        source,
    }
}

impl DaemonApi for DaemonClient {
    fn add_network(&self, request: &DaemonRequest) -> KuryrResult<Vec<u8>> {
        self.post(ADD_PATH, request, StatusCode::ACCEPTED)
    }

    fn del_network(&self, request: &DaemonRequest) -> KuryrResult<()> {
        // The body is never looked at, delNetwork answers without one.
        self.post(DEL_PATH, request, StatusCode::NO_CONTENT)?;
        Ok(())
    }
}
