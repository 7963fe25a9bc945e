use std::time::Duration;

use backoff::future::retry_notify;
use backoff::Error as BackoffError;
use backoff::ExponentialBackoff;
use reqwest::{Client, StatusCode};

use super::FetchError;

/// Settings shared by every adapter's outbound requests.
#[derive(Debug, Clone)]
pub struct HttpSettings {
    pub request_timeout: Duration,
    pub retry_max_elapsed: Duration,
    pub user_agent: String,
}

pub fn build_client(settings: &HttpSettings) -> Result<Client, reqwest::Error> {
    Client::builder()
        .timeout(settings.request_timeout)
        .user_agent(settings.user_agent.clone())
        .build()
}

fn retry_notify_handler<E>(err: E, duration: Duration)
where
    E: std::fmt::Display,
{
    tracing::warn!(
        "Request failed: {}. Retrying in {:.1}s...",
        err,
        duration.as_secs_f32()
    );
}

/// GET `url` and return the body. 429, 5xx and connection-level failures are
/// retried with exponential backoff until `retry_max_elapsed` runs out.
#[tracing::instrument(skip(client), fields(url = %url))]
pub async fn fetch_text(client: &Client, url: &str, retry_max_elapsed: Duration) -> Result<String, FetchError> {
    let backoff = ExponentialBackoff {
        max_elapsed_time: Some(retry_max_elapsed),
        ..ExponentialBackoff::default()
    };

    let response = retry_notify(
        backoff,
        || async {
            match client.get(url).send().await {
                Ok(resp) => {
                    let status = resp.status();
                    if status.is_success() {
                        Ok(resp)
                    } else if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
                        tracing::debug!("Retrying on status: {}", status);
                        Err(BackoffError::transient(FetchError::Status {
                            url: url.to_string(),
                            status: status.as_u16(),
                        }))
                    } else {
                        Err(BackoffError::permanent(FetchError::Status {
                            url: url.to_string(),
                            status: status.as_u16(),
                        }))
                    }
                }
                Err(err) => {
                    let fetch_err = FetchError::Network {
                        url: url.to_string(),
                        message: err.to_string(),
                    };
                    if err.is_timeout() || err.is_connect() || err.is_request() {
                        Err(BackoffError::transient(fetch_err))
                    } else {
                        Err(BackoffError::permanent(fetch_err))
                    }
                }
            }
        },
        retry_notify_handler,
    )
    .await?;

    response.text().await.map_err(|e| FetchError::Network {
        url: url.to_string(),
        message: e.to_string(),
    })
}
