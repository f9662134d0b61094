//! reqwest implementation of [`FaceService`].

use crate::config::Config;
use idsnap_core::service::{decode_recognition, FaceService, NewPerson, RecognitionReply, ServiceError};
use idsnap_core::types::MediaAsset;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};

/// Multipart field carrying the probe image for `/recognize`.
const RECOGNIZE_FIELD: &str = "file";

/// User-Agent sent with every request: `idsnap/{version}`.
pub fn user_agent() -> String {
    format!("idsnap/{}", env!("CARGO_PKG_VERSION"))
}

/// Talks to the recognition service over HTTP.
#[derive(Debug, Clone)]
pub struct HttpFaceService {
    client: Client,
    recognize_url: String,
    add_user_url: String,
}

impl HttpFaceService {
    pub fn new(config: &Config) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .user_agent(user_agent())
            .timeout(config.request_timeout())
            .build()?;
        Ok(Self::with_client(client, config))
    }

    /// Use a preconfigured client (custom TLS roots, proxies, ...).
    pub fn with_client(client: Client, config: &Config) -> Self {
        Self {
            client,
            recognize_url: config.recognize_url(),
            add_user_url: config.add_user_url(),
        }
    }

    async fn post(&self, url: &str, form: Form) -> Result<Response, ServiceError> {
        let response = self
            .client
            .post(url)
            .multipart(form)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(ServiceError::Server {
                status: status.as_u16(),
            });
        }
        Ok(response)
    }
}

impl FaceService for HttpFaceService {
    async fn recognize(&self, image: &MediaAsset) -> Result<RecognitionReply, ServiceError> {
        tracing::debug!(url = %self.recognize_url, file = %image.name, "POST recognize");
        let form = Form::new().part(RECOGNIZE_FIELD, file_part(image));
        let response = self.post(&self.recognize_url, form).await?;
        let body = response.bytes().await.map_err(transport_error)?;
        decode_recognition(&body)
    }

    async fn enroll(&self, person: &NewPerson) -> Result<(), ServiceError> {
        tracing::debug!(url = %self.add_user_url, name = %person.name, "POST add_user");
        let form = Form::new()
            .text("name", person.name.clone())
            .text("info", person.info.clone())
            .part("image", file_part(&person.image));
        // Any 2xx is success; the body carries nothing we need.
        self.post(&self.add_user_url, form).await.map(drop)
    }
}

fn file_part(asset: &MediaAsset) -> Part {
    let part = || Part::bytes(asset.bytes.clone()).file_name(asset.name.clone());
    part().mime_str(&asset.mime).unwrap_or_else(|e| {
        tracing::debug!(mime = %asset.mime, error = %e, "invalid MIME type, sending without one");
        part()
    })
}

fn transport_error(err: reqwest::Error) -> ServiceError {
    if err.is_timeout() {
        ServiceError::Timeout
    } else {
        ServiceError::Network(err.to_string())
    }
}
