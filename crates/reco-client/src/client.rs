//! HTTP client for the recommendations service.
//!
//! One request per operation, issued against the configured service root
//! with a Basic credential computed once at construction. Responses are
//! decoded through [`Envelope`].

use std::path::Path;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use hyper::ext::ReasonPhrase;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Body, Method, Response};
use tracing::{debug, info};
use url::Url;

use crate::error::{RecoError, Result};
use crate::types::{
    BuildId, BuildParameters, BuildStatus, ImportKind, ImportReport, ModelId, RecommendedItem,
};
use crate::uris::{self, Query, DEFAULT_ROOT_URI};
use crate::xml::{Envelope, DATA_NS};

/// Basic credential for `identity:secret`, without the `Basic ` scheme
pub fn basic_credential(identity: &str, secret: &str) -> String {
    STANDARD.encode(format!("{identity}:{secret}"))
}

/// Client for the hosted recommendations API.
///
/// Holds a single HTTP transport whose default headers carry the
/// credential, so every request sends the same `Authorization` value.
#[derive(Debug, Clone)]
pub struct RecommendationClient {
    http: reqwest::Client,
    base_url: Url,
}

impl RecommendationClient {
    /// Build a client for the hosted service root.
    ///
    /// No network activity happens here.
    pub fn initialize(identity: &str, secret: &str) -> Result<Self> {
        Self::with_base_url(DEFAULT_ROOT_URI, identity, secret)
    }

    /// Build a client for an alternative service root
    pub fn with_base_url(base_url: &str, identity: &str, secret: &str) -> Result<Self> {
        let mut base_url = Url::parse(base_url)
            .map_err(|e| RecoError::parse("service base url", format!("'{base_url}': {e}")))?;
        // join() drops the last path segment unless the root ends with '/'
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let mut authorization =
            HeaderValue::from_str(&format!("Basic {}", basic_credential(identity, secret)))
                .map_err(|e| RecoError::Encode {
                    context: "authorization header".to_string(),
                    reason: e.to_string(),
                })?;
        authorization.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, authorization);

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|source| RecoError::Transport {
                context: "initialize http client".to_string(),
                source,
            })?;

        info!("access key generated for service root {}", base_url);
        Ok(Self { http, base_url })
    }

    /// Service root all request targets are resolved against
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Create a model container and return its id
    pub async fn create_model(&self, model_name: &str) -> Result<ModelId> {
        let context = format!("create model {model_name}");
        let response = self
            .send(Method::POST, uris::create_model(model_name), None, &context)
            .await?;
        let envelope = read_envelope(response, &context).await?;

        let model_id = first_id(&envelope, &context)?;
        info!("Model '{}' created with ID: {}", model_name, model_id);
        Ok(model_id)
    }

    /// Upload a catalog or usage file to a model.
    ///
    /// The file is streamed as the request body; the handle is owned by the
    /// request and closed when it completes or fails.
    pub async fn import_file(
        &self,
        model_id: &str,
        path: &Path,
        kind: ImportKind,
    ) -> Result<ImportReport> {
        let file = tokio::fs::File::open(path)
            .await
            .map_err(|source| RecoError::Io {
                path: path.display().to_string(),
                source,
            })?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        let context = format!(
            "import file {}, for model {}",
            path.display(),
            model_id
        );
        let response = self
            .send(
                Method::POST,
                uris::import_file(kind, model_id, &file_name),
                Some(RequestBody::new(Body::from(file), None)),
                &context,
            )
            .await?;
        let envelope = read_envelope(response, &context).await?;

        let record = envelope
            .first_record()
            .ok_or_else(|| RecoError::parse(&context, "response has no properties record"))?;
        let report = ImportReport::from_record(file_name, record)?;
        info!("{} ({})", report, kind);
        Ok(report)
    }

    /// Trigger a build with the default [`BuildParameters`]
    pub async fn build_model(&self, model_id: &str, description: &str) -> Result<BuildId> {
        self.build_model_with(model_id, description, &BuildParameters::default())
            .await
    }

    /// Trigger a build and return the new build's id.
    ///
    /// Only the id is read back; any echoed parameters are ignored.
    pub async fn build_model_with(
        &self,
        model_id: &str,
        description: &str,
        parameters: &BuildParameters,
    ) -> Result<BuildId> {
        let payload = parameters.to_xml()?;
        let context = format!("start build for model {model_id}");
        let response = self
            .send(
                Method::POST,
                uris::build_model(model_id, description),
                Some(RequestBody::new(Body::from(payload), Some("application/xml"))),
                &context,
            )
            .await?;
        let envelope = read_envelope(response, &context).await?;

        let build_id = first_id(&envelope, &context)?;
        info!("triggered build id '{}'", build_id);
        Ok(build_id)
    }

    /// Current status of one build of a model.
    ///
    /// A missing build entry and a missing or unknown status text are the
    /// same parse error.
    pub async fn get_build_status(&self, model_id: &str, build_id: &str) -> Result<BuildStatus> {
        let context = format!(
            "retrieve build status for model {model_id} and build id {build_id}"
        );
        let response = self
            .send(Method::GET, uris::build_statuses(model_id, false), None, &context)
            .await?;
        let envelope = read_envelope(response, &context).await?;

        let status_text = envelope
            .find_record(|record| record.child_text(DATA_NS, "BuildId").as_deref() == Some(build_id))
            .and_then(|record| record.child_text(DATA_NS, "Status"));

        let status = match status_text {
            Some(text) => text.parse::<BuildStatus>().map_err(|_| {
                RecoError::parse(
                    format!("build status of build {build_id} for model {model_id}"),
                    format!("unknown value '{text}'"),
                )
            })?,
            None => {
                return Err(RecoError::parse(
                    format!("build status of build {build_id} for model {model_id}"),
                    "no status found",
                ))
            }
        };

        debug!("build {} of model {} is {}", build_id, model_id, status);
        Ok(status)
    }

    /// Recommendations for a set of seed items, without item metadata
    pub async fn get_recommendation<S: AsRef<str>>(
        &self,
        model_id: &str,
        item_ids: &[S],
        number_of_results: u32,
    ) -> Result<Vec<RecommendedItem>> {
        self.get_recommendation_with(model_id, item_ids, number_of_results, false)
            .await
    }

    /// Recommendations for a set of seed items, in the order the service
    /// ranked them
    pub async fn get_recommendation_with<S: AsRef<str>>(
        &self,
        model_id: &str,
        item_ids: &[S],
        number_of_results: u32,
        include_metadata: bool,
    ) -> Result<Vec<RecommendedItem>> {
        let joined = item_ids
            .iter()
            .map(AsRef::as_ref)
            .collect::<Vec<_>>()
            .join(",");
        let context = format!(
            "retrieve recommendation for item list {joined} and model {model_id}"
        );
        let response = self
            .send(
                Method::GET,
                uris::item_recommend(model_id, &joined, number_of_results, include_metadata),
                None,
                &context,
            )
            .await?;
        let envelope = read_envelope(response, &context).await?;

        let items: Vec<RecommendedItem> = envelope.parse_records()?;
        debug!("{} recommendations for [{}]", items.len(), joined);
        Ok(items)
    }

    /// Delete a model container
    pub async fn delete_model(&self, model_id: &str) -> Result<()> {
        let context = format!("delete model {model_id}");
        self.send(Method::DELETE, uris::delete_model(model_id), None, &context)
            .await?;
        info!("Model with ID: {} deleted", model_id);
        Ok(())
    }

    /// Issue one request and map non-2xx answers to [`RecoError::Service`]
    async fn send(
        &self,
        method: Method,
        query: Query,
        body: Option<RequestBody>,
        context: &str,
    ) -> Result<Response> {
        let url = self.base_url.join(&query.to_relative()).map_err(|e| RecoError::Encode {
            context: format!("request url for {}", query.operation()),
            reason: e.to_string(),
        })?;
        debug!("{} {}", method, url);

        let mut request = self.http.request(method, url);
        if let Some(body) = body {
            if let Some(content_type) = body.content_type {
                request = request.header(CONTENT_TYPE, content_type);
            }
            request = request.body(body.body);
        }

        let response = request.send().await.map_err(|source| RecoError::Transport {
            context: context.to_string(),
            source,
        })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let detail = error_detail(response).await;
            return Err(RecoError::Service {
                status,
                context: context.to_string(),
                detail,
            });
        }

        Ok(response)
    }
}

struct RequestBody {
    body: Body,
    content_type: Option<&'static str>,
}

impl RequestBody {
    fn new(body: Body, content_type: Option<&'static str>) -> Self {
        Self { body, content_type }
    }
}

/// Phrase from the status line; hyper only keeps it when it differs from
/// the canonical one
fn reason_phrase(response: &Response) -> String {
    match response.extensions().get::<ReasonPhrase>() {
        Some(phrase) => String::from_utf8_lossy(phrase.as_bytes()).into_owned(),
        None => response
            .status()
            .canonical_reason()
            .unwrap_or("")
            .to_string(),
    }
}

/// Reason phrase, followed by `->` and the body when the service sent one
async fn error_detail(response: Response) -> String {
    let reason = reason_phrase(&response);
    match response.text().await {
        Ok(body) if !body.is_empty() => format!("{reason}->{body}"),
        _ => reason,
    }
}

async fn read_envelope(response: Response, context: &str) -> Result<Envelope> {
    let body = response.bytes().await.map_err(|source| RecoError::Transport {
        context: context.to_string(),
        source,
    })?;
    Envelope::parse(&body)
}

/// `d:Id` of the first record that has one
fn first_id(envelope: &Envelope, context: &str) -> Result<String> {
    envelope
        .find_record(|record| record.child(DATA_NS, "Id").is_some())
        .and_then(|record| record.child_text(DATA_NS, "Id"))
        .ok_or_else(|| RecoError::parse(context, "response has no Id element"))
}
