//! Launchpad web service client
//!
//! Performs GET, named GET, named POST and PATCH against the service and
//! wraps every successful response into the resource model.
//!
//! ## Conventions
//!
//! - Named operations travel as `ws.op`, in the query string for reads and
//!   in a form-encoded body for writes
//! - Pagination windows are `ws.start` / `ws.size`
//! - Partial updates are a JSON POST with `X-HTTP-Method-Override: PATCH`
//! - Any non-2xx status is returned as a [`ResourceError`], never retried

use std::collections::BTreeMap;
use std::sync::Arc;

use reqwest::{Method, StatusCode};
use serde_json::{Map, Value};
use tracing::{debug, info, warn};
use url::form_urlencoded;

use crate::config::LaunchpadConfig;
use crate::error::{ResourceError, Result};
use crate::resource::{classify, Collection, Entry, Resource, Root, Shape};
use crate::transport::{HttpRequest, HttpResponse, ReqwestTransport, Transport};
use crate::uri::{normalize, with_query};

const JSON: &str = "application/json";
const FORM: &str = "application/x-www-form-urlencoded";

/// Per-request options
#[derive(Debug, Clone, Default)]
pub struct RequestConfig {
    /// First item of a collection window (`ws.start`)
    pub start: Option<u64>,
    /// Window length (`ws.size`)
    pub size: Option<u64>,
    /// Operation parameters; strings are sent verbatim, arrays as repeated
    /// keys, everything else JSON-encoded
    pub parameters: Vec<(String, Value)>,
    /// `Accept` header, `application/json` when unset
    pub accept: Option<String>,
    /// Extra request headers
    pub headers: Vec<(String, String)>,
}

impl RequestConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(mut self, start: u64) -> Self {
        self.start = Some(start);
        self
    }

    pub fn size(mut self, size: u64) -> Self {
        self.size = Some(size);
        self
    }

    pub fn parameter(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.parameters.push((name.into(), value.into()));
        self
    }

    pub fn accept(mut self, accept: impl Into<String>) -> Self {
        self.accept = Some(accept.into());
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    fn query_parameters(&self) -> Vec<(String, String)> {
        let mut query = Vec::new();
        if let Some(start) = self.start {
            query.push(("ws.start".to_string(), start.to_string()));
        }
        if let Some(size) = self.size {
            query.push(("ws.size".to_string(), size.to_string()));
        }
        query.extend(encode_parameters(&self.parameters));
        query
    }
}

fn encode_parameters(parameters: &[(String, Value)]) -> Vec<(String, String)> {
    let mut encoded = Vec::new();
    for (name, value) in parameters {
        match value {
            Value::Array(items) => {
                for item in items {
                    encoded.push((name.clone(), encode_value(item)));
                }
            }
            other => encoded.push((name.clone(), encode_value(other))),
        }
    }
    encoded
}

fn encode_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Client for the Launchpad web service.
///
/// Cheap to clone: configuration and transport are shared behind `Arc`.
/// Every wrapped resource keeps a clone so it can issue its own requests.
#[derive(Clone)]
pub struct LaunchpadClient {
    config: Arc<LaunchpadConfig>,
    transport: Arc<dyn Transport>,
}

impl std::fmt::Debug for LaunchpadClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LaunchpadClient")
            .field("base_uri", &self.config.base_uri.as_str())
            .field("authenticated", &self.config.credentials.is_some())
            .finish()
    }
}

impl LaunchpadClient {
    /// Create a client that talks HTTP through reqwest
    pub fn new(config: LaunchpadConfig) -> Result<Self> {
        let transport = ReqwestTransport::new()?;
        Ok(Self::with_transport(config, Arc::new(transport)))
    }

    pub fn with_transport(config: LaunchpadConfig, transport: Arc<dyn Transport>) -> Self {
        info!(
            base_uri = %config.base_uri,
            authenticated = config.credentials.is_some(),
            "Launchpad client initialized"
        );

        Self {
            config: Arc::new(config),
            transport,
        }
    }

    /// Create a client configured from `LP_API_*` environment variables
    pub fn from_env() -> Result<Self> {
        Self::new(LaunchpadConfig::from_env()?)
    }

    pub fn config(&self) -> &LaunchpadConfig {
        &self.config
    }

    /// Fully-qualified URI for `uri` under this client's API root
    pub fn normalize_uri(&self, uri: &str) -> String {
        normalize(&self.config.base_uri, uri)
    }

    /// Fetch the service root
    pub async fn root(&self) -> Result<Resource> {
        self.get("/", RequestConfig::default()).await
    }

    /// GET a resource
    pub async fn get(&self, uri: &str, config: RequestConfig) -> Result<Resource> {
        let uri = self.normalize_uri(uri);
        let url = with_query(&uri, &config.query_parameters())?;

        let request = self.request(Method::GET, &url, &config);
        let response = self.send(&uri, Method::GET, request).await?;

        self.wrap_resource_on_success(response, &url, &Method::GET)
    }

    /// Invoke a named read-only operation (`ws.op` in the query string)
    pub async fn named_get(
        &self,
        uri: &str,
        operation: &str,
        mut config: RequestConfig,
    ) -> Result<Resource> {
        config
            .parameters
            .insert(0, ("ws.op".to_string(), Value::String(operation.to_string())));
        self.get(uri, config).await
    }

    /// Invoke a named write operation (`ws.op` in a form-encoded body).
    ///
    /// A `201 Created` answer means the operation made a new object; the
    /// object at `Location` is fetched and returned instead of the body.
    pub async fn named_post(
        &self,
        uri: &str,
        operation: &str,
        config: RequestConfig,
    ) -> Result<Resource> {
        let uri = self.normalize_uri(uri);

        let mut fields = vec![("ws.op".to_string(), operation.to_string())];
        fields.extend(encode_parameters(&config.parameters));
        let body = form_urlencoded::Serializer::new(String::new())
            .extend_pairs(fields.iter())
            .finish();

        let request = self
            .request(Method::POST, &uri, &config)
            .header("Content-Type", FORM)
            .body(body);
        let response = self.send(&uri, Method::POST, request).await?;

        if response.status == StatusCode::CREATED {
            if let Some(location) = response.header("location").map(str::to_string) {
                info!(operation, location = %location, "Named operation created object");
                return self.get(&location, RequestConfig::default()).await;
            }
        }

        self.wrap_resource_on_success(response, &uri, &Method::POST)
    }

    /// Send a partial update as a method-overridden POST
    pub async fn patch(
        &self,
        uri: &str,
        representation: &Map<String, Value>,
        config: RequestConfig,
    ) -> Result<Resource> {
        let uri = self.normalize_uri(uri);
        let body = serde_json::to_string(representation)?;

        let request = self
            .request(Method::POST, &uri, &config)
            .header("Content-Type", JSON)
            .header("X-HTTP-Method-Override", "PATCH")
            .header("X-Content-Type-Override", JSON)
            .body(body);
        let response = self.send(&uri, Method::PATCH, request).await?;

        self.wrap_resource_on_success(response, &uri, &Method::PATCH)
    }

    fn request(&self, method: Method, url: &str, config: &RequestConfig) -> HttpRequest {
        let accept = config.accept.as_deref().unwrap_or(JSON);
        let mut request = HttpRequest::new(method, url).header("Accept", accept);

        if let Some(credentials) = &self.config.credentials {
            request = request.header(
                "Authorization",
                credentials.authorization_header(&self.config.realm()),
            );
        }
        for (name, value) in &config.headers {
            request = request.header(name.clone(), value.clone());
        }
        request
    }

    /// Send and turn non-2xx answers into a [`ResourceError`]
    async fn send(&self, uri: &str, method: Method, request: HttpRequest) -> Result<HttpResponse> {
        debug!(method = %method, url = %request.url, "Sending Launchpad request");

        let response = self.transport.send(request).await?;

        if !response.status.is_success() {
            warn!(
                method = %method,
                uri = %uri,
                status = %response.status,
                "Launchpad request failed"
            );
            return Err(ResourceError {
                response,
                uri: uri.to_string(),
                method,
            }
            .into());
        }

        Ok(response)
    }

    /// Wrap a successful response body.
    ///
    /// Non-JSON bodies are returned as text. A JSON object's own
    /// `self_link` replaces `uri`, except on PATCH.
    pub fn wrap_resource_on_success(
        &self,
        response: HttpResponse,
        uri: &str,
        method: &Method,
    ) -> Result<Resource> {
        let is_json = response
            .content_type()
            .is_some_and(|media| media.eq_ignore_ascii_case(JSON));
        if !is_json {
            return Ok(Resource::Text(response.body));
        }

        let representation: Value = if response.body.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&response.body)?
        };

        let uri = match representation.get("self_link").and_then(Value::as_str) {
            Some(self_link) if *method != Method::PATCH => self_link.to_string(),
            _ => uri.to_string(),
        };

        Ok(self.wrap_resource(&uri, representation))
    }

    /// Wrap a representation into the matching resource variant
    pub fn wrap_resource(&self, uri: &str, representation: Value) -> Resource {
        match classify(&representation) {
            Shape::Root => Resource::Root(Root::new(self.clone(), uri, representation)),
            Shape::Collection => {
                Resource::Collection(Collection::new(self.clone(), uri, representation))
            }
            Shape::Entry => Resource::Entry(Entry::new(self.clone(), uri, representation)),
            Shape::Container => match representation {
                Value::Array(items) => {
                    Resource::Array(items.into_iter().map(|v| self.wrap_nested(v)).collect())
                }
                Value::Object(map) => Resource::Object(
                    map.into_iter()
                        .map(|(k, v)| (k, self.wrap_nested(v)))
                        .collect::<BTreeMap<_, _>>(),
                ),
                other => Resource::Plain(other),
            },
            Shape::Null | Shape::Plain => Resource::Plain(representation),
        }
    }

    fn wrap_nested(&self, value: Value) -> Resource {
        let self_link = value
            .get("self_link")
            .and_then(Value::as_str)
            .map(str::to_string);
        match self_link {
            Some(self_link) => self.wrap_resource(&self_link, value),
            None => Resource::Plain(value),
        }
    }
}
