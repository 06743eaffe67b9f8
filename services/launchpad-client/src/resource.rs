//! Resource model
//!
//! Launchpad representations carry no fixed schema, so their shape is
//! sniffed at runtime and turned into one of a closed set of variants:
//!
//! - [`Root`]: the `#service-root` singleton
//! - [`Collection`]: a paginated window of entries
//! - [`Entry`]: an addressable object supporting partial updates
//!
//! Anything else stays a plain JSON value. All three variants share the
//! named-operation capability of [`LaunchpadResource`].

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use tracing::debug;

use crate::client::{LaunchpadClient, RequestConfig};
use crate::error::{LaunchpadError, Result};

/// Suffix of the service root's `resource_type_link`
pub const SERVICE_ROOT: &str = "#service-root";

/// Shape of a representation, decided from its marker fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    Null,
    Root,
    Collection,
    Entry,
    /// Array or object that is not itself a resource
    Container,
    Plain,
}

/// Classify a representation.
///
/// Representations without `resource_type_link` are collections when they
/// carry `total_size` or `total_size_link`, since named operations may
/// return bare list-shaped results.
pub fn classify(representation: &Value) -> Shape {
    if representation.is_null() {
        return Shape::Null;
    }

    match representation.get("resource_type_link") {
        None => {
            if representation.get("total_size").is_some()
                || representation.get("total_size_link").is_some()
            {
                Shape::Collection
            } else if representation.is_array() || representation.is_object() {
                Shape::Container
            } else {
                Shape::Plain
            }
        }
        Some(link) => {
            if link.as_str().is_some_and(|l| l.ends_with(SERVICE_ROOT)) {
                Shape::Root
            } else if representation.get("total_size").is_none() {
                Shape::Entry
            } else {
                Shape::Collection
            }
        }
    }
}

/// Operations every wrapped resource supports, scoped to its own URI
#[async_trait]
pub trait LaunchpadResource: Send + Sync {
    fn client(&self) -> &LaunchpadClient;

    fn uri(&self) -> &str;

    /// URI held in the `<name>_link` field, if any
    fn link(&self, name: &str) -> Option<&str>;

    async fn named_get(&self, operation: &str, config: RequestConfig) -> Result<Resource> {
        self.client().named_get(self.uri(), operation, config).await
    }

    async fn named_post(&self, operation: &str, config: RequestConfig) -> Result<Resource> {
        self.client().named_post(self.uri(), operation, config).await
    }

    /// GET the resource behind `<name>_link`
    async fn follow_link(&self, name: &str) -> Result<Resource> {
        let link = self
            .link(name)
            .ok_or_else(|| LaunchpadError::MissingLink {
                uri: self.uri().to_string(),
                name: name.to_string(),
            })?
            .to_string();
        self.client().get(&link, RequestConfig::default()).await
    }
}

fn into_attributes(representation: Value) -> Map<String, Value> {
    match representation {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

fn link_in<'a>(attributes: &'a Map<String, Value>, name: &str) -> Option<&'a str> {
    attributes
        .get(&format!("{}_link", name))
        .and_then(Value::as_str)
}

/// A single addressable object.
///
/// Attributes live in a generic map; every `set` that changes a value
/// records the key as dirty so `lp_save` sends only what changed.
#[derive(Debug, Clone)]
pub struct Entry {
    client: LaunchpadClient,
    uri: String,
    attributes: Map<String, Value>,
    dirty_attributes: Vec<String>,
}

impl Entry {
    pub fn new(client: LaunchpadClient, uri: impl Into<String>, representation: Value) -> Self {
        Self {
            client,
            uri: uri.into(),
            attributes: into_attributes(representation),
            dirty_attributes: Vec::new(),
        }
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Value::as_str)
    }

    /// Update an attribute, marking it dirty when the value changes
    pub fn set(&mut self, name: &str, value: impl Into<Value>) {
        let value = value.into();
        if self.attributes.get(name) == Some(&value) {
            return;
        }
        if !self.dirty_attributes.iter().any(|k| k == name) {
            self.dirty_attributes.push(name.to_string());
        }
        self.attributes.insert(name.to_string(), value);
    }

    pub fn attributes(&self) -> &Map<String, Value> {
        &self.attributes
    }

    /// Keys changed since construction or the last successful save
    pub fn dirty_attributes(&self) -> &[String] {
        &self.dirty_attributes
    }

    pub fn is_dirty(&self) -> bool {
        !self.dirty_attributes.is_empty()
    }

    pub fn self_link(&self) -> Option<&str> {
        self.get_str("self_link")
    }

    pub fn http_etag(&self) -> Option<&str> {
        self.get_str("http_etag")
    }

    pub fn resource_type_link(&self) -> Option<&str> {
        self.get_str("resource_type_link")
    }

    /// Push dirty attributes back with a PATCH.
    ///
    /// `config` is applied to the PATCH request. Sends `If-Match` when the
    /// entry carries an etag. Dirty keys are cleared only once the server
    /// accepts the update.
    pub async fn lp_save(&mut self, mut config: RequestConfig) -> Result<Resource> {
        let changes: Map<String, Value> = self
            .dirty_attributes
            .iter()
            .filter_map(|k| self.attributes.get(k).map(|v| (k.clone(), v.clone())))
            .collect();

        if let Some(etag) = self.http_etag() {
            config.headers.retain(|(name, _)| !name.eq_ignore_ascii_case("if-match"));
            config = config.header("If-Match", etag);
        }

        let target = self.self_link().unwrap_or(self.uri.as_str()).to_string();
        debug!(uri = %target, fields = ?self.dirty_attributes, "Saving entry");

        let response = self.client.patch(&target, &changes, config).await?;
        self.dirty_attributes.clear();
        Ok(response)
    }

    pub fn to_json(&self) -> Value {
        Value::Object(self.attributes.clone())
    }
}

#[async_trait]
impl LaunchpadResource for Entry {
    fn client(&self) -> &LaunchpadClient {
        &self.client
    }

    fn uri(&self) -> &str {
        &self.uri
    }

    fn link(&self, name: &str) -> Option<&str> {
        link_in(&self.attributes, name)
    }
}

/// A window onto a paginated collection.
///
/// Never changes once built; slicing and paging return new collections.
#[derive(Debug, Clone)]
pub struct Collection {
    client: LaunchpadClient,
    uri: String,
    attributes: Map<String, Value>,
    entries: Vec<Entry>,
}

impl Collection {
    pub fn new(client: LaunchpadClient, uri: impl Into<String>, representation: Value) -> Self {
        let uri = uri.into();
        let mut attributes = into_attributes(representation);

        let entries = match attributes.remove("entries") {
            Some(Value::Array(items)) => items
                .into_iter()
                .map(|item| {
                    let entry_uri = item
                        .get("self_link")
                        .and_then(Value::as_str)
                        .unwrap_or(uri.as_str())
                        .to_string();
                    Entry::new(client.clone(), entry_uri, item)
                })
                .collect(),
            _ => Vec::new(),
        };

        Self {
            client,
            uri,
            attributes,
            entries,
        }
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// Size of the whole collection, when the server computed it
    pub fn total_size(&self) -> Option<u64> {
        self.attributes.get("total_size").and_then(Value::as_u64)
    }

    pub fn start(&self) -> Option<u64> {
        self.attributes.get("start").and_then(Value::as_u64)
    }

    pub fn total_size_link(&self) -> Option<&str> {
        link_in(&self.attributes, "total_size")
    }

    pub fn next_collection_link(&self) -> Option<&str> {
        link_in(&self.attributes, "next_collection")
    }

    pub fn prev_collection_link(&self) -> Option<&str> {
        link_in(&self.attributes, "prev_collection")
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<Entry> {
        self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Fetch `size` entries starting at `start` as a new collection
    pub async fn lp_slice(&self, start: u64, size: u64) -> Result<Collection> {
        let resource = self
            .client
            .get(&self.uri, RequestConfig::new().start(start).size(size))
            .await?;
        expect_collection(resource, &self.uri)
    }

    /// The following page, `None` on the last one
    pub async fn lp_next(&self) -> Result<Option<Collection>> {
        self.fetch_page(self.next_collection_link()).await
    }

    /// The preceding page, `None` on the first one
    pub async fn lp_prev(&self) -> Result<Option<Collection>> {
        self.fetch_page(self.prev_collection_link()).await
    }

    async fn fetch_page(&self, link: Option<&str>) -> Result<Option<Collection>> {
        let Some(link) = link else {
            return Ok(None);
        };
        let resource = self.client.get(link, RequestConfig::default()).await?;
        expect_collection(resource, link).map(Some)
    }

    /// `total_size`, fetched from `total_size_link` when the server deferred it
    pub async fn lp_total_size(&self) -> Result<u64> {
        if let Some(total) = self.total_size() {
            return Ok(total);
        }

        let link = self
            .total_size_link()
            .ok_or_else(|| LaunchpadError::MissingLink {
                uri: self.uri.clone(),
                name: "total_size".to_string(),
            })?;

        let total: Option<u64> = match self.client.get(link, RequestConfig::default()).await? {
            Resource::Plain(value) => value.as_u64(),
            Resource::Text(text) => text.trim().parse().ok(),
            _ => None,
        };
        total.ok_or_else(|| LaunchpadError::UnexpectedShape {
            uri: link.to_string(),
            expected: "collection size",
        })
    }

    pub fn to_json(&self) -> Value {
        let mut map = self.attributes.clone();
        map.insert(
            "entries".to_string(),
            Value::Array(self.entries.iter().map(Entry::to_json).collect()),
        );
        Value::Object(map)
    }
}

fn expect_collection(resource: Resource, uri: &str) -> Result<Collection> {
    resource
        .into_collection()
        .ok_or_else(|| LaunchpadError::UnexpectedShape {
            uri: uri.to_string(),
            expected: "collection",
        })
}

#[async_trait]
impl LaunchpadResource for Collection {
    fn client(&self) -> &LaunchpadClient {
        &self.client
    }

    fn uri(&self) -> &str {
        &self.uri
    }

    fn link(&self, name: &str) -> Option<&str> {
        link_in(&self.attributes, name)
    }
}

/// The service root
#[derive(Debug, Clone)]
pub struct Root {
    client: LaunchpadClient,
    uri: String,
    attributes: Map<String, Value>,
}

impl Root {
    pub fn new(client: LaunchpadClient, uri: impl Into<String>, representation: Value) -> Self {
        Self {
            client,
            uri: uri.into(),
            attributes: into_attributes(representation),
        }
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    pub fn attributes(&self) -> &Map<String, Value> {
        &self.attributes
    }

    pub fn to_json(&self) -> Value {
        Value::Object(self.attributes.clone())
    }
}

#[async_trait]
impl LaunchpadResource for Root {
    fn client(&self) -> &LaunchpadClient {
        &self.client
    }

    fn uri(&self) -> &str {
        &self.uri
    }

    fn link(&self, name: &str) -> Option<&str> {
        link_in(&self.attributes, name)
    }
}

/// Anything a response can be wrapped into
#[derive(Debug, Clone)]
pub enum Resource {
    Root(Root),
    Collection(Collection),
    Entry(Entry),
    /// Bare array, elements with a `self_link` wrapped
    Array(Vec<Resource>),
    /// Bare object, values with a `self_link` wrapped
    Object(BTreeMap<String, Resource>),
    Plain(Value),
    /// Body of a non-JSON response
    Text(String),
}

impl Resource {
    pub fn uri(&self) -> Option<&str> {
        match self {
            Resource::Root(r) => Some(r.uri()),
            Resource::Collection(c) => Some(c.uri()),
            Resource::Entry(e) => Some(e.uri()),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Resource::Plain(Value::Null))
    }

    pub fn as_entry(&self) -> Option<&Entry> {
        match self {
            Resource::Entry(e) => Some(e),
            _ => None,
        }
    }

    pub fn into_entry(self) -> Option<Entry> {
        match self {
            Resource::Entry(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_collection(&self) -> Option<&Collection> {
        match self {
            Resource::Collection(c) => Some(c),
            _ => None,
        }
    }

    pub fn into_collection(self) -> Option<Collection> {
        match self {
            Resource::Collection(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_root(&self) -> Option<&Root> {
        match self {
            Resource::Root(r) => Some(r),
            _ => None,
        }
    }

    /// Plain JSON view of the resource
    pub fn to_json(&self) -> Value {
        match self {
            Resource::Root(r) => r.to_json(),
            Resource::Collection(c) => c.to_json(),
            Resource::Entry(e) => e.to_json(),
            Resource::Array(items) => Value::Array(items.iter().map(Resource::to_json).collect()),
            Resource::Object(map) => Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
            Resource::Plain(value) => value.clone(),
            Resource::Text(text) => Value::String(text.clone()),
        }
    }
}

impl Serialize for Resource {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}
