//! Launchpad Web Service Client
//!
//! Hypermedia client for Launchpad's `webservice` API. Responses are
//! wrapped into lazily traversable resources that know their own URI and
//! can invoke named operations, page through collections and save
//! partial updates.
//!
//! ## Example
//!
//! ```no_run
//! use launchpad_client::{LaunchpadClient, LaunchpadConfig, LaunchpadResource, RequestConfig};
//!
//! # async fn run() -> launchpad_client::Result<()> {
//! let client = LaunchpadClient::new(LaunchpadConfig::from_env()?)?;
//!
//! let person = client
//!     .named_get(
//!         "/people",
//!         "getByEmail",
//!         RequestConfig::new().parameter("email", "foo@example.com"),
//!     )
//!     .await?;
//!
//! if let Some(mut person) = person.into_entry() {
//!     person.set("display_name", "Foo");
//!     person.lp_save(RequestConfig::new()).await?;
//!     let snaps = person.follow_link("snaps_collection").await?;
//!     println!("{}", snaps.to_json());
//! }
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod resource;
pub mod transport;
pub mod uri;

pub use auth::Credentials;
pub use client::{LaunchpadClient, RequestConfig};
pub use config::LaunchpadConfig;
pub use error::{LaunchpadError, ResourceError, Result};
pub use resource::{classify, Collection, Entry, LaunchpadResource, Resource, Root, Shape};
pub use transport::{HttpRequest, HttpResponse, ReqwestTransport, Transport};
pub use uri::normalize;
