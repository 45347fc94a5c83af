//! KubeStellar plugin for kubectl.
//!
//! Provisions the kcp workspaces, API bindings and inventory entries a
//! KubeStellar deployment is made of, and fetches the kubeconfigs it
//! publishes.
//!
//! # Examples
//!
//! ## Ensuring a Location
//!
//! ```rust,no_run
//! use kubestellar::config::{ClientOptions, KcpConnector};
//! use kubestellar::context::Context;
//! use kubestellar::ensure::EnsureLocation;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let options = ClientOptions::default();
//! let root = options.load(Some("root")).await?;
//! let context = Context::new(KcpConnector::new(root), options);
//!
//! EnsureLocation {
//!     imw: "imw1".to_string(),
//!     name: "edge1".to_string(),
//!     labels: vec!["env=prod".to_string()],
//! }
//! .run(&context)
//! .await?;
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod config;
pub mod context;
pub mod crd;
pub mod ensure;
mod error;
pub mod kubeconfig;
pub mod logging;
pub mod reconcile;
pub mod remove;
pub mod syncer;
pub mod wait;
pub mod workspace;



pub use error::{Error, Result};
