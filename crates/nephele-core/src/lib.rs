//! # nephele-core
//!
//! Shared engine for the `nephele` CLI: configuration, filter translation,
//! and thin service wrappers over the AWS SDK.
//!
//! ## Layers
//!
//! - **Config** - named profiles stored as TOML, with env expansion and
//!   optional keyring-backed secrets ([`config`])
//! - **Filters** - short user filter keys (`name=web`) translated into EC2
//!   filter names with case-variant wildcard values ([`filter`])
//! - **Services** - one wrapper per service area, generic over an async API
//!   trait so the reshaping logic can be tested without AWS
//!   ([`compute`], [`functions`], [`database`], [`storage`])
//! - **AWS adapters** - the trait implementations backed by the real SDK
//!   clients ([`aws`])
//!
//! ## Example
//!
//! ```rust,ignore
//! use nephele_core::aws::{ConnectionSettings, Ec2Backend};
//! use nephele_core::{ComputeService, FilterSet};
//!
//! let sdk_config = ConnectionSettings::default().region("eu-west-1").load().await;
//! let compute = ComputeService::new(Ec2Backend::new(&sdk_config));
//! let filters = FilterSet::from_args(&["state=running".to_string()])?;
//! let instances = compute.list_instances(&filters).await?;
//! ```

pub mod aws;
pub mod compute;
pub mod config;
pub mod database;
pub mod error;
pub mod filter;
pub mod functions;
pub mod storage;

pub use compute::{ComputeApi, ComputeService, InstanceSummary, StateChange};
pub use config::{Config, ConfigError, Profile, ResilienceConfig};
pub use database::{DatabaseApi, DatabaseService, DbInstancePage, DbInstanceSummary};
pub use error::{CoreError, Result, Service};
pub use filter::{Filter, FilterError, FilterSet};
pub use functions::{FunctionPage, FunctionSummary, FunctionsApi, FunctionsService, InvocationResult};
pub use storage::{
    BucketSummary, ListObjectsOptions, ObjectPage, ObjectSummary, StorageApi, StorageService,
};
