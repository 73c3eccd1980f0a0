//! Layer orchestration: turn an ArcGIS WebMap into MapLibre layer configs.
//!
//! The pure conversion lives in `style-converter`; this crate adds the parts
//! that need I/O or configuration:
//!
//! - [`client`]: WebMap and feature service metadata over HTTP
//! - [`config`]: deny-list, override list, converter options, style overrides
//! - [`transform`]: the per-layer pipeline and final sort
//! - [`cache`]: memoized results per WebMap id
//! - [`service`]: the above wired together

pub mod cache;
pub mod client;
pub mod config;
pub mod naming;
pub mod service;
pub mod transform;

pub use cache::{CachedLayers, LayerConfigCache, LayerConfigCacheStats};
pub use client::{ArcGisClient, ServiceMetadataSource, WebMapSource};
pub use config::{ConverterConfig, StyleOverride, CONFIG_ENV_VAR};
pub use naming::{display_title, layer_slug, sort_layer_configs};
pub use service::LayerConfigService;
pub use transform::{build_layer_config, transform_embedded, ResolvedStyle, WebMapTransformer};
