//! tabhost - runtime host core for tabbed multi-runtime shells
//!
//! Turns declarative tab records into live views backed by four kinds of
//! runtime: native widget trees, module views on one shared script bridge,
//! engines inside one shared engine group, and web content pages served
//! from a bundled `local://` namespace.
//!
//! # Flow
//!
//! ```text
//! tab_config.json ─► compose_tabs ─► RuntimeContext::dispatch ─┬─► NativeViewFactory
//!                                                              ├─► ScriptBridgePool
//!                                                              ├─► EngineGroupPool
//!                                                              └─► WebTab + ResourceResolver
//! ```
//!
//! # Example
//!
//! ```ignore
//! let mut ctx = RuntimeContext::builder(BuildMode::Debug)
//!     .assets(DirectoryAssets::new("Web"))
//!     .build();
//! ctx.startup();
//!
//! let mut host = TabHost::compose(&mut ctx, &default_tabs());
//! let _sub = host.on_select(|event| println!("{}", event.title));
//! host.select(3);
//!
//! ctx.shutdown();
//! ```

pub mod composer;
pub mod context;
pub mod descriptor;
pub mod dispatcher;
pub mod handlers;
pub mod headless;
pub mod native;
pub mod resolver;
pub mod scheme;
pub mod view;
pub mod web;

pub use composer::{TabHost, TabSelected, compose_descriptors, compose_tabs};
pub use context::{DEFAULT_ENGINE_GROUP_NAME, PoolStatus, RuntimeContext, RuntimeContextBuilder, StartupReport};
pub use descriptor::{IntoDescriptor, PLACEHOLDER_ICON, TabDescriptor, TabRuntime};
pub use dispatcher::engine_identifier;
pub use handlers::Subscription;
pub use native::{NativeView, NativeViewFactory};
pub use resolver::{
	AssetSource, DEFAULT_DEV_ADDRESS, DEFAULT_INDEX_DOCUMENT, DirectoryAssets, LOCAL_SCHEME, MemoryAssets,
	RESERVED_INDEX_ADDRESS, ResolvedResource, ResourceName, ResourceRequest, ResourceResolver,
};
pub use scheme::{LocalSchemeHandler, SchemeTask, SchemeTaskSink, TaskOutcome};
pub use tabhost_protocol::{BuildMode, TabConfig, TabType, TabsConfiguration, default_tabs};
pub use tabhost_runtime::{Error, Result};
pub use view::{Chrome, MountedView, ViewContent};
pub use web::{LoadReport, WebContentEngine, WebEngineFactory, WebTab, WebTabStatus};
