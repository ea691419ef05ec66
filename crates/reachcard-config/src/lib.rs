//! Card descriptions for reachcard.
//!
//! A board's sound card is described in a TOML file: card-level properties
//! (model, compatible, widgets, routing, pin switches, aux devices), the
//! nodes that provide DAIs, and one entry per DAI link.
//!
//! # Features
//!
//! - **Description format**: [`CardDescription`] load/save with serde + TOML
//! - **Endpoint records**: [`CardDescription::endpoint_records`] feeds the
//!   topology resolver
//! - **DAI providers**: [`ProviderTable`] answers DAI lookups for the resolver
//! - **Validation**: [`validate_description`] reports every problem at once
//! - **Boards**: [`driver_name`] maps a compatible string to its driver name
//!
//! # Example
//!
//! ```rust,no_run
//! use reachcard_config::CardDescription;
//! use reachcard_core::TopologyResolver;
//!
//! let description = CardDescription::load("boards/qcs6490-rb3gen2.toml").unwrap();
//! let links = TopologyResolver::new(description.provider_table())
//!     .resolve(&description.endpoint_records())
//!     .unwrap();
//! for link in &links {
//!     println!("{} -> {}", link.declared_name(), link.name());
//! }
//! ```

mod description;
mod driver;
mod error;
mod providers;

/// Card description validation.
pub mod validation;

pub use description::{
    CardDescription, DaiRefDescription, LinkDescription, PlatformDescription,
    VolumeLimitDescription,
};
pub use driver::{SUPPORTED_BOARDS, driver_name};
pub use error::ConfigError;
pub use providers::{DaiEntry, DaiProvider, ProviderTable};
pub use validation::{ValidationError, ValidationResult, validate_description};
