//! beanwire is an in-process object-wiring engine: callers register named
//! values or deferred initializers ("beans"), declare their dependencies,
//! and the engine decides when and in what order to instantiate them,
//! resolving dependency cycles and notifying interested callers as
//! dependencies become available.
//!
//! The engine is split into the following parts:
//! 1. [`DependencyManager`]: the registry, the resolution loop and the
//!    wiring entry points
//! 2. [`Bean`]: one named unit of value or deferred construction
//! 3. [`BeanSearch`]: how dependencies are described, by identifier or by
//!    category
//! 4. [`ErrorSink`]: where non-fatal resolution failures end up
//!
//! # Examples
//!
//! ```rust
//! use beanwire::{BeanValue, DependencyManager, Initializer, InstanceOptions};
//!
//! let mut manager = DependencyManager::new();
//! manager.declare("answer", BeanValue::new(42_i32)).unwrap();
//! manager
//!     .instance(
//!         "doubled",
//!         Initializer::factory(|mut deps| {
//!             let answer = deps.remove(0).downcast::<i32>()?;
//!             Ok(BeanValue::new(*answer * 2))
//!         }),
//!         InstanceOptions {
//!             wiring: vec!["answer".into()],
//!             ..Default::default()
//!         },
//!     )
//!     .unwrap();
//!
//! let doubled = manager.wire("doubled").unwrap();
//! assert_eq!(*doubled.downcast::<i32>().unwrap(), 84);
//! ```

pub mod bean;
mod deferred;
mod dependency_graph;
pub mod errors;
pub mod events;
pub mod manager;
pub mod search;
pub mod types;

pub use bean::{Bean, BeanContent, BeanOptions};
pub use deferred::WireFuture;
pub use errors::{BeanError, DowncastError, InjectionError};
pub use events::ErrorSink;
pub use manager::{DependencyManager, InstanceOptions};
pub use search::BeanSearch;
pub use types::{
    BeanCategory, BeanIdentifier, BeanValue, Behaviour, ConnectorCallback, DynError, Initializer,
    InstanceBehaviour, Wired, BEAN,
};
