use thiserror::Error;

use crate::types::{BeanCategory, BeanIdentifier, DynError};

/// Errors raised by [`Bean::initialize`](crate::Bean::initialize).
#[derive(Error, Debug)]
pub enum BeanError {
    /// The bean already went through its one initialization
    #[error("bean '{0}' is already initialized")]
    AlreadyInitialized(BeanIdentifier),
    /// Nothing to initialize the bean with
    #[error("bean '{0}' has no initializer and cannot be instantiated")]
    NotInstantiable(BeanIdentifier),
    /// The initializer itself failed
    #[error("initialization of bean '{identifier}' failed: {source}")]
    Initialization {
        identifier: BeanIdentifier,
        source: DynError,
    },
}

/// Top-level error: returned from caller-invoked operations and emitted on
/// the error channel for failures found during background passes.
#[derive(Error, Debug)]
pub enum InjectionError {
    #[error("this identifier is already taken: '{0}'")]
    IdentifierAlreadyExists(BeanIdentifier),
    /// A bean that is supposed to be instanced has nothing to instance it
    #[error("bean '{0}' requires an initializer")]
    MissingInitializer(BeanIdentifier),
    #[error("a search needs at least an identifier or a category")]
    InvalidSearch,
    #[error("no bean found for identifier {identifier:?}, category {category:?}")]
    BeanNotFound {
        identifier: Option<BeanIdentifier>,
        category: Option<BeanCategory>,
    },
    #[error("bean '{0}' is not ready yet")]
    BeanNotReady(BeanIdentifier),
    /// A bean referencing itself in its own wiring
    #[error("bean '{0}' is referencing itself in its dependencies")]
    SelfDependency(BeanIdentifier),
    /// A dependency loop over two or more beans; carries the full path
    #[error("interdependency detected between beans {path:?}")]
    InterDependency { path: Vec<BeanIdentifier> },
    #[error("a connector callback failed: {source}")]
    ConnectorCallback { source: DynError },
    /// The deferred wiring did not complete in time
    #[error("wiring timed out")]
    Timeout,
    /// The manager went away before the deferred wiring completed
    #[error("the dependency manager was dropped before the wiring completed")]
    ChannelClosed,
    #[error(transparent)]
    Bean(#[from] BeanError),
}

/// Failed [`BeanValue::downcast`](crate::BeanValue::downcast).
#[derive(Error, Debug, Clone)]
#[error("failed to downcast, required: '{required_type}' actual: '{actual_type}'")]
pub struct DowncastError {
    pub required_type: &'static str,
    pub actual_type: &'static str,
}
