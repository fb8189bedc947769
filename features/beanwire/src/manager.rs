//! The dependency manager: bean registry, fix-point resolution loop,
//! synchronous wiring and the connector queue.

use std::time::Duration;

use crate::bean::{Bean, BeanContent, BeanOptions};
use crate::deferred::{self, WireFuture};
use crate::dependency_graph;
use crate::errors::InjectionError;
use crate::events::{ErrorChannel, ErrorSink};
use crate::search::BeanSearch;
use crate::types::{
    BeanCategory, BeanIdentifier, BeanValue, Behaviour, ConnectorCallback, DynError, Initializer,
    InstanceBehaviour, Wired, BEAN,
};

/// Options for [`DependencyManager::instance`].
pub struct InstanceOptions {
    pub behaviour: InstanceBehaviour,
    pub wiring: Vec<BeanSearch>,
    pub category: BeanCategory,
}

impl Default for InstanceOptions {
    fn default() -> Self {
        InstanceOptions {
            behaviour: InstanceBehaviour::default(),
            wiring: Vec::new(),
            category: BEAN.to_owned(),
        }
    }
}

/// A standing query plus a continuation run exactly once when satisfied.
struct Connector {
    search: BeanSearch,
    callback: Option<ConnectorCallback>,
    resolved: bool,
}

/// Controls, registers, wires and distributes dependencies.
///
/// All operations are synchronous and run to completion behind `&mut self`;
/// the only thing that outlives a call is the [`WireFuture`] handed out by
/// [`async_wire`](DependencyManager::async_wire).
pub struct DependencyManager {
    beans: Vec<Bean>,
    connectors: Vec<Connector>,
    channel: ErrorChannel,
}

impl Default for DependencyManager {
    fn default() -> Self {
        Self::new()
    }
}

impl DependencyManager {
    pub fn new() -> Self {
        DependencyManager {
            beans: Vec::new(),
            connectors: Vec::new(),
            channel: ErrorChannel::new(),
        }
    }

    // ===== bean lookup =====

    fn get_bean(&self, search: &BeanSearch) -> Option<&Bean> {
        self.beans
            .iter()
            .find(|b| search.matches(b.identifier(), b.category()))
    }

    fn get_ready_bean(&self, search: &BeanSearch) -> Option<&Bean> {
        self.beans
            .iter()
            .find(|b| b.is_ready() && search.matches(b.identifier(), b.category()))
    }

    fn get_ready_values(&self, category: &str) -> Vec<BeanValue> {
        self.beans
            .iter()
            .filter(|b| b.is_ready() && b.category() == category)
            .filter_map(|b| b.value().cloned())
            .collect()
    }

    fn bean_index(&self, identifier: &str) -> Option<usize> {
        self.beans.iter().position(|b| b.identifier() == identifier)
    }

    /// Whether a bean with this identifier exists, ready or not.
    pub fn have_bean(&self, identifier: &str) -> bool {
        self.bean_index(identifier).is_some()
    }

    fn remove_bean(&mut self, identifier: &str) {
        if let Some(index) = self.bean_index(identifier) {
            self.beans.remove(index);
        }
    }

    // ===== registration =====

    /// Declares an already existing value as a dependency in the default
    /// category — a pure fact injection for constants and
    /// externally-constructed objects.
    pub fn declare(
        &mut self,
        identifier: impl Into<BeanIdentifier>,
        value: BeanValue,
    ) -> Result<(), InjectionError> {
        self.declare_in(identifier, value, BEAN)
    }

    /// Same as [`declare`](DependencyManager::declare) with an explicit
    /// category.
    pub fn declare_in(
        &mut self,
        identifier: impl Into<BeanIdentifier>,
        value: BeanValue,
        category: impl Into<BeanCategory>,
    ) -> Result<(), InjectionError> {
        let bean = Bean::new(
            identifier,
            category,
            BeanContent {
                initializer: None,
                value: Some(value),
            },
            BeanOptions {
                behaviour: Behaviour::NoInstance,
                wiring: Vec::new(),
            },
        );
        self.register_bean(bean)
    }

    /// Declares a dependency whose value is produced by `initializer`, fed
    /// positionally with the resolved `wiring` entries.
    pub fn instance(
        &mut self,
        identifier: impl Into<BeanIdentifier>,
        initializer: Initializer,
        options: InstanceOptions,
    ) -> Result<(), InjectionError> {
        for wire in &options.wiring {
            wire.validate()?;
        }
        let bean = Bean::new(
            identifier,
            options.category,
            BeanContent {
                initializer: Some(initializer),
                value: None,
            },
            BeanOptions {
                behaviour: options.behaviour.into(),
                wiring: options.wiring,
            },
        );
        self.register_bean(bean)
    }

    /// Inserts the bean, then runs cycle detection against it, the global
    /// resolution loop and the connector queue, in that order, before
    /// returning.
    fn register_bean(&mut self, bean: Bean) -> Result<(), InjectionError> {
        if self.have_bean(bean.identifier()) {
            return Err(InjectionError::IdentifierAlreadyExists(
                bean.identifier().to_owned(),
            ));
        }
        if bean.behaviour() != Behaviour::NoInstance && !bean.has_initializer() {
            return Err(InjectionError::MissingInitializer(
                bean.identifier().to_owned(),
            ));
        }
        tracing::debug!(
            bean = %bean.identifier(),
            category = %bean.category(),
            behaviour = ?bean.behaviour(),
            "registering bean"
        );
        let identifier = bean.identifier().to_owned();
        self.beans.push(bean);
        self.resolve_interdependencies(&identifier);
        self.resolve_beans();
        self.resolve_connectors();
        Ok(())
    }

    // ===== cycle resolution =====

    /// Removes every bean on a dependency loop reachable from the given
    /// bean and reports each loop once.
    fn resolve_interdependencies(&mut self, identifier: &str) {
        let paths = {
            let Some(bean) = self.beans.iter().find(|b| b.identifier() == identifier) else {
                return;
            };
            dependency_graph::interdependency_paths(&self.beans, bean)
        };
        for path in paths {
            for offender in &path {
                self.remove_bean(offender);
            }
            let error = if path.len() == 1 {
                InjectionError::SelfDependency(path.into_iter().next().unwrap_or_default())
            } else {
                InjectionError::InterDependency { path }
            };
            self.channel.report(&error);
        }
    }

    // ===== initialization =====

    /// Whether the bean could be initialized right now: unready, has an
    /// initializer, and every wiring entry resolves to a ready bean or to a
    /// lazy one that could itself be initialized (checked recursively
    /// through `chain`).
    fn can_initialize(&self, bean: &Bean, chain: &[BeanIdentifier]) -> bool {
        if bean.is_ready() || !bean.has_initializer() {
            return false;
        }
        bean.wiring().iter().all(|wire| {
            if wire.is_single() {
                self.single_wire_satisfiable(wire, bean, chain)
            } else if let Some(category) = wire.category.as_deref() {
                self.beans.iter().any(|b| {
                    b.category() == category
                        && (b.is_ready() || self.lazy_initializable(b, bean, chain))
                })
            } else {
                false
            }
        })
    }

    fn single_wire_satisfiable(
        &self,
        wire: &BeanSearch,
        of: &Bean,
        chain: &[BeanIdentifier],
    ) -> bool {
        if self.get_ready_bean(wire).is_some() {
            return true;
        }
        match self.get_bean(wire) {
            Some(dependency) => self.lazy_initializable(dependency, of, chain),
            None => false,
        }
    }

    fn lazy_initializable(&self, dependency: &Bean, of: &Bean, chain: &[BeanIdentifier]) -> bool {
        if dependency.behaviour() != Behaviour::Lazy {
            return false;
        }
        if dependency.identifier() == of.identifier()
            || chain.iter().any(|id| id == dependency.identifier())
        {
            return false;
        }
        let mut chain = chain.to_vec();
        chain.push(of.identifier().to_owned());
        self.can_initialize(dependency, &chain)
    }

    /// Initializes the bean; on any failure the bean is removed and the
    /// error reported on the channel before being returned.
    fn initialize_bean(
        &mut self,
        identifier: &str,
        chain: &[BeanIdentifier],
    ) -> Result<(), InjectionError> {
        let result = self.try_initialize_bean(identifier, chain);
        if let Err(error) = &result {
            self.remove_bean(identifier);
            self.channel.report(error);
        }
        result
    }

    fn try_initialize_bean(
        &mut self,
        identifier: &str,
        chain: &[BeanIdentifier],
    ) -> Result<(), InjectionError> {
        {
            let Some(bean) = self.beans.iter().find(|b| b.identifier() == identifier) else {
                return Err(InjectionError::BeanNotFound {
                    identifier: Some(identifier.to_owned()),
                    category: None,
                });
            };
            if !bean.has_initializer() {
                return Err(InjectionError::MissingInitializer(identifier.to_owned()));
            }
            if !self.can_initialize(bean, chain) {
                return Err(InjectionError::BeanNotReady(identifier.to_owned()));
            }
        }
        let wire_values = self.resolve_wire_values(identifier, chain)?;
        let Some(index) = self.bean_index(identifier) else {
            return Err(InjectionError::BeanNotFound {
                identifier: Some(identifier.to_owned()),
                category: None,
            });
        };
        self.beans[index].initialize(wire_values)?;
        tracing::debug!(bean = %identifier, "bean initialized");
        Ok(())
    }

    /// Resolves the bean's wiring into positional values, initializing lazy
    /// dependencies on demand with this bean added to the ancestor chain.
    fn resolve_wire_values(
        &mut self,
        identifier: &str,
        chain: &[BeanIdentifier],
    ) -> Result<Vec<Wired>, InjectionError> {
        let Some(bean) = self.beans.iter().find(|b| b.identifier() == identifier) else {
            return Err(InjectionError::BeanNotFound {
                identifier: Some(identifier.to_owned()),
                category: None,
            });
        };
        let wiring = bean.wiring().to_vec();
        let mut chain = chain.to_vec();
        chain.push(identifier.to_owned());
        let mut values = Vec::with_capacity(wiring.len());
        for wire in &wiring {
            values.push(self.wire_internal(wire, &chain)?);
        }
        Ok(values)
    }

    // ===== resolution loop =====

    /// Fix-point pass: initialize every unready eager/cautious bean whose
    /// state allows it, repeating while at least one bean came up.
    fn resolve_beans(&mut self) {
        loop {
            // snapshot, failures remove beans mid-pass
            let candidates: Vec<(BeanIdentifier, Behaviour)> = self
                .beans
                .iter()
                .filter(|b| {
                    !b.is_ready()
                        && matches!(b.behaviour(), Behaviour::Eager | Behaviour::Cautious)
                })
                .map(|b| (b.identifier().to_owned(), b.behaviour()))
                .collect();

            let mut progressed = false;
            for (identifier, behaviour) in candidates {
                let Some(bean) = self.beans.iter().find(|b| b.identifier() == identifier) else {
                    continue;
                };
                if bean.is_ready() {
                    continue;
                }
                let attempt =
                    behaviour == Behaviour::Eager || self.can_initialize(bean, &[]);
                if attempt && self.initialize_bean(&identifier, &[]).is_ok() {
                    progressed = true;
                }
            }
            if !progressed {
                break;
            }
        }
    }

    // ===== wiring =====

    /// Synchronous lookup: a single value for identifier/get-first searches,
    /// the ready values of the whole category otherwise.
    pub fn wire(&mut self, search: impl Into<BeanSearch>) -> Result<Wired, InjectionError> {
        self.wire_internal(&search.into(), &[])
    }

    fn wire_internal(
        &mut self,
        search: &BeanSearch,
        chain: &[BeanIdentifier],
    ) -> Result<Wired, InjectionError> {
        search.validate()?;
        if search.is_single() {
            self.wire_single(search, chain).map(Wired::Single)
        } else {
            Ok(Wired::Many(self.wire_many(search, chain)))
        }
    }

    /// First matching ready value; a lazy match is initialized on demand,
    /// unless it already sits on the ancestor chain of this call.
    fn wire_single(
        &mut self,
        search: &BeanSearch,
        chain: &[BeanIdentifier],
    ) -> Result<BeanValue, InjectionError> {
        if let Some(value) = self.get_ready_bean(search).and_then(|b| b.value().cloned()) {
            return Ok(value);
        }
        let Some(bean) = self.get_bean(search) else {
            return Err(InjectionError::BeanNotFound {
                identifier: search.identifier.clone(),
                category: search.category.clone(),
            });
        };
        let identifier = bean.identifier().to_owned();
        if bean.behaviour() != Behaviour::Lazy || chain.iter().any(|id| *id == identifier) {
            return Err(InjectionError::BeanNotReady(identifier));
        }
        self.initialize_bean(&identifier, chain)?;
        self.bean_index(&identifier)
            .and_then(|index| self.beans[index].value().cloned())
            .ok_or(InjectionError::BeanNotReady(identifier))
    }

    /// Values of every ready bean of the category, after opportunistically
    /// initializing its unready lazy beans.
    fn wire_many(&mut self, search: &BeanSearch, chain: &[BeanIdentifier]) -> Vec<BeanValue> {
        let Some(category) = search.category.clone() else {
            return Vec::new();
        };
        // snapshot, failures remove beans mid-scan
        let lazies: Vec<BeanIdentifier> = self
            .beans
            .iter()
            .filter(|b| {
                !b.is_ready() && b.behaviour() == Behaviour::Lazy && b.category() == category
            })
            .map(|b| b.identifier().to_owned())
            .collect();
        for identifier in lazies {
            if chain.iter().any(|id| *id == identifier) {
                continue;
            }
            // failures already removed the bean and reported the error
            let _ = self.initialize_bean(&identifier, chain);
        }
        self.get_ready_values(&category)
    }

    // ===== connectors =====

    /// Registers `callback` to run exactly once when `search` becomes
    /// satisfiable, and returns the value immediately when it already is.
    pub fn auto_wire<F>(&mut self, search: impl Into<BeanSearch>, callback: F) -> Option<Wired>
    where
        F: FnOnce(Wired) -> Result<(), DynError> + 'static,
    {
        let search = search.into();
        if let Err(error) = search.validate() {
            self.channel.report(&error);
            return None;
        }
        self.connectors.push(Connector {
            search: search.clone(),
            callback: Some(Box::new(callback)),
            resolved: false,
        });
        self.resolve_connectors();
        self.wire_internal(&search, &[]).ok()
    }

    /// Deferred completion wrapper around
    /// [`auto_wire`](DependencyManager::auto_wire): the returned future
    /// resolves with the first delivered value, or with
    /// [`InjectionError::Timeout`] when `timeout` elapses first.
    ///
    /// The timeout does not retract the connector: a late value may still be
    /// computed, in which case it is logged at debug level and dropped.
    pub fn async_wire(
        &mut self,
        search: impl Into<BeanSearch>,
        timeout: Option<Duration>,
    ) -> WireFuture {
        let (cell, future) = deferred::deferred();
        if let Some(timeout) = timeout {
            cell.arm_timeout(timeout);
        }
        self.auto_wire(search, move |wired| {
            if !cell.settle(Ok(wired)) {
                tracing::debug!("wired value arrived after the deferred completion settled");
            }
            Ok(())
        });
        future
    }

    /// Fires every unresolved connector whose search has become
    /// satisfiable, then sweeps the resolved ones from the queue.
    fn resolve_connectors(&mut self) {
        let mut index = 0;
        while index < self.connectors.len() {
            self.try_resolve_connector(index);
            index += 1;
        }
        self.connectors.retain(|connector| !connector.resolved);
    }

    fn try_resolve_connector(&mut self, index: usize) {
        if self.connectors[index].resolved {
            return;
        }
        let search = self.connectors[index].search.clone();
        let wired = if search.is_single() {
            // not satisfiable yet on Err; initialization failures were
            // already reported and the offending bean removed
            self.wire_internal(&search, &[]).ok()
        } else {
            let values = self.wire_many(&search, &[]);
            // a category connector waits for the first ready bean instead
            // of firing on an empty category
            if values.is_empty() {
                None
            } else {
                Some(Wired::Many(values))
            }
        };
        let Some(wired) = wired else {
            return;
        };
        let connector = &mut self.connectors[index];
        connector.resolved = true;
        let Some(callback) = connector.callback.take() else {
            return;
        };
        if let Err(source) = callback(wired) {
            let error = InjectionError::ConnectorCallback { source };
            self.channel.report(&error);
        }
    }

    // ===== error channel =====

    /// Subscribes a sink to the error channel.
    pub fn on_error(&mut self, sink: impl ErrorSink + 'static) {
        self.channel.on(sink);
    }

    /// Subscribes a sink that is dropped after its first report.
    pub fn once_error(&mut self, sink: impl ErrorSink + 'static) {
        self.channel.once(sink);
    }

    /// Removes the log-and-continue sink installed at construction.
    pub fn remove_default_error_handler(&mut self) {
        self.channel.remove_default_handler();
    }
}
