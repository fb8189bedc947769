use std::{any::Any, fmt, sync::Arc};

use crate::errors::DowncastError;

/// All errors must be Send + Sync so they can cross the deferred boundary
pub type DynError = Box<dyn std::error::Error + Send + Sync>;

/// Unique name of a bean across the whole registry.
pub type BeanIdentifier = String;

/// Grouping key for beans; category searches target all beans sharing one.
pub type BeanCategory = String;

/// Category used when none is given at registration.
pub const BEAN: &str = "bean";

/// Dynamically typed value held by a ready bean.
///
/// Cloning is cheap, the payload is shared.
#[derive(Clone)]
pub struct BeanValue {
    type_name: &'static str,
    value: Arc<dyn Any + Send + Sync>,
}

impl BeanValue {
    pub fn new<T: Send + Sync + 'static>(value: T) -> Self {
        BeanValue {
            type_name: std::any::type_name::<T>(),
            value: Arc::new(value),
        }
    }

    /// Name of the concrete type the value was created from.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn downcast<T: Send + Sync + 'static>(&self) -> Result<Arc<T>, DowncastError> {
        Arc::downcast::<T>(self.value.clone()).map_err(|_| DowncastError {
            required_type: std::any::type_name::<T>(),
            actual_type: self.type_name,
        })
    }
}

impl fmt::Debug for BeanValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("BeanValue").field(&self.type_name).finish()
    }
}

/// What a resolved wiring entry yields: one value for identifier and
/// get-first searches, every ready value of the category otherwise.
#[derive(Debug, Clone)]
pub enum Wired {
    Single(BeanValue),
    Many(Vec<BeanValue>),
}

impl Wired {
    pub fn single(&self) -> Option<&BeanValue> {
        match self {
            Wired::Single(value) => Some(value),
            Wired::Many(_) => None,
        }
    }

    pub fn many(&self) -> Option<&[BeanValue]> {
        match self {
            Wired::Single(_) => None,
            Wired::Many(values) => Some(values),
        }
    }

    /// Downcast shortcut for the single-value case.
    pub fn downcast<T: Send + Sync + 'static>(&self) -> Result<Arc<T>, DowncastError> {
        match self {
            Wired::Single(value) => value.downcast(),
            Wired::Many(_) => Err(DowncastError {
                required_type: std::any::type_name::<T>(),
                actual_type: "multiple beans",
            }),
        }
    }
}

/// Policy governing when a bean may be initialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Behaviour {
    /// Never instanced, carries a fixed value from the start.
    NoInstance,
    /// Initialized once every dependency is ready.
    Cautious,
    /// Initialized as soon as declared, failing loudly if unmet.
    Eager,
    /// Initialized on first demand.
    Lazy,
}

/// The behaviours valid for an `instance` registration — everything but
/// [`Behaviour::NoInstance`], which is reserved for declared values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InstanceBehaviour {
    #[default]
    Cautious,
    Eager,
    Lazy,
}

impl From<InstanceBehaviour> for Behaviour {
    fn from(behaviour: InstanceBehaviour) -> Self {
        match behaviour {
            InstanceBehaviour::Cautious => Behaviour::Cautious,
            InstanceBehaviour::Eager => Behaviour::Eager,
            InstanceBehaviour::Lazy => Behaviour::Lazy,
        }
    }
}

/// Boxed callable both initializer kinds wrap.
pub type InitializerFn = Box<dyn FnOnce(Vec<Wired>) -> Result<BeanValue, DynError>>;

/// Tagged initializer, chosen by the caller at registration time instead of
/// inferred from the callable itself.
pub enum Initializer {
    /// Constructs the value the way a type constructor would.
    Constructor(InitializerFn),
    /// Plain factory producing the value.
    Factory(InitializerFn),
}

impl Initializer {
    pub fn constructor<F>(f: F) -> Self
    where
        F: FnOnce(Vec<Wired>) -> Result<BeanValue, DynError> + 'static,
    {
        Initializer::Constructor(Box::new(f))
    }

    pub fn factory<F>(f: F) -> Self
    where
        F: FnOnce(Vec<Wired>) -> Result<BeanValue, DynError> + 'static,
    {
        Initializer::Factory(Box::new(f))
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Initializer::Constructor(_) => "constructor",
            Initializer::Factory(_) => "factory",
        }
    }

    pub(crate) fn invoke(self, wire_values: Vec<Wired>) -> Result<BeanValue, DynError> {
        match self {
            Initializer::Constructor(f) | Initializer::Factory(f) => f(wire_values),
        }
    }
}

impl fmt::Debug for Initializer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Initializer").field(&self.kind()).finish()
    }
}

/// Continuation run exactly once when a connector's search is satisfied.
pub type ConnectorCallback = Box<dyn FnOnce(Wired) -> Result<(), DynError>>;
