use crate::errors::BeanError;
use crate::search::BeanSearch;
use crate::types::{BeanCategory, BeanIdentifier, BeanValue, Behaviour, Initializer, Wired};

/// Value, initializer or both.
pub struct BeanContent {
    pub initializer: Option<Initializer>,
    pub value: Option<BeanValue>,
}

/// Behaviour and wiring of a bean.
pub struct BeanOptions {
    pub behaviour: Behaviour,
    pub wiring: Vec<BeanSearch>,
}

/// A bean is a named, lifecycle-managed unit of value or deferred
/// construction, owned by the [`DependencyManager`](crate::DependencyManager).
///
/// `ready` flips false→true exactly once, in [`Bean::initialize`]; nothing
/// else mutates it.
pub struct Bean {
    identifier: BeanIdentifier,
    category: BeanCategory,
    initializer: Option<Initializer>,
    value: Option<BeanValue>,
    wiring: Vec<BeanSearch>,
    behaviour: Behaviour,
    ready: bool,
}

impl Bean {
    /// A [`Behaviour::NoInstance`] bean is ready from the start, everything
    /// else starts unready.
    pub fn new(
        identifier: impl Into<BeanIdentifier>,
        category: impl Into<BeanCategory>,
        content: BeanContent,
        options: BeanOptions,
    ) -> Self {
        Bean {
            identifier: identifier.into(),
            category: category.into(),
            initializer: content.initializer,
            value: content.value,
            wiring: options.wiring,
            behaviour: options.behaviour,
            ready: options.behaviour == Behaviour::NoInstance,
        }
    }

    /// Runs the initializer with the resolved dependency values and flips
    /// the bean ready.
    pub fn initialize(&mut self, wire_values: Vec<Wired>) -> Result<&BeanValue, BeanError> {
        if self.ready {
            return Err(BeanError::AlreadyInitialized(self.identifier.clone()));
        }
        let initializer = self
            .initializer
            .take()
            .ok_or_else(|| BeanError::NotInstantiable(self.identifier.clone()))?;
        tracing::trace!(bean = %self.identifier, kind = initializer.kind(), "initializing bean");
        let value = initializer
            .invoke(wire_values)
            .map_err(|source| BeanError::Initialization {
                identifier: self.identifier.clone(),
                source,
            })?;
        self.ready = true;
        Ok(self.value.insert(value))
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn behaviour(&self) -> Behaviour {
        self.behaviour
    }

    pub fn wiring(&self) -> &[BeanSearch] {
        &self.wiring
    }

    pub fn value(&self) -> Option<&BeanValue> {
        self.value.as_ref()
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    pub(crate) fn has_initializer(&self) -> bool {
        self.initializer.is_some()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;

    fn cautious(identifier: &str, content: BeanContent) -> Bean {
        Bean::new(
            identifier,
            crate::types::BEAN,
            content,
            BeanOptions {
                behaviour: Behaviour::Cautious,
                wiring: Vec::new(),
            },
        )
    }

    #[test]
    fn does_not_initialize_when_already_ready() {
        let mut bean = Bean::new(
            "bean",
            crate::types::BEAN,
            BeanContent {
                initializer: None,
                value: Some(BeanValue::new(1_i32)),
            },
            BeanOptions {
                behaviour: Behaviour::NoInstance,
                wiring: Vec::new(),
            },
        );
        assert!(bean.is_ready());
        assert!(matches!(
            bean.initialize(Vec::new()),
            Err(BeanError::AlreadyInitialized(_))
        ));
    }

    #[test]
    fn does_not_initialize_without_initializer() {
        let mut bean = cautious(
            "bean",
            BeanContent {
                initializer: None,
                value: None,
            },
        );
        assert!(matches!(
            bean.initialize(Vec::new()),
            Err(BeanError::NotInstantiable(_))
        ));
    }

    #[test]
    fn wraps_initializer_failures() {
        let mut bean = cautious(
            "bean",
            BeanContent {
                initializer: Some(Initializer::factory(|_| Err("boom".into()))),
                value: None,
            },
        );
        assert!(matches!(
            bean.initialize(Vec::new()),
            Err(BeanError::Initialization { .. })
        ));
        assert!(!bean.is_ready());
    }

    #[test]
    fn calls_the_initializer() {
        let called = Rc::new(Cell::new(false));
        let flag = called.clone();
        let mut bean = cautious(
            "bean",
            BeanContent {
                initializer: Some(Initializer::factory(move |_| {
                    flag.set(true);
                    Ok(BeanValue::new(()))
                })),
                value: None,
            },
        );
        bean.initialize(Vec::new()).unwrap();
        assert!(called.get());

        let constructed = Rc::new(Cell::new(false));
        let flag = constructed.clone();
        let mut bean = cautious(
            "bean2",
            BeanContent {
                initializer: Some(Initializer::constructor(move |_| {
                    flag.set(true);
                    Ok(BeanValue::new(()))
                })),
                value: None,
            },
        );
        bean.initialize(Vec::new()).unwrap();
        assert!(constructed.get());
    }

    #[test]
    fn sets_the_value_once_initialized() {
        let mut bean = cautious(
            "bean",
            BeanContent {
                initializer: Some(Initializer::factory(|_| Ok(BeanValue::new(451_i32)))),
                value: None,
            },
        );
        bean.initialize(Vec::new()).unwrap();
        let value = bean.value().unwrap();
        assert_eq!(*value.downcast::<i32>().unwrap(), 451);
    }

    #[test]
    fn sets_ready_once_initialized() {
        let mut bean = cautious(
            "bean",
            BeanContent {
                initializer: Some(Initializer::factory(|_| Ok(BeanValue::new(())))),
                value: None,
            },
        );
        assert!(!bean.is_ready());
        bean.initialize(Vec::new()).unwrap();
        assert!(bean.is_ready());
    }
}
