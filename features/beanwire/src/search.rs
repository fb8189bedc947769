use std::fmt;

use crate::errors::InjectionError;
use crate::types::{BeanCategory, BeanIdentifier};

/// Search descriptor for beans: an exact identifier, a whole category, or
/// the first bean of a category.
///
/// At least one of `identifier`/`category` must be present; `wire` and
/// `instance` reject empty descriptors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BeanSearch {
    pub identifier: Option<BeanIdentifier>,
    pub category: Option<BeanCategory>,
    /// Yield a single bean even when only a category is given.
    pub get_first: bool,
    /// Keep this edge out of the nested cycle walk; it is only resolved
    /// once the owning bean actually initializes.
    pub non_transferable: bool,
}

impl BeanSearch {
    pub fn identifier(identifier: impl Into<BeanIdentifier>) -> Self {
        BeanSearch {
            identifier: Some(identifier.into()),
            category: None,
            get_first: false,
            non_transferable: false,
        }
    }

    pub fn category(category: impl Into<BeanCategory>) -> Self {
        BeanSearch {
            identifier: None,
            category: Some(category.into()),
            get_first: false,
            non_transferable: false,
        }
    }

    pub fn in_category(mut self, category: impl Into<BeanCategory>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn first(mut self) -> Self {
        self.get_first = true;
        self
    }

    pub fn non_transferable(mut self) -> Self {
        self.non_transferable = true;
        self
    }

    /// Whether this search yields a single bean rather than a whole
    /// category.
    pub fn is_single(&self) -> bool {
        self.identifier.is_some() || self.get_first
    }

    pub(crate) fn validate(&self) -> Result<(), InjectionError> {
        if self.identifier.is_none() && self.category.is_none() {
            return Err(InjectionError::InvalidSearch);
        }
        Ok(())
    }

    pub(crate) fn matches(&self, identifier: &str, category: &str) -> bool {
        self.identifier.as_deref().map_or(true, |i| i == identifier)
            && self.category.as_deref().map_or(true, |c| c == category)
    }
}

impl From<&str> for BeanSearch {
    fn from(identifier: &str) -> Self {
        BeanSearch::identifier(identifier)
    }
}

impl From<String> for BeanSearch {
    fn from(identifier: String) -> Self {
        BeanSearch::identifier(identifier)
    }
}

impl From<&BeanSearch> for BeanSearch {
    fn from(search: &BeanSearch) -> Self {
        search.clone()
    }
}

impl fmt::Display for BeanSearch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.identifier, &self.category) {
            (Some(identifier), Some(category)) => {
                write!(f, "'{identifier}' in category '{category}'")
            }
            (Some(identifier), None) => write!(f, "'{identifier}'"),
            (None, Some(category)) => write!(f, "category '{category}'"),
            (None, None) => write!(f, "<empty search>"),
        }
    }
}
