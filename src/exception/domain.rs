use crate::exception::simple_name;
use std::fmt::Display;
use thiserror::Error;

pub(crate) fn not_found_message(resource: &str, id_name: &str, id_value: impl Display) -> String {
    format!("{resource} with {id_name} [{id_value}] not found")
}

pub(crate) fn already_exists_message(
    resource: &str,
    id_name: &str,
    id_value: impl Display,
) -> String {
    format!("{resource} with {id_name} [{id_value}] already exists")
}

pub(crate) fn doesnt_contain_message(
    parent: &str,
    child: &str,
    id_name: &str,
    id_value: impl Display,
) -> String {
    format!("{parent} doesn't contain {child} with {id_name} [{id_value}]")
}

/// A requested entity does not exist. Translated to 404.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct EntityNotFound {
    message: String,
}

impl EntityNotFound {
    pub fn of(resource: &str) -> Self {
        Self {
            message: format!("{resource} not found"),
        }
    }

    pub fn with_id(resource: &str, id: i64) -> Self {
        Self::with_identifier(resource, "id", id)
    }

    pub fn with_identifier(resource: &str, name: &str, value: impl Display) -> Self {
        Self {
            message: not_found_message(resource, name, value),
        }
    }

    /// Named after the simple name of `T`.
    pub fn for_type<T: ?Sized>() -> Self {
        Self::of(simple_name(std::any::type_name::<T>()))
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// An entity with the same identity already exists. Translated to 400.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct EntityAlreadyExists {
    message: String,
}

impl EntityAlreadyExists {
    pub fn of(resource: &str) -> Self {
        Self {
            message: format!("{resource} already exists"),
        }
    }

    pub fn with_id(resource: &str, id: i64) -> Self {
        Self::with_identifier(resource, "id", id)
    }

    pub fn with_identifier(resource: &str, name: &str, value: impl Display) -> Self {
        Self {
            message: already_exists_message(resource, name, value),
        }
    }

    pub fn for_type<T: ?Sized>() -> Self {
        Self::of(simple_name(std::any::type_name::<T>()))
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}
