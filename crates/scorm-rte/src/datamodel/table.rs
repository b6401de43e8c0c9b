use crate::datamodel::launch::LaunchField;
use crate::datamodel::types::DataType;
use crate::datamodel::{scorm12, scorm2004};
use crate::version::ScormVersion;
use std::collections::HashMap;
use std::sync::OnceLock;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Access {
    ReadOnly,
    WriteOnly,
    ReadWrite,
}

impl Access {
    pub fn readable(&self) -> bool {
        !matches!(self, Self::WriteOnly)
    }

    pub fn writable(&self) -> bool {
        !matches!(self, Self::ReadOnly)
    }
}

/// Where an element's value comes from when it is not written by content.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ValueSource {
    /// Persisted and restored into the next session.
    Tracked,
    /// Persisted, but every session starts without it.
    SessionScoped,
    Launch(LaunchField),
    /// `ab-initio` or `resume`, decided at hydration.
    Entry,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ElementSpec {
    pub pattern: &'static str,
    pub data_type: DataType,
    pub access: Access,
    pub source: ValueSource,
    pub default: Option<&'static str>,
    /// Element (same entry indices) that must hold a value before this one
    /// accepts writes.
    pub requires: Option<&'static str>,
}

impl ElementSpec {
    fn new(pattern: &'static str, data_type: DataType, access: Access) -> Self {
        Self {
            pattern,
            data_type,
            access,
            source: ValueSource::Tracked,
            default: None,
            requires: None,
        }
    }

    pub(crate) fn read_write(pattern: &'static str, data_type: DataType) -> Self {
        Self::new(pattern, data_type, Access::ReadWrite)
    }

    pub(crate) fn read_only(pattern: &'static str, data_type: DataType) -> Self {
        Self::new(pattern, data_type, Access::ReadOnly)
    }

    pub(crate) fn write_only(pattern: &'static str, data_type: DataType) -> Self {
        Self::new(pattern, data_type, Access::WriteOnly)
    }

    pub(crate) fn with_default(mut self, value: &'static str) -> Self {
        self.default = Some(value);
        self
    }

    pub(crate) fn from_launch(mut self, field: LaunchField) -> Self {
        self.source = ValueSource::Launch(field);
        self
    }

    pub(crate) fn session_scoped(mut self) -> Self {
        self.source = ValueSource::SessionScoped;
        self
    }

    pub(crate) fn entry(mut self) -> Self {
        self.source = ValueSource::Entry;
        self
    }

    pub(crate) fn requires(mut self, pattern: &'static str) -> Self {
        self.requires = Some(pattern);
        self
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CollectionSpec {
    pub pattern: &'static str,
    /// Comma-separated `_children` answer for the collection's entries.
    pub children: &'static str,
    /// Field a new entry must be created with, if any.
    pub creating_field: Option<&'static str>,
}

/// Per-variant registry of every element, container and collection.
#[derive(Debug)]
pub struct ElementTable {
    version: ScormVersion,
    reports_uninitialized: bool,
    elements: HashMap<&'static str, ElementSpec>,
    containers: HashMap<&'static str, &'static str>,
    collections: HashMap<&'static str, CollectionSpec>,
}

static SCORM12_TABLE: OnceLock<ElementTable> = OnceLock::new();
static SCORM2004_TABLE: OnceLock<ElementTable> = OnceLock::new();

impl ElementTable {
    pub fn for_version(version: ScormVersion) -> &'static ElementTable {
        match version {
            ScormVersion::Scorm12 => SCORM12_TABLE.get_or_init(scorm12::build_table),
            ScormVersion::Scorm2004 => SCORM2004_TABLE.get_or_init(scorm2004::build_table),
        }
    }

    pub(crate) fn new(version: ScormVersion, reports_uninitialized: bool) -> Self {
        Self {
            version,
            reports_uninitialized,
            elements: HashMap::new(),
            containers: HashMap::new(),
            collections: HashMap::new(),
        }
    }

    pub(crate) fn with_container(mut self, pattern: &'static str, children: &'static str) -> Self {
        self.containers.insert(pattern, children);
        self
    }

    pub(crate) fn with_collection(
        mut self,
        pattern: &'static str,
        children: &'static str,
        creating_field: Option<&'static str>,
    ) -> Self {
        self.collections.insert(
            pattern,
            CollectionSpec {
                pattern,
                children,
                creating_field,
            },
        );
        self
    }

    pub(crate) fn with_elements(mut self, elements: impl IntoIterator<Item = ElementSpec>) -> Self {
        for spec in elements {
            self.elements.insert(spec.pattern, spec);
        }
        self
    }

    pub fn version(&self) -> ScormVersion {
        self.version
    }

    /// Whether reading a value that was never set is an error rather than "".
    pub fn reports_uninitialized(&self) -> bool {
        self.reports_uninitialized
    }

    pub fn element(&self, pattern: &str) -> Option<&ElementSpec> {
        self.elements.get(pattern)
    }

    pub fn collection(&self, pattern: &str) -> Option<&CollectionSpec> {
        self.collections.get(pattern)
    }

    pub fn children(&self, pattern: &str) -> Option<&'static str> {
        self.containers
            .get(pattern)
            .copied()
            .or_else(|| self.collections.get(pattern).map(|spec| spec.children))
    }

    pub fn is_known(&self, pattern: &str) -> bool {
        self.elements.contains_key(pattern)
            || self.containers.contains_key(pattern)
            || self.collections.contains_key(pattern)
    }

    pub fn elements(&self) -> impl Iterator<Item = &ElementSpec> {
        self.elements.values()
    }
}
