use crate::datamodel::launch::LaunchContext;
use crate::datamodel::path::{ElementPath, IndexLevel, Keyword, instantiate};
use crate::datamodel::table::{ElementSpec, ElementTable, ValueSource};
use crate::datamodel::types::Violation;
use crate::errors::RteFault;
use crate::lifecycle::ApiCall;
use crate::version::ScormVersion;
use scorm_trackstore::{ElementSnapshot, PersistedState};
use std::collections::{BTreeMap, BTreeSet};

pub const ENTRY_AB_INITIO: &str = "ab-initio";
pub const ENTRY_RESUME: &str = "resume";

/// In-memory element values for one session, validated against the
/// variant's element table.
#[derive(Clone, Debug)]
pub struct CmiStore {
    table: &'static ElementTable,
    launch: LaunchContext,
    entry: &'static str,
    values: BTreeMap<String, String>,
    /// Concrete collection path → number of entries.
    counts: BTreeMap<String, usize>,
    dirty: BTreeSet<String>,
}

impl CmiStore {
    pub fn new(version: ScormVersion, launch: LaunchContext) -> Self {
        Self {
            table: ElementTable::for_version(version),
            launch,
            entry: ENTRY_AB_INITIO,
            values: BTreeMap::new(),
            counts: BTreeMap::new(),
            dirty: BTreeSet::new(),
        }
    }

    pub fn version(&self) -> ScormVersion {
        self.table.version()
    }

    pub fn entry(&self) -> &'static str {
        self.entry
    }

    /// Replaces all values with the tracked part of `persisted`. Returns the
    /// number of restored elements.
    pub fn hydrate(&mut self, persisted: Option<&PersistedState>) -> usize {
        self.values.clear();
        self.counts.clear();
        self.dirty.clear();
        self.entry = if persisted.is_some() {
            ENTRY_RESUME
        } else {
            ENTRY_AB_INITIO
        };

        let Some(state) = persisted else {
            return 0;
        };
        for (path, value) in &state.elements {
            let Some(parsed) = ElementPath::parse(path) else {
                tracing::debug!(path = %path, "skipping malformed persisted element");
                continue;
            };
            let tracked = self
                .table
                .element(parsed.pattern())
                .is_some_and(|spec| spec.source == ValueSource::Tracked);
            if !tracked {
                continue;
            }
            for level in parsed.levels() {
                let count = self.counts.entry(level.collection.clone()).or_default();
                *count = (*count).max(level.index + 1);
            }
            self.values.insert(path.clone(), value.clone());
        }
        self.values.len()
    }

    pub fn get_value(&self, path: &str) -> Result<String, RteFault> {
        if path.is_empty() {
            return Err(RteFault::EmptyElementName {
                call: ApiCall::GetValue,
            });
        }
        let parsed =
            ElementPath::parse(path).ok_or_else(|| RteFault::UndefinedElement(path.to_string()))?;
        if let Some(keyword) = parsed.keyword() {
            return self.read_keyword(&parsed, keyword);
        }

        let spec = self
            .table
            .element(parsed.pattern())
            .ok_or_else(|| RteFault::UndefinedElement(path.to_string()))?;
        if !spec.access.readable() {
            return Err(RteFault::WriteOnly(path.to_string()));
        }
        self.check_read_levels(&parsed)?;

        match self.current_value(path, spec) {
            Some(value) => Ok(value),
            None if self.table.reports_uninitialized() => {
                Err(RteFault::ValueNotInitialized(path.to_string()))
            }
            None => Ok(String::new()),
        }
    }

    pub fn set_value(&mut self, path: &str, value: &str) -> Result<(), RteFault> {
        if path.is_empty() {
            return Err(RteFault::EmptyElementName {
                call: ApiCall::SetValue,
            });
        }
        let parsed =
            ElementPath::parse(path).ok_or_else(|| RteFault::UndefinedElement(path.to_string()))?;
        if parsed.keyword().is_some() {
            let target_known = parsed
                .keyword_target_pattern()
                .is_some_and(|target| self.table.is_known(target));
            return Err(if target_known {
                RteFault::KeywordWrite(path.to_string())
            } else {
                RteFault::UndefinedElement(path.to_string())
            });
        }

        let table = self.table;
        let spec = table
            .element(parsed.pattern())
            .ok_or_else(|| RteFault::UndefinedElement(path.to_string()))?;
        if !spec.access.writable() {
            return Err(RteFault::ReadOnly(path.to_string()));
        }

        let created = self.check_write_levels(&parsed)?;
        if let Some(level) = created {
            let creating_field = table
                .collection(&level.collection_pattern)
                .and_then(|collection| collection.creating_field);
            if let Some(field) = creating_field {
                if parsed.field_in_entry() != Some(field) {
                    return Err(RteFault::DependencyNotEstablished {
                        path: path.to_string(),
                        required: format!("{}.{}.{}", level.collection, level.index, field),
                    });
                }
            }
        }
        if let Some(required) = spec.requires {
            let indices: Vec<usize> = parsed.levels().iter().map(|level| level.index).collect();
            let required_path = instantiate(required, &indices);
            if !self.values.contains_key(&required_path) {
                return Err(RteFault::DependencyNotEstablished {
                    path: path.to_string(),
                    required: required_path,
                });
            }
        }

        let stored = spec
            .data_type
            .normalize(value)
            .map_err(|violation| match violation {
                Violation::TypeMismatch(expected) => RteFault::TypeMismatch {
                    path: path.to_string(),
                    value: value.to_string(),
                    expected,
                },
                Violation::OutOfRange(detail) => RteFault::ValueOutOfRange {
                    path: path.to_string(),
                    detail,
                },
            })?;

        self.values.insert(path.to_string(), stored);
        self.dirty.insert(path.to_string());
        if let Some(level) = created {
            self.counts.insert(level.collection.clone(), level.index + 1);
        }
        Ok(())
    }

    /// Current values of every element written since its last successful
    /// delivery.
    pub fn dirty_snapshot(&self) -> ElementSnapshot {
        self.dirty
            .iter()
            .filter_map(|path| {
                self.values
                    .get(path)
                    .map(|value| (path.clone(), value.clone()))
            })
            .collect()
    }

    /// Clears the dirty mark of every delivered element still holding the
    /// delivered value.
    pub fn acknowledge(&mut self, delivered: &ElementSnapshot) {
        for (path, value) in delivered {
            if self.values.get(path) == Some(value) {
                self.dirty.remove(path);
            }
        }
    }

    pub fn dirty_len(&self) -> usize {
        self.dirty.len()
    }

    pub fn is_dirty(&self, path: &str) -> bool {
        self.dirty.contains(path)
    }

    pub fn count(&self, collection: &str) -> usize {
        self.counts.get(collection).copied().unwrap_or(0)
    }

    fn current_value(&self, path: &str, spec: &ElementSpec) -> Option<String> {
        let value = match spec.source {
            ValueSource::Launch(field) => self.launch.value(field).map(str::to_string),
            ValueSource::Entry => Some(self.entry.to_string()),
            ValueSource::Tracked | ValueSource::SessionScoped => self.values.get(path).cloned(),
        };
        value.or_else(|| spec.default.map(str::to_string))
    }

    fn read_keyword(&self, parsed: &ElementPath, keyword: Keyword) -> Result<String, RteFault> {
        let (Some(target_pattern), Some(target)) =
            (parsed.keyword_target_pattern(), parsed.keyword_target())
        else {
            return Err(RteFault::UndefinedElement(parsed.raw().to_string()));
        };

        match keyword {
            Keyword::Children => {
                if let Some(children) = self.table.children(target_pattern) {
                    self.check_read_levels(parsed)?;
                    return Ok(children.to_string());
                }
                if self.table.is_known(target_pattern) {
                    return Err(RteFault::ChildrenUnsupported(target.to_string()));
                }
            }
            Keyword::Count => {
                if self.table.collection(target_pattern).is_some() {
                    self.check_read_levels(parsed)?;
                    return Ok(self.count(target).to_string());
                }
                if self.table.is_known(target_pattern) {
                    return Err(RteFault::CountUnsupported(target.to_string()));
                }
            }
        }
        Err(RteFault::UndefinedElement(parsed.raw().to_string()))
    }

    fn check_read_levels(&self, parsed: &ElementPath) -> Result<(), RteFault> {
        for level in parsed.levels() {
            if level.index >= self.count(&level.collection) {
                return Err(RteFault::IndexOutOfRange(parsed.raw().to_string()));
            }
        }
        Ok(())
    }

    /// Returns the level whose entry this write appends, if any. Only the
    /// innermost index may append, and only at exactly the current count.
    fn check_write_levels<'p>(
        &self,
        parsed: &'p ElementPath,
    ) -> Result<Option<&'p IndexLevel>, RteFault> {
        let levels = parsed.levels();
        for (position, level) in levels.iter().enumerate() {
            let count = self.count(&level.collection);
            if level.index < count {
                continue;
            }
            if level.index == count && position + 1 == levels.len() {
                return Ok(Some(level));
            }
            return Err(RteFault::ValueOutOfRange {
                path: parsed.raw().to_string(),
                detail: format!(
                    "index {} is past the {} entries of {}",
                    level.index, count, level.collection
                ),
            });
        }
        Ok(None)
    }
}
