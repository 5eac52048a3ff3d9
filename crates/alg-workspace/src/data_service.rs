//! Analysis data service: named store of live workspace handles
//!
//! Owned by whoever runs algorithms (normally the framework object) and
//! passed down explicitly. The factory never stores into it.

use crate::error::WorkspaceError;
use crate::workspace::WorkspaceHandle;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::Serialize;

/// Characters never allowed in a stored workspace name
const ILLEGAL_CHARACTERS: &str = "+-/*\\%<>&|^~=!@()[]{},:.`$'\"?";

/// Summary of one stored workspace
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkspaceSummary {
    /// Name in the store
    pub name: String,
    /// Registered type
    pub workspace_type: String,
    /// Number of spectra
    pub histogram_count: usize,
    /// Length of y per spectrum
    pub y_length: usize,
    /// Title
    pub title: String,
    /// Names of the run logs
    pub logs: Vec<String>,
}

/// Concurrent name → workspace store
#[derive(Debug, Default)]
pub struct AnalysisDataService {
    store: DashMap<String, WorkspaceHandle>,
}

impl AnalysisDataService {
    /// Empty store
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Check a name against the naming rules
    ///
    /// # Errors
    /// `WorkspaceError::InvalidName` for empty names, whitespace or any of
    /// the reserved operator characters
    pub fn validate_name(name: &str) -> Result<(), WorkspaceError> {
        if name.is_empty() {
            return Err(WorkspaceError::InvalidName {
                name: name.to_string(),
                reason: "name is empty".to_string(),
            });
        }
        if let Some(c) = name
            .chars()
            .find(|c| c.is_whitespace() || ILLEGAL_CHARACTERS.contains(*c))
        {
            return Err(WorkspaceError::InvalidName {
                name: name.to_string(),
                reason: format!("contains illegal character {c:?}"),
            });
        }
        Ok(())
    }

    /// Store a new workspace
    ///
    /// # Errors
    /// - `WorkspaceError::InvalidName`
    /// - `WorkspaceError::AlreadyExists` if the name is taken
    pub fn add(&self, name: &str, workspace: WorkspaceHandle) -> Result<(), WorkspaceError> {
        Self::validate_name(name)?;
        match self.store.entry(name.to_string()) {
            Entry::Occupied(_) => Err(WorkspaceError::AlreadyExists {
                name: name.to_string(),
            }),
            Entry::Vacant(slot) => {
                slot.insert(workspace);
                tracing::debug!(workspace = name, "added to data service");
                Ok(())
            }
        }
    }

    /// Store a workspace, returning the one it replaced
    ///
    /// # Errors
    /// `WorkspaceError::InvalidName`
    pub fn add_or_replace(
        &self,
        name: &str,
        workspace: WorkspaceHandle,
    ) -> Result<Option<WorkspaceHandle>, WorkspaceError> {
        Self::validate_name(name)?;
        let previous = self.store.insert(name.to_string(), workspace);
        tracing::debug!(workspace = name, replaced = previous.is_some(), "stored in data service");
        Ok(previous)
    }

    /// Handle stored under `name`
    ///
    /// # Errors
    /// `WorkspaceError::NotFound`
    pub fn retrieve(&self, name: &str) -> Result<WorkspaceHandle, WorkspaceError> {
        self.store
            .get(name)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| WorkspaceError::NotFound {
                name: name.to_string(),
            })
    }

    /// Remove and return the handle stored under `name`
    ///
    /// # Errors
    /// `WorkspaceError::NotFound`
    pub fn remove(&self, name: &str) -> Result<WorkspaceHandle, WorkspaceError> {
        let (_, handle) = self
            .store
            .remove(name)
            .ok_or_else(|| WorkspaceError::NotFound {
                name: name.to_string(),
            })?;
        tracing::debug!(workspace = name, "removed from data service");
        Ok(handle)
    }

    /// Move a workspace to a new name
    ///
    /// # Errors
    /// - `WorkspaceError::NotFound` if `from` is absent
    /// - `WorkspaceError::AlreadyExists` / `InvalidName` for `to`
    pub fn rename(&self, from: &str, to: &str) -> Result<(), WorkspaceError> {
        Self::validate_name(to)?;
        let handle = self.remove(from)?;
        if let Err(err) = self.add(to, handle.clone()) {
            self.store.insert(from.to_string(), handle);
            return Err(err);
        }
        Ok(())
    }

    /// Whether `name` is stored
    #[inline]
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.store.contains_key(name)
    }

    /// Stored names, sorted
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.store.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    /// Summaries of all stored workspaces, sorted by name
    #[must_use]
    pub fn summaries(&self) -> Vec<WorkspaceSummary> {
        let mut summaries: Vec<WorkspaceSummary> = self
            .store
            .iter()
            .map(|entry| {
                let ws = entry.value().read();
                let shape = ws.shape();
                WorkspaceSummary {
                    name: entry.key().clone(),
                    workspace_type: ws.id().to_string(),
                    histogram_count: shape.histogram_count,
                    y_length: shape.y_length,
                    title: ws.metadata().title.clone(),
                    logs: ws.metadata().run.logs().map(|(k, _)| k.to_string()).collect(),
                }
            })
            .collect();
        summaries.sort_by(|a, b| a.name.cmp(&b.name));
        summaries
    }

    /// Number of stored workspaces
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.store.len()
    }

    /// Whether the store is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Drop every stored handle
    pub fn clear(&self) {
        let count = self.store.len();
        self.store.clear();
        tracing::debug!(count, "cleared data service");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workspace::WorkspaceSingleValue;
    use pretty_assertions::assert_eq;

    fn handle(value: f64) -> WorkspaceHandle {
        WorkspaceHandle::new(Box::new(WorkspaceSingleValue::new(value, 0.0)))
    }

    #[test]
    fn add_and_retrieve_same_instance() {
        let ads = AnalysisDataService::new();
        let ws = handle(1.0);
        ads.add("ws1", ws.clone()).unwrap();
        assert!(ads.retrieve("ws1").unwrap().ptr_eq(&ws));
    }

    #[test]
    fn add_rejects_existing_name() {
        let ads = AnalysisDataService::new();
        ads.add("ws1", handle(1.0)).unwrap();
        assert_eq!(
            ads.add("ws1", handle(2.0)),
            Err(WorkspaceError::AlreadyExists {
                name: "ws1".to_string()
            })
        );
    }

    #[test]
    fn add_or_replace_returns_previous() {
        let ads = AnalysisDataService::new();
        let first = handle(1.0);
        ads.add("ws", first.clone()).unwrap();
        let previous = ads.add_or_replace("ws", handle(2.0)).unwrap();
        assert!(previous.unwrap().ptr_eq(&first));
    }

    #[test]
    fn retrieve_missing_is_not_found() {
        let ads = AnalysisDataService::new();
        assert!(matches!(
            ads.retrieve("nope"),
            Err(WorkspaceError::NotFound { .. })
        ));
    }

    #[test]
    fn invalid_names_rejected() {
        let ads = AnalysisDataService::new();
        for name in ["", "a b", "a-b", "x.y", "ws?"] {
            assert!(
                matches!(ads.add(name, handle(0.0)), Err(WorkspaceError::InvalidName { .. })),
                "{name:?} should be rejected"
            );
        }
        assert!(ads.add("valid_Name_2", handle(0.0)).is_ok());
    }

    #[test]
    fn rename_moves_handle() {
        let ads = AnalysisDataService::new();
        let ws = handle(1.0);
        ads.add("old", ws.clone()).unwrap();
        ads.rename("old", "new").unwrap();
        assert!(!ads.contains("old"));
        assert!(ads.retrieve("new").unwrap().ptr_eq(&ws));
    }

    #[test]
    fn rename_onto_existing_keeps_source() {
        let ads = AnalysisDataService::new();
        ads.add("a", handle(1.0)).unwrap();
        ads.add("b", handle(2.0)).unwrap();
        assert!(ads.rename("a", "b").is_err());
        assert!(ads.contains("a"));
        assert!(ads.contains("b"));
    }

    #[test]
    fn names_sorted_and_clear() {
        let ads = AnalysisDataService::new();
        ads.add("zeta", handle(1.0)).unwrap();
        ads.add("alpha", handle(1.0)).unwrap();
        assert_eq!(ads.names(), vec!["alpha".to_string(), "zeta".to_string()]);
        ads.clear();
        assert!(ads.is_empty());
    }

    #[test]
    fn summaries_describe_workspaces() {
        let ads = AnalysisDataService::new();
        ads.add("single", handle(1.0)).unwrap();
        let summaries = ads.summaries();
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].workspace_type, "WorkspaceSingleValue");
        assert_eq!(summaries[0].histogram_count, 1);
    }

    proptest::proptest! {
        #[test]
        fn plain_names_store_and_retrieve(name in "[A-Za-z_][A-Za-z0-9_]{0,24}") {
            let ads = AnalysisDataService::new();
            ads.add(&name, handle(3.0)).unwrap();
            proptest::prop_assert!(ads.retrieve(&name).is_ok());
            proptest::prop_assert_eq!(ads.names(), vec![name]);
        }

        #[test]
        fn reserved_characters_rejected(
            prefix in "[a-z]{0,5}",
            index in 0..ILLEGAL_CHARACTERS.len(),
        ) {
            let c = ILLEGAL_CHARACTERS.as_bytes()[index] as char;
            let name = format!("{prefix}{c}x");
            let is_invalid = matches!(
                AnalysisDataService::validate_name(&name),
                Err(WorkspaceError::InvalidName { .. })
            );
            proptest::prop_assert!(is_invalid);
        }
    }
}
