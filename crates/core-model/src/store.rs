use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use thiserror::Error;
use tracing::trace;

use crate::{DocumentId, PatternDocument};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("no document with id {0}")]
    NotFound(DocumentId),
    #[error("failed to parse document: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to serialize document: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Key-addressed store of pattern documents.
pub trait PatternRepository: Send + Sync {
    /// Insert (assigning an id when absent) or overwrite; returns the stored document.
    fn save(&self, doc: PatternDocument) -> PatternDocument;
    fn get(&self, id: DocumentId) -> Option<PatternDocument>;
    fn update(
        &self,
        id: DocumentId,
        transform: &mut dyn FnMut(&mut PatternDocument),
    ) -> Result<PatternDocument, StoreError>;
    fn delete(&self, id: DocumentId) -> Result<(), StoreError>;
    /// All documents in id order.
    fn get_all(&self) -> Vec<PatternDocument>;
}

#[derive(Debug, Default)]
struct Inner {
    next_id: u64,
    docs: BTreeMap<DocumentId, PatternDocument>,
}

impl Inner {
    fn allocate(&mut self) -> DocumentId {
        let mut candidate = self.next_id.max(1);
        if self.docs.contains_key(&DocumentId(candidate)) {
            // Only reachable once the counter saturated; reuse the lowest free key.
            candidate = (1..u64::MAX)
                .find(|n| !self.docs.contains_key(&DocumentId(*n)))
                .unwrap_or(candidate);
        }
        self.next_id = candidate.saturating_add(1);
        DocumentId(candidate)
    }
}

#[derive(Debug, Default)]
pub struct InMemoryPatternRepository {
    inner: Mutex<Inner>,
}

impl InMemoryPatternRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl PatternRepository for InMemoryPatternRepository {
    fn save(&self, mut doc: PatternDocument) -> PatternDocument {
        let mut inner = self.lock();
        let id = match doc.id {
            Some(id) => {
                inner.next_id = inner.next_id.max(id.0.saturating_add(1));
                id
            }
            None => inner.allocate(),
        };
        doc.id = Some(id);
        inner.docs.insert(id, doc.clone());
        trace!(target: "model.store", %id, total = inner.docs.len(), "save");
        doc
    }

    fn get(&self, id: DocumentId) -> Option<PatternDocument> {
        self.lock().docs.get(&id).cloned()
    }

    fn update(
        &self,
        id: DocumentId,
        transform: &mut dyn FnMut(&mut PatternDocument),
    ) -> Result<PatternDocument, StoreError> {
        let mut inner = self.lock();
        let doc = inner.docs.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        transform(doc);
        // The key is authoritative; a transform cannot move a document.
        doc.id = Some(id);
        trace!(target: "model.store", %id, "update");
        Ok(doc.clone())
    }

    fn delete(&self, id: DocumentId) -> Result<(), StoreError> {
        let mut inner = self.lock();
        inner.docs.remove(&id).ok_or(StoreError::NotFound(id))?;
        trace!(target: "model.store", %id, total = inner.docs.len(), "delete");
        Ok(())
    }

    fn get_all(&self) -> Vec<PatternDocument> {
        self.lock().docs.values().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_pattern::{MatchMode, TestCase};

    fn doc(title: &str) -> PatternDocument {
        PatternDocument::new(title, "a+", vec![TestCase::new("t", "aa", MatchMode::Any)])
    }

    #[test]
    fn save_assigns_increasing_ids() {
        let repo = InMemoryPatternRepository::new();
        let a = repo.save(doc("a"));
        let b = repo.save(doc("b"));
        assert_eq!(a.id, Some(DocumentId(1)));
        assert_eq!(b.id, Some(DocumentId(2)));
        assert_eq!(repo.get(DocumentId(2)).map(|d| d.title), Some("b".into()));
    }

    #[test]
    fn save_with_id_overwrites() {
        let repo = InMemoryPatternRepository::new();
        let mut a = repo.save(doc("a"));
        a.pattern = "b+".into();
        repo.save(a.clone());
        assert_eq!(repo.get_all().len(), 1);
        assert_eq!(repo.get(a.id.unwrap()).unwrap().pattern, "b+");
        // Explicit ids push the allocator past them.
        let c = repo.save(PatternDocument {
            id: Some(DocumentId(10)),
            ..doc("c")
        });
        assert_eq!(c.id, Some(DocumentId(10)));
        assert_eq!(repo.save(doc("d")).id, Some(DocumentId(11)));
    }

    #[test]
    fn explicit_max_id_does_not_overflow_allocator() {
        let repo = InMemoryPatternRepository::new();
        let top = repo.save(PatternDocument {
            id: Some(DocumentId(u64::MAX)),
            ..doc("top")
        });
        assert_eq!(top.id, Some(DocumentId(u64::MAX)));
        let next = repo.save(doc("next"));
        assert_eq!(next.id, Some(DocumentId(1)));
        assert_eq!(repo.save(doc("after")).id, Some(DocumentId(2)));
        assert_eq!(repo.get_all().len(), 3);
        assert_eq!(repo.get(DocumentId(u64::MAX)).unwrap().title, "top");
    }

    #[test]
    fn update_applies_transform_and_pins_id() {
        let repo = InMemoryPatternRepository::new();
        let id = repo.save(doc("a")).id.unwrap();
        let updated = repo
            .update(id, &mut |d: &mut PatternDocument| {
                d.title = "renamed".into();
                d.id = Some(DocumentId(99));
            })
            .unwrap();
        assert_eq!(updated.title, "renamed");
        assert_eq!(updated.id, Some(id));
        assert!(repo.get(DocumentId(99)).is_none());
    }

    #[test]
    fn unknown_ids_report_not_found() {
        let repo = InMemoryPatternRepository::new();
        assert!(matches!(
            repo.update(DocumentId(7), &mut |_: &mut PatternDocument| {}),
            Err(StoreError::NotFound(DocumentId(7)))
        ));
        assert!(matches!(
            repo.delete(DocumentId(7)),
            Err(StoreError::NotFound(_))
        ));
        let id = repo.save(doc("x")).id.unwrap();
        repo.delete(id).unwrap();
        assert!(repo.get(id).is_none());
        assert!(repo.get_all().is_empty());
    }
}
