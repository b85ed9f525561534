//! Create/update/delete partitioning of keyed collections.

use serde::Serialize;

use crate::collection::{Keyed, find_by_key};

/// Changes needed to turn the old collection into the new one.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiffRequest<T> {
    /// Entries only present in the new collection. IDs are always unset.
    pub create: Vec<T>,
    /// New payloads for entries whose value changed, carrying the old ID.
    pub update: Vec<T>,
    /// Old entries whose key disappeared from the new collection.
    pub delete: Vec<T>,
}

impl<T> Default for DiffRequest<T> {
    fn default() -> Self {
        Self {
            create: Vec::new(),
            update: Vec::new(),
            delete: Vec::new(),
        }
    }
}

impl<T> DiffRequest<T> {
    pub fn is_empty(&self) -> bool {
        self.create.is_empty() && self.update.is_empty() && self.delete.is_empty()
    }

    pub fn len(&self) -> usize {
        self.create.len() + self.update.len() + self.delete.len()
    }
}

/// Compares `new` (plan) against `old` (state) by key.
///
/// Matching ignores IDs. When a key appears more than once, the first entry in
/// iteration order wins.
pub fn diff<T: Keyed + Clone>(new: &[T], old: &[T]) -> DiffRequest<T> {
    let mut request = DiffRequest::default();

    for item in new {
        if find_by_key(old, &item.key()).is_none() {
            let mut created = item.clone();
            created.set_id(None);
            request.create.push(created);
        }
    }

    for previous in old {
        match find_by_key(new, &previous.key()) {
            None => request.delete.push(previous.clone()),
            Some(item) if !item.same_value(previous) => {
                let mut updated = item.clone();
                updated.set_id(previous.id().map(str::to_string));
                request.update.push(updated);
            }
            Some(_) => {}
        }
    }

    request
}

/// Like [`diff`] but for nullable Terraform attributes, where null means empty.
pub fn diff_nullable<T: Keyed + Clone>(new: Option<&[T]>, old: Option<&[T]>) -> DiffRequest<T> {
    diff(new.unwrap_or_default(), old.unwrap_or_default())
}
