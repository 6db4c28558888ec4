//! In-memory collection
//!
//! Documents live in insertion order inside a `parking_lot::RwLock`, which
//! gives every find its natural order for tie-breaking. Primary keys are
//! tracked in a side set keyed by their canonical JSON rendering.
//!
//! Writes are all-or-nothing: a batch is validated against the `_id` set and
//! every unique index before the first document is committed.
//!
//! Dropping clears a collection in place instead of discarding it, so every
//! handle to one name keeps addressing one collection. A dropped collection
//! is unlisted until it is requested again or written to.

use std::collections::HashSet;

use async_trait::async_trait;
use docrepo_core::{
    CancellationToken, DriverError, DriverResult, Filter, FindOptions, IndexModel, JsonValue,
    StoredGroup, UpdateDefinition, UpdateResult, ID_FIELD, ID_INDEX_NAME,
};
use parking_lot::RwLock;
use serde_json::Number;
use tracing::{debug, trace};

use super::eval;
use crate::traits::CollectionDriver;

#[derive(Debug, Default)]
struct CollectionState {
    documents: Vec<JsonValue>,
    ids: HashSet<String>,
    indexes: Vec<IndexModel>,
    dropped: bool,
}

/// One physical collection of a [`MemoryClient`](super::MemoryClient)
#[derive(Debug)]
pub struct MemoryCollection {
    name: String,
    state: RwLock<CollectionState>,
}

fn check_cancel(cancel: Option<&CancellationToken>) -> DriverResult<()> {
    match cancel {
        Some(token) if token.is_cancelled() => Err(DriverError::Cancelled),
        _ => Ok(()),
    }
}

fn id_key(doc: &JsonValue) -> DriverResult<String> {
    match doc.get(ID_FIELD) {
        Some(id) if !id.is_null() => Ok(id.to_string()),
        _ => Err(DriverError::Validation(format!(
            "document is missing the '{}' field",
            ID_FIELD
        ))),
    }
}

fn ensure_object(doc: &JsonValue) -> DriverResult<()> {
    if doc.is_object() {
        Ok(())
    } else {
        Err(DriverError::Validation(
            "documents must be JSON objects".to_string(),
        ))
    }
}

/// Canonical key of `doc` under a unique index
///
/// `None` when the index does not enforce uniqueness for this document.
fn unique_key(model: &IndexModel, doc: &JsonValue) -> Option<String> {
    if !model.is_unique() || !model.keys().iter().all(|(_, kind)| kind.supports_unique()) {
        return None;
    }
    let values: Vec<Option<&JsonValue>> = model
        .keys()
        .iter()
        .map(|(field, _)| eval::get_path(doc, field))
        .collect();
    if model.options().sparse && values.iter().all(Option::is_none) {
        return None;
    }
    let rendered: Vec<String> = values
        .iter()
        .map(|v| v.map_or_else(|| "null".to_string(), |v| v.to_string()))
        .collect();
    Some(rendered.join("|"))
}

impl MemoryCollection {
    /// Empty collection
    pub fn new(name: impl Into<String>) -> Self {
        MemoryCollection {
            name: name.into(),
            state: RwLock::new(CollectionState::default()),
        }
    }

    /// Number of stored documents
    pub fn len(&self) -> usize {
        self.state.read().documents.len()
    }

    /// True if no document is stored
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// True between a drop and the next request or write
    pub fn is_dropped(&self) -> bool {
        self.state.read().dropped
    }

    /// Remove every document and secondary index
    ///
    /// Returns `false` if the collection was already dropped.
    pub(crate) fn drop_in_place(&self) -> bool {
        let mut state = self.state.write();
        if state.dropped {
            return false;
        }
        state.documents.clear();
        state.ids.clear();
        state.indexes.clear();
        state.dropped = true;
        true
    }

    /// Bring a dropped collection back; `true` if it was dropped
    pub(crate) fn revive(&self) -> bool {
        std::mem::replace(&mut self.state.write().dropped, false)
    }

    fn duplicate(&self, index: &str, key: String) -> DriverError {
        DriverError::DuplicateKey {
            collection: self.name.clone(),
            index: index.to_string(),
            key,
        }
    }

    /// Check `changed` documents against every unique index
    ///
    /// `changed` pairs a document with the position it replaces, if any.
    fn ensure_unique(
        &self,
        state: &CollectionState,
        changed: &[(Option<usize>, &JsonValue)],
    ) -> DriverResult<()> {
        for model in state.indexes.iter().filter(|m| m.is_unique()) {
            let replaced: HashSet<usize> = changed.iter().filter_map(|(pos, _)| *pos).collect();
            let mut seen: HashSet<String> = state
                .documents
                .iter()
                .enumerate()
                .filter(|(i, _)| !replaced.contains(i))
                .filter_map(|(_, doc)| unique_key(model, doc))
                .collect();
            for (_, doc) in changed {
                if let Some(key) = unique_key(model, doc) {
                    if !seen.insert(key.clone()) {
                        return Err(self.duplicate(&model.name(), key));
                    }
                }
            }
        }
        Ok(())
    }

    fn matching_positions(state: &CollectionState, filter: &Filter, first_only: bool) -> Vec<usize> {
        let mut positions = Vec::new();
        for (i, doc) in state.documents.iter().enumerate() {
            if eval::matches(filter, doc) {
                positions.push(i);
                if first_only {
                    break;
                }
            }
        }
        positions
    }

    fn apply_updates(
        &self,
        filter: &Filter,
        update: &UpdateDefinition,
        first_only: bool,
    ) -> DriverResult<UpdateResult> {
        eval::validate_filter(filter)?;
        if update.is_empty() {
            return Err(DriverError::InvalidUpdate(
                "update definition is empty".to_string(),
            ));
        }

        let mut state = self.state.write();
        let positions = Self::matching_positions(&state, filter, first_only);

        let mut updated = Vec::with_capacity(positions.len());
        for &pos in &positions {
            let original = &state.documents[pos];
            let mut next = original.clone();
            eval::apply_update(&mut next, update.ops())?;
            if next.get(ID_FIELD) != original.get(ID_FIELD) {
                return Err(DriverError::InvalidUpdate(
                    "the _id field is immutable".to_string(),
                ));
            }
            if next != *original {
                updated.push((pos, next));
            }
        }

        let changed: Vec<(Option<usize>, &JsonValue)> =
            updated.iter().map(|(pos, doc)| (Some(*pos), doc)).collect();
        self.ensure_unique(&state, &changed)?;

        let modified = updated.len() as u64;
        for (pos, doc) in updated {
            state.documents[pos] = doc;
        }
        trace!(collection = %self.name, matched = positions.len(), modified, "update applied");
        Ok(UpdateResult {
            matched: positions.len() as u64,
            modified,
        })
    }

    fn delete_matching(&self, filter: &Filter, first_only: bool) -> DriverResult<u64> {
        eval::validate_filter(filter)?;
        let mut state = self.state.write();
        let positions = Self::matching_positions(&state, filter, first_only);
        // Remove back to front so earlier positions stay valid
        for &pos in positions.iter().rev() {
            let doc = state.documents.remove(pos);
            if let Ok(key) = id_key(&doc) {
                state.ids.remove(&key);
            }
        }
        Ok(positions.len() as u64)
    }
}

#[async_trait]
impl CollectionDriver for MemoryCollection {
    fn name(&self) -> &str {
        &self.name
    }

    async fn insert_one(
        &self,
        document: JsonValue,
        cancel: Option<&CancellationToken>,
    ) -> DriverResult<()> {
        self.insert_many(vec![document], cancel).await
    }

    async fn insert_many(
        &self,
        documents: Vec<JsonValue>,
        cancel: Option<&CancellationToken>,
    ) -> DriverResult<()> {
        check_cancel(cancel)?;
        let mut state = self.state.write();

        let mut batch_ids = HashSet::with_capacity(documents.len());
        for doc in &documents {
            ensure_object(doc)?;
            let key = id_key(doc)?;
            if state.ids.contains(&key) || !batch_ids.insert(key.clone()) {
                return Err(self.duplicate(ID_INDEX_NAME, key));
            }
        }
        let changed: Vec<(Option<usize>, &JsonValue)> =
            documents.iter().map(|doc| (None, doc)).collect();
        self.ensure_unique(&state, &changed)?;

        trace!(collection = %self.name, count = documents.len(), "insert");
        state.dropped = false;
        state.ids.extend(batch_ids);
        state.documents.extend(documents);
        Ok(())
    }

    async fn find(
        &self,
        filter: &Filter,
        options: &FindOptions,
        cancel: Option<&CancellationToken>,
    ) -> DriverResult<Vec<JsonValue>> {
        check_cancel(cancel)?;
        eval::validate_filter(filter)?;
        let state = self.state.read();

        let mut matched: Vec<JsonValue> = state
            .documents
            .iter()
            .filter(|doc| eval::matches(filter, doc))
            .cloned()
            .collect();
        drop(state);

        if let Some(sort) = &options.sort {
            eval::sort_documents(&mut matched, sort);
        }

        let skip = usize::try_from(options.skip).unwrap_or(usize::MAX);
        let limit = options
            .limit
            .map_or(usize::MAX, |l| usize::try_from(l).unwrap_or(usize::MAX));
        let page = matched.into_iter().skip(skip).take(limit);

        Ok(match &options.projection {
            Some(projection) => page.map(|doc| eval::project(&doc, projection)).collect(),
            None => page.collect(),
        })
    }

    async fn count(
        &self,
        filter: &Filter,
        limit: Option<u64>,
        cancel: Option<&CancellationToken>,
    ) -> DriverResult<u64> {
        check_cancel(cancel)?;
        eval::validate_filter(filter)?;
        let state = self.state.read();
        let limit = limit.unwrap_or(u64::MAX);
        let mut count = 0u64;
        for doc in &state.documents {
            if count >= limit {
                break;
            }
            if eval::matches(filter, doc) {
                count += 1;
            }
        }
        Ok(count)
    }

    async fn replace_one(
        &self,
        filter: &Filter,
        mut replacement: JsonValue,
        cancel: Option<&CancellationToken>,
    ) -> DriverResult<UpdateResult> {
        check_cancel(cancel)?;
        eval::validate_filter(filter)?;
        ensure_object(&replacement)?;

        let mut state = self.state.write();
        let Some(&pos) = Self::matching_positions(&state, filter, true).first() else {
            return Ok(UpdateResult::default());
        };

        let original_id = state.documents[pos].get(ID_FIELD).cloned();
        match (replacement.get(ID_FIELD), &original_id) {
            (None, Some(id)) => {
                eval::set_path(&mut replacement, ID_FIELD, id.clone())?;
            }
            (Some(new_id), Some(old_id)) if new_id != old_id => {
                return Err(DriverError::InvalidUpdate(
                    "the _id field is immutable".to_string(),
                ));
            }
            _ => {}
        }

        if replacement == state.documents[pos] {
            return Ok(UpdateResult {
                matched: 1,
                modified: 0,
            });
        }
        self.ensure_unique(&state, &[(Some(pos), &replacement)])?;
        state.documents[pos] = replacement;
        Ok(UpdateResult {
            matched: 1,
            modified: 1,
        })
    }

    async fn update_one(
        &self,
        filter: &Filter,
        update: &UpdateDefinition,
        cancel: Option<&CancellationToken>,
    ) -> DriverResult<UpdateResult> {
        check_cancel(cancel)?;
        self.apply_updates(filter, update, true)
    }

    async fn update_many(
        &self,
        filter: &Filter,
        update: &UpdateDefinition,
        cancel: Option<&CancellationToken>,
    ) -> DriverResult<UpdateResult> {
        check_cancel(cancel)?;
        self.apply_updates(filter, update, false)
    }

    async fn delete_one(
        &self,
        filter: &Filter,
        cancel: Option<&CancellationToken>,
    ) -> DriverResult<u64> {
        check_cancel(cancel)?;
        self.delete_matching(filter, true)
    }

    async fn delete_many(
        &self,
        filter: &Filter,
        cancel: Option<&CancellationToken>,
    ) -> DriverResult<u64> {
        check_cancel(cancel)?;
        self.delete_matching(filter, false)
    }

    async fn sum(
        &self,
        filter: &Filter,
        field: &str,
        cancel: Option<&CancellationToken>,
    ) -> DriverResult<JsonValue> {
        check_cancel(cancel)?;
        eval::validate_filter(filter)?;
        let state = self.state.read();

        // `int_sum` is None once the integer total has overflowed
        let mut int_sum: Option<i64> = Some(0);
        let mut all_integers = true;
        let mut float_sum = 0f64;
        for doc in state.documents.iter().filter(|doc| eval::matches(filter, doc)) {
            if let Some(JsonValue::Number(n)) = eval::get_path(doc, field) {
                match n.as_i64() {
                    Some(v) => int_sum = int_sum.and_then(|acc| acc.checked_add(v)),
                    None => all_integers = false,
                }
                float_sum += n.as_f64().unwrap_or(0.0);
            }
        }

        if all_integers {
            return match int_sum {
                Some(total) => Ok(JsonValue::Number(total.into())),
                None => Err(DriverError::Validation(format!(
                    "sum of '{}' overflows a 64-bit integer",
                    field
                ))),
            };
        }
        Number::from_f64(float_sum)
            .map(JsonValue::Number)
            .ok_or_else(|| DriverError::Internal("sum is not a finite number".to_string()))
    }

    async fn group(
        &self,
        filter: &Filter,
        field: &str,
        cancel: Option<&CancellationToken>,
    ) -> DriverResult<Vec<StoredGroup>> {
        check_cancel(cancel)?;
        eval::validate_filter(filter)?;
        let state = self.state.read();

        let mut groups: Vec<StoredGroup> = Vec::new();
        for doc in state.documents.iter().filter(|doc| eval::matches(filter, doc)) {
            let key = eval::get_path(doc, field).cloned().unwrap_or(JsonValue::Null);
            match groups
                .iter_mut()
                .find(|g| eval::compare_values(&g.key, &key).is_eq())
            {
                Some(group) => group.documents.push(doc.clone()),
                None => groups.push(StoredGroup {
                    key,
                    documents: vec![doc.clone()],
                }),
            }
        }
        Ok(groups)
    }

    async fn create_index(
        &self,
        model: IndexModel,
        cancel: Option<&CancellationToken>,
    ) -> DriverResult<String> {
        check_cancel(cancel)?;
        if model.keys().is_empty() {
            return Err(DriverError::Validation(
                "an index needs at least one key".to_string(),
            ));
        }
        let name = model.name();
        if name == ID_INDEX_NAME {
            return Err(DriverError::IndexConflict(format!(
                "'{}' is reserved for the primary key",
                ID_INDEX_NAME
            )));
        }

        let mut state = self.state.write();
        if let Some(existing) = state.indexes.iter().find(|m| m.name() == name) {
            return if existing.same_keys(&model) && existing.options() == model.options() {
                Ok(name)
            } else {
                Err(DriverError::IndexConflict(format!(
                    "index '{}' already exists with a different definition",
                    name
                )))
            };
        }

        if model.is_unique() {
            let mut seen = HashSet::new();
            for doc in &state.documents {
                if let Some(key) = unique_key(&model, doc) {
                    if !seen.insert(key.clone()) {
                        return Err(self.duplicate(&name, key));
                    }
                }
            }
        }

        debug!(collection = %self.name, index = %name, "index created");
        state.dropped = false;
        state.indexes.push(model);
        Ok(name)
    }

    async fn list_index_names(
        &self,
        cancel: Option<&CancellationToken>,
    ) -> DriverResult<Vec<String>> {
        check_cancel(cancel)?;
        let state = self.state.read();
        let mut names = vec![ID_INDEX_NAME.to_string()];
        names.extend(state.indexes.iter().map(IndexModel::name));
        Ok(names)
    }

    async fn drop_index(&self, name: &str, cancel: Option<&CancellationToken>) -> DriverResult<()> {
        check_cancel(cancel)?;
        if name == ID_INDEX_NAME {
            return Err(DriverError::Validation(
                "the primary-key index cannot be dropped".to_string(),
            ));
        }
        let mut state = self.state.write();
        let before = state.indexes.len();
        state.indexes.retain(|m| m.name() != name);
        if state.indexes.len() == before {
            return Err(DriverError::IndexNotFound(name.to_string()));
        }
        debug!(collection = %self.name, index = %name, "index dropped");
        Ok(())
    }
}
