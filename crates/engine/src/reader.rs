//! Reader: point lookups, scans, extremal queries, aggregation, projection,
//! grouping and sorted pagination
//!
//! All operations are predicate-based: they take a [`Filter`] and a
//! [`Scope`], route to the collection for `(D, scope.partition_key())` and
//! forward the filter unmodified. Absence is reported as `None`, `false`,
//! `0` or an empty `Vec`, never as an error.

use std::sync::Arc;

use docrepo_core::{
    field_value, from_stored, Document, Error, Field, Filter, FindOptions, Grouping, JsonValue,
    Page, Projection, Result, Scope, SortDefinition, SortDirection,
};
use serde::de::DeserializeOwned;
use tracing::trace;

use crate::access::{id_filter, DataAccess};
use crate::resolver::CollectionHandle;

/// Read operations
#[derive(Debug, Clone)]
pub struct Reader {
    access: Arc<DataAccess>,
}

impl Reader {
    /// Reader over shared data access
    pub fn new(access: Arc<DataAccess>) -> Self {
        Reader { access }
    }

    async fn handle<D: Document>(&self, scope: Scope<'_>) -> Result<CollectionHandle> {
        self.access.resolve::<D>(scope.partition_key()).await
    }

    async fn find_stored<D: Document>(
        &self,
        filter: &Filter,
        options: &FindOptions,
        scope: Scope<'_>,
    ) -> Result<Vec<JsonValue>> {
        let handle = self.handle::<D>(scope).await?;
        trace!(collection = handle.name(), "find");
        Ok(handle.driver().find(filter, options, scope.cancel()).await?)
    }

    async fn find_first<D: Document>(
        &self,
        filter: &Filter,
        options: FindOptions,
        scope: Scope<'_>,
    ) -> Result<Option<D>> {
        let found = self.find_stored::<D>(filter, &options.limit(1), scope).await?;
        found.into_iter().next().map(from_stored).transpose()
    }

    // ========================================================================
    // Lookups and scans
    // ========================================================================

    /// Document with the given key
    pub async fn get_by_id<D: Document>(&self, id: &D::Key, scope: Scope<'_>) -> Result<Option<D>> {
        self.find_first(&id_filter::<D>(id)?, FindOptions::new(), scope).await
    }

    /// First matching document in natural order
    pub async fn get_one<D: Document>(&self, filter: &Filter, scope: Scope<'_>) -> Result<Option<D>> {
        self.find_first(filter, FindOptions::new(), scope).await
    }

    /// All matching documents in natural order
    pub async fn get_all<D: Document>(&self, filter: &Filter, scope: Scope<'_>) -> Result<Vec<D>> {
        self.find_stored::<D>(filter, &FindOptions::new(), scope)
            .await?
            .into_iter()
            .map(from_stored)
            .collect()
    }

    /// True if at least one document matches
    pub async fn any<D: Document>(&self, filter: &Filter, scope: Scope<'_>) -> Result<bool> {
        let handle = self.handle::<D>(scope).await?;
        Ok(handle.driver().count(filter, Some(1), scope.cancel()).await? > 0)
    }

    /// Number of matching documents
    pub async fn count<D: Document>(&self, filter: &Filter, scope: Scope<'_>) -> Result<u64> {
        let handle = self.handle::<D>(scope).await?;
        Ok(handle.driver().count(filter, None, scope.cancel()).await?)
    }

    // ========================================================================
    // Extremal queries
    //
    // Sort by the selector and take one. Documents sharing the extremal value
    // come back in natural order, so the first inserted wins.
    // ========================================================================

    /// Matching document with the largest `field`
    pub async fn get_by_max<D: Document, V>(
        &self,
        filter: &Filter,
        field: &Field<V>,
        scope: Scope<'_>,
    ) -> Result<Option<D>> {
        let options = FindOptions::new().sort(SortDefinition::descending(field.name()));
        self.find_first(filter, options, scope).await
    }

    /// Matching document with the smallest `field`
    pub async fn get_by_min<D: Document, V>(
        &self,
        filter: &Filter,
        field: &Field<V>,
        scope: Scope<'_>,
    ) -> Result<Option<D>> {
        let options = FindOptions::new().sort(SortDefinition::ascending(field.name()));
        self.find_first(filter, options, scope).await
    }

    /// Largest value of `field` among matching documents
    pub async fn get_max_value<D: Document, V: DeserializeOwned>(
        &self,
        filter: &Filter,
        field: &Field<V>,
        scope: Scope<'_>,
    ) -> Result<Option<V>> {
        self.extremal_value::<D, V>(filter, field, SortDirection::Descending, scope)
            .await
    }

    /// Smallest value of `field` among matching documents
    pub async fn get_min_value<D: Document, V: DeserializeOwned>(
        &self,
        filter: &Filter,
        field: &Field<V>,
        scope: Scope<'_>,
    ) -> Result<Option<V>> {
        self.extremal_value::<D, V>(filter, field, SortDirection::Ascending, scope)
            .await
    }

    async fn extremal_value<D: Document, V: DeserializeOwned>(
        &self,
        filter: &Filter,
        field: &Field<V>,
        direction: SortDirection,
        scope: Scope<'_>,
    ) -> Result<Option<V>> {
        let options = FindOptions::new()
            .sort(SortDefinition::by(field.name(), direction))
            .projection(Projection::include([field.name()]).without_id())
            .limit(1);
        let found = self.find_stored::<D>(filter, &options, scope).await?;
        match found.first().and_then(|doc| field_value(doc, field.name())) {
            Some(value) => Ok(Some(serde_json::from_value(value.clone())?)),
            None => Ok(None),
        }
    }

    // ========================================================================
    // Aggregation and projection
    // ========================================================================

    /// Sum of `field` over matching documents
    ///
    /// Zero when nothing matches.
    pub async fn sum_by<D: Document, V: DeserializeOwned>(
        &self,
        filter: &Filter,
        field: &Field<V>,
        scope: Scope<'_>,
    ) -> Result<V> {
        let handle = self.handle::<D>(scope).await?;
        let total = handle
            .driver()
            .sum(filter, field.name(), scope.cancel())
            .await?;
        Ok(serde_json::from_value(total)?)
    }

    /// First matching document shaped by `projection` into `P`
    pub async fn project_one<D: Document, P: DeserializeOwned>(
        &self,
        filter: &Filter,
        projection: &Projection,
        scope: Scope<'_>,
    ) -> Result<Option<P>> {
        let options = FindOptions::new().projection(projection.clone()).limit(1);
        let found = self.find_stored::<D>(filter, &options, scope).await?;
        found
            .into_iter()
            .next()
            .map(|value| serde_json::from_value(value).map_err(Error::from))
            .transpose()
    }

    /// Every matching document shaped by `projection` into `P`
    pub async fn project_many<D: Document, P: DeserializeOwned>(
        &self,
        filter: &Filter,
        projection: &Projection,
        scope: Scope<'_>,
    ) -> Result<Vec<P>> {
        let options = FindOptions::new().projection(projection.clone());
        self.find_stored::<D>(filter, &options, scope)
            .await?
            .into_iter()
            .map(|value| serde_json::from_value(value).map_err(Error::from))
            .collect()
    }

    // ========================================================================
    // Grouping
    // ========================================================================

    /// Group every document by `key` and map each group through `project`
    ///
    /// Groups come in first-encountered order. Documents missing the key
    /// field group under `null`, which `K` must be able to represent
    /// (e.g. `Option<_>`).
    pub async fn group_by<D, K, R, F>(&self, key: &Field<K>, project: F, scope: Scope<'_>) -> Result<Vec<R>>
    where
        D: Document,
        K: DeserializeOwned,
        F: Fn(Grouping<K, D>) -> R,
    {
        self.group_by_filtered(&Filter::all(), key, project, scope)
            .await
    }

    /// Group matching documents by `key` and map each group through `project`
    pub async fn group_by_filtered<D, K, R, F>(
        &self,
        filter: &Filter,
        key: &Field<K>,
        project: F,
        scope: Scope<'_>,
    ) -> Result<Vec<R>>
    where
        D: Document,
        K: DeserializeOwned,
        F: Fn(Grouping<K, D>) -> R,
    {
        let handle = self.handle::<D>(scope).await?;
        let groups = handle
            .driver()
            .group(filter, key.name(), scope.cancel())
            .await?;

        let mut projected = Vec::with_capacity(groups.len());
        for group in groups {
            let documents = group
                .documents
                .into_iter()
                .map(from_stored)
                .collect::<Result<Vec<D>>>()?;
            let key = serde_json::from_value(group.key)?;
            projected.push(project(Grouping { key, documents }));
        }
        Ok(projected)
    }

    // ========================================================================
    // Sorted pagination
    // ========================================================================

    /// One page of matching documents sorted by a single field
    pub async fn get_sorted_paginated<D: Document, V>(
        &self,
        filter: &Filter,
        sort_by: &Field<V>,
        ascending: bool,
        page: Page,
        scope: Scope<'_>,
    ) -> Result<Vec<D>> {
        let sort = SortDefinition::by(sort_by.name(), SortDirection::from_ascending(ascending));
        self.get_sorted_paginated_by(filter, &sort, page, scope)
            .await
    }

    /// One page of matching documents sorted by a full sort definition
    pub async fn get_sorted_paginated_by<D: Document>(
        &self,
        filter: &Filter,
        sort: &SortDefinition,
        page: Page,
        scope: Scope<'_>,
    ) -> Result<Vec<D>> {
        let options = FindOptions::new()
            .sort(sort.clone())
            .skip(page.skip)
            .limit(page.take);
        self.find_stored::<D>(filter, &options, scope)
            .await?
            .into_iter()
            .map(from_stored)
            .collect()
    }
}
