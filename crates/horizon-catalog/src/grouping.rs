//! Hierarchical grouping traversal.
//!
//! Given an ordered list of grouping dimensions (annotation names), the
//! traversal builds a tree of folders where each folder is a [`FileQuery`]
//! scoped by the `(dimension, value)` pairs on its ancestor path. Branches
//! whose query resolves to zero rows are pruned; non-leaf folders descend
//! lazily, only when expanded.
//!
//! The tree is a snapshot, rebuilt rather than patched: when the dimension
//! list or the active filter set changes, the whole tree is invalidated,
//! which is simpler to reason about and avoids stale-branch bugs.
//! Expand/collapse state is tracked outside the tree, keyed by each node's
//! canonical query key, so it survives a rebuild as long as the same
//! folders still exist.
//!
//! Every async step checks a [`TraversalToken`] after resuming: a build
//! superseded by a newer one (or torn down by its owner) discards its
//! partial results instead of applying them to stale tree state.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use futures_util::future::{self, BoxFuture};
use parking_lot::Mutex;
use serde_json::Value;

use horizon_catalog_core::{Filter, SortOrder};

use crate::error::{Cancelled, FetchError};
use crate::query::FileQuery;
use crate::source::{GroupingValueSource, RecordSource};

/// Liveness flag for one generation of tree building.
///
/// Cloned into every asynchronous unit of work and checked after each
/// await; once cancelled, a token never becomes live again.
#[derive(Debug, Clone)]
pub struct TraversalToken {
    cancelled: Arc<AtomicBool>,
}

impl TraversalToken {
    fn new() -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Marks every holder of this token as stale.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Returns true if the work holding this token has been superseded.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// The descent state of a folder node.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeChildren {
    /// The node is collapsed; descent is deferred until expansion.
    Deferred,
    /// The node's surviving children, in value-source order.
    Loaded(Vec<GroupNode>),
    /// The node's count or value fetch failed; the message is retained
    /// for an inline error affordance. Does not affect siblings.
    Failed(String),
}

/// One folder in the grouping tree.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupNode {
    /// The `(dimension, value)` pairs from the root to this node.
    path: Vec<(String, Value)>,
    query: FileQuery,
    collapsed: bool,
    is_leaf: bool,
    children: NodeChildren,
}

impl GroupNode {
    /// The ancestor path scoping this node's query; empty for the root.
    pub fn path(&self) -> &[(String, Value)] {
        &self.path
    }

    /// Depth in the tree; the root is at depth zero.
    pub fn depth(&self) -> usize {
        self.path.len()
    }

    /// Returns true for the synthetic root node.
    pub fn is_root(&self) -> bool {
        self.path.is_empty()
    }

    /// The grouping value this folder represents, if not the root.
    pub fn label(&self) -> Option<&Value> {
        self.path.last().map(|(_, value)| value)
    }

    /// The query handle scoped to this node's ancestor path.
    pub fn query(&self) -> &FileQuery {
        &self.query
    }

    /// Returns true if the node is collapsed.
    pub fn collapsed(&self) -> bool {
        self.collapsed
    }

    /// Returns true if this node sits at the last grouping dimension and
    /// therefore wraps a file list rather than further folders.
    pub fn is_leaf(&self) -> bool {
        self.is_leaf
    }

    /// The node's descent state.
    pub fn children(&self) -> &NodeChildren {
        &self.children
    }

    /// Returns true if this branch's fetch failed.
    pub fn is_errored(&self) -> bool {
        matches!(self.children, NodeChildren::Failed(_))
    }
}

/// Builds grouping trees over a record source and a grouping value source.
///
/// # Example
///
/// ```ignore
/// use horizon_catalog::GroupTraversal;
///
/// let mut traversal = GroupTraversal::new(records, values)
///     .with_dimensions(vec!["Cell Line".into(), "Gene".into()]);
///
/// let tree = traversal.build().await?;
/// if let Some(first) = tree.loaded_children().first() {
///     traversal.expand(first.query().canonical_key());
///     let subtree = traversal.build_children(first).await?;
/// }
/// ```
pub struct GroupTraversal {
    dimensions: Vec<String>,
    filters: Vec<Filter>,
    sort: Vec<SortOrder>,
    records: Arc<dyn RecordSource>,
    values: Arc<dyn GroupingValueSource>,
    /// Canonical keys of expanded folders. Survives rebuilds; replaced
    /// wholesale when dimensions or filters change.
    expanded: HashSet<String>,
    /// Emptiness results keyed by canonical query key, at every depth.
    emptiness: Mutex<HashMap<String, bool>>,
    /// The current build generation's liveness flag.
    token: Mutex<TraversalToken>,
}

impl GroupTraversal {
    /// Creates a traversal with no dimensions, no filters, and no sort.
    pub fn new(records: Arc<dyn RecordSource>, values: Arc<dyn GroupingValueSource>) -> Self {
        Self {
            dimensions: Vec::new(),
            filters: Vec::new(),
            sort: Vec::new(),
            records,
            values,
            expanded: HashSet::new(),
            emptiness: Mutex::new(HashMap::new()),
            token: Mutex::new(TraversalToken::new()),
        }
    }

    /// Sets the ordered grouping dimensions.
    pub fn with_dimensions(mut self, dimensions: Vec<String>) -> Self {
        self.dimensions = dimensions;
        self
    }

    /// Sets the base filter set applied to every folder query.
    pub fn with_filters(mut self, filters: Vec<Filter>) -> Self {
        self.filters = filters;
        self
    }

    /// Sets the sort order carried by every folder query.
    pub fn with_sort(mut self, sort: Vec<SortOrder>) -> Self {
        self.sort = sort;
        self
    }

    /// The ordered grouping dimensions.
    pub fn dimensions(&self) -> &[String] {
        &self.dimensions
    }

    /// The base filter set.
    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    /// Replaces the grouping dimensions, invalidating in-flight builds,
    /// the expanded set, and the emptiness cache.
    pub fn set_dimensions(&mut self, dimensions: Vec<String>) {
        self.dimensions = dimensions;
        self.invalidate();
    }

    /// Replaces the base filters, invalidating in-flight builds, the
    /// expanded set, and the emptiness cache.
    pub fn set_filters(&mut self, filters: Vec<Filter>) {
        self.filters = filters;
        self.invalidate();
    }

    /// Replaces the sort order. Folder canonical keys change with it, so
    /// this invalidates exactly like a filter change.
    pub fn set_sort(&mut self, sort: Vec<SortOrder>) {
        self.sort = sort;
        self.invalidate();
    }

    /// Cancels any in-flight build without changing configuration.
    /// Called when the owning component is torn down.
    pub fn cancel(&self) {
        self.token.lock().cancel();
    }

    /// Marks a folder as expanded. `key` is the node's canonical query key.
    pub fn expand(&mut self, key: &str) {
        self.expanded.insert(key.to_string());
    }

    /// Marks a folder as collapsed.
    pub fn collapse(&mut self, key: &str) {
        self.expanded.remove(key);
    }

    /// Returns true if the folder with the given canonical key is expanded.
    pub fn is_expanded(&self, key: &str) -> bool {
        self.expanded.contains(key)
    }

    /// Builds a fresh tree snapshot, superseding any in-flight build.
    ///
    /// The root node always exists; its children are the surviving
    /// folders of the first dimension. Returns [`Cancelled`] if a newer
    /// build (or [`GroupTraversal::cancel`]) supersedes this one before it
    /// completes.
    pub async fn build(&self) -> Result<GroupNode, Cancelled> {
        let token = self.refresh_token();
        tracing::debug!(
            target: "horizon_catalog::grouping",
            "Building grouping tree over {:?}",
            self.dimensions
        );

        let query = FileQuery::new(
            Arc::clone(&self.records),
            self.filters.clone(),
            self.sort.clone(),
        );
        let is_leaf = self.dimensions.is_empty();
        let children = if is_leaf {
            NodeChildren::Loaded(Vec::new())
        } else {
            self.load_children(&[], &token).await?
        };

        Ok(GroupNode {
            path: Vec::new(),
            query,
            collapsed: false,
            is_leaf,
            children,
        })
    }

    /// Builds the children of one node, for lazy descent after expansion.
    ///
    /// Runs under the current build generation: a token captured when the
    /// descent starts, checked after every await.
    pub async fn build_children(&self, node: &GroupNode) -> Result<NodeChildren, Cancelled> {
        if node.is_leaf() {
            return Ok(NodeChildren::Loaded(Vec::new()));
        }
        let token = self.token.lock().clone();
        self.load_children(node.path(), &token).await
    }

    fn refresh_token(&self) -> TraversalToken {
        let mut slot = self.token.lock();
        slot.cancel();
        *slot = TraversalToken::new();
        slot.clone()
    }

    fn invalidate(&mut self) {
        self.token.lock().cancel();
        self.expanded.clear();
        self.emptiness.lock().clear();
    }

    /// The folder query for an ancestor path: the base filters plus one
    /// filter per path step. A null grouping value maps to a "carries no
    /// value" filter rather than equality with null.
    fn query_for_path(&self, path: &[(String, Value)]) -> FileQuery {
        let mut filters = self.filters.clone();
        for (dimension, value) in path {
            if value.is_null() {
                filters.push(Filter::no_value(dimension.clone()));
            } else {
                filters.push(Filter::equals(dimension.clone(), value.clone()));
            }
        }
        FileQuery::new(Arc::clone(&self.records), filters, self.sort.clone())
    }

    /// Loads the folders one level below `path`, pruning empty branches.
    fn load_children<'a>(
        &'a self,
        path: &'a [(String, Value)],
        token: &'a TraversalToken,
    ) -> BoxFuture<'a, Result<NodeChildren, Cancelled>> {
        Box::pin(async move {
            // Checked on entry as well: a descent requested for a node of
            // a superseded configuration must not touch the new one.
            if token.is_cancelled() {
                return Err(Cancelled);
            }
            let depth = path.len();
            let dimension = self.dimensions[depth].clone();

            let fetched = if depth == 0 {
                self.values
                    .fetch_root_values(&self.dimensions, &self.filters)
                    .await
            } else {
                self.values
                    .fetch_values_under_path(&self.dimensions, path, &self.filters)
                    .await
            };
            if token.is_cancelled() {
                return Err(Cancelled);
            }

            let candidates = match fetched {
                Ok(values) => values,
                Err(err) => {
                    tracing::warn!(
                        target: "horizon_catalog::grouping",
                        "Loading values of '{dimension}' under {} failed: {err}",
                        path_label(path)
                    );
                    return Ok(NodeChildren::Failed(err.to_string()));
                }
            };

            // Each branch is awaited independently: a failure inside one
            // becomes that node's error state and never poisons siblings.
            let built = future::try_join_all(candidates.into_iter().map(|value| {
                let mut child_path = path.to_vec();
                child_path.push((dimension.clone(), value));
                self.build_node(child_path, token)
            }))
            .await?;

            Ok(NodeChildren::Loaded(built.into_iter().flatten().collect()))
        })
    }

    /// Builds one folder node, returning `None` if the branch is pruned.
    fn build_node<'a>(
        &'a self,
        path: Vec<(String, Value)>,
        token: &'a TraversalToken,
    ) -> BoxFuture<'a, Result<Option<GroupNode>, Cancelled>> {
        Box::pin(async move {
            let query = self.query_for_path(&path);
            let is_leaf = path.len() == self.dimensions.len();

            let empty = self.check_empty(&query).await;
            if token.is_cancelled() {
                return Err(Cancelled);
            }

            match empty {
                // Pruned: resolves to zero rows.
                Ok(true) => return Ok(None),
                Ok(false) => {}
                Err(err) => {
                    // Errored branches stay visible, collapsed, with the
                    // failure on the node.
                    tracing::warn!(
                        target: "horizon_catalog::grouping",
                        "Count for folder {} failed: {err}",
                        path_label(&path)
                    );
                    return Ok(Some(GroupNode {
                        path,
                        query,
                        collapsed: true,
                        is_leaf,
                        children: NodeChildren::Failed(err.to_string()),
                    }));
                }
            }

            let collapsed = !self.expanded.contains(query.canonical_key());
            let children = if is_leaf {
                NodeChildren::Loaded(Vec::new())
            } else if collapsed {
                NodeChildren::Deferred
            } else {
                let loaded = self.load_children(&path, token).await?;
                if matches!(&loaded, NodeChildren::Loaded(children) if children.is_empty()) {
                    // An expanded intermediate folder with no viable
                    // descendants does not appear.
                    return Ok(None);
                }
                loaded
            };

            Ok(Some(GroupNode {
                path,
                query,
                collapsed,
                is_leaf,
                children,
            }))
        })
    }

    /// Emptiness of a folder query, cached by canonical key at every depth.
    async fn check_empty(&self, query: &FileQuery) -> Result<bool, FetchError> {
        let cached = self.emptiness.lock().get(query.canonical_key()).copied();
        if let Some(empty) = cached {
            return Ok(empty);
        }
        let count = query.total_count().await?;
        let empty = count == 0;
        self.emptiness
            .lock()
            .insert(query.canonical_key().to_string(), empty);
        Ok(empty)
    }
}

impl GroupNode {
    /// Convenience accessor: the loaded children, or an empty slice while
    /// deferred or errored.
    pub fn loaded_children(&self) -> &[GroupNode] {
        match &self.children {
            NodeChildren::Loaded(children) => children,
            _ => &[],
        }
    }
}

fn path_label(path: &[(String, Value)]) -> String {
    if path.is_empty() {
        return "<root>".to_string();
    }
    path.iter()
        .map(|(dimension, value)| format!("{dimension}={value}"))
        .collect::<Vec<_>>()
        .join("/")
}
