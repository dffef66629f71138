//! Adjuster lists keyed by container type, and the state of a wiring.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};

use crate::adjuster::{AdjusterEntry, AdjusterId, ContainerAdjuster, WiringAdjuster};
use crate::container_type::{ContainerType, parent_key};

/// The key of the root scope. Base wiring adjusters are queued under it, and its adjuster list
/// seeds every container type.
pub(crate) const ROOT_KEY: &str = "";

/// Ancestor-inclusive adjuster lists per container type key.
#[derive(Debug, Clone, Default)]
pub(crate) struct AdjusterLists {
    lists: BTreeMap<String, Vec<AdjusterEntry>>,
}

impl AdjusterLists {
    pub(crate) fn contains_key(&self, key: &str) -> bool {
        self.lists.contains_key(key)
    }

    pub(crate) fn keys(&self) -> impl Iterator<Item = &str> {
        self.lists.keys().map(String::as_str)
    }

    /// Returns the list of `key`, or of its nearest known ancestor.
    pub(crate) fn nearest(&self, key: &str) -> Option<&[AdjusterEntry]> {
        let mut key = Some(key);
        while let Some(current) = key {
            if let Some(list) = self.lists.get(current) {
                return Some(list);
            }
            key = parent_key(current);
        }
        None
    }

    /// Returns the list of `key`, seeding it from the nearest known ancestor if it is unknown.
    pub(crate) fn ensure(&mut self, key: &str) -> &mut Vec<AdjusterEntry> {
        if !self.lists.contains_key(key) {
            let seed = parent_key(key)
                .and_then(|parent| self.nearest(parent))
                .map(<[AdjusterEntry]>::to_vec)
                .unwrap_or_default();
            self.lists.insert(key.to_owned(), seed);
        }
        self.lists.entry(key.to_owned()).or_default()
    }

    /// Appends `entry` to the list of `key` and of every known descendant of it, skipping lists
    /// that already hold it.
    pub(crate) fn append(&mut self, key: &str, entry: &AdjusterEntry) {
        self.ensure(key);
        let prefix = format!("{key}.");
        for (current, list) in &mut self.lists {
            let affected = current == key || current.starts_with(&prefix);
            if affected && !list.iter().any(|existing| existing.is_same(entry)) {
                list.push(entry.clone());
            }
        }
    }

    /// Merges the lists of `other` into `self`, for every type known to either side.
    pub(crate) fn merge(&mut self, other: &Self) {
        let keys: BTreeSet<String> = self.keys().chain(other.keys()).map(str::to_owned).collect();
        // Keys are sorted, so ancestors are merged before their descendants are seeded.
        for key in keys {
            let incoming = other.nearest(&key).unwrap_or_default();
            let list = self.ensure(&key);
            for entry in incoming {
                if !list.iter().any(|existing| existing.is_same(entry)) {
                    list.push(entry.clone());
                }
            }
        }
    }

    /// Makes every type known to `other` known to `self`.
    pub(crate) fn sync_keys_from(&mut self, other: &Self) {
        for key in other.keys() {
            if !self.contains_key(key) {
                self.ensure(key);
            }
        }
    }

    /// Returns `true` if `key`, one of its ancestors (other than the root), or one of its
    /// descendants is known.
    pub(crate) fn is_known(&self, key: &str) -> bool {
        let mut current = Some(key);
        while let Some(k) = current.filter(|k| !k.is_empty()) {
            if self.lists.contains_key(k) {
                return true;
            }
            current = parent_key(k);
        }

        let prefix = format!("{key}.");
        self.keys().any(|k| k.starts_with(&prefix))
    }
}

/// Whether a wiring adjuster has run for a given wiring state.
#[derive(Debug, Clone, Default)]
pub(crate) enum Resolution {
    #[default]
    Unresolved,
    /// The adjuster ran (or is running), and supplied these lists.
    Resolved(AdjusterLists),
}

/// The complete state of a wiring.
///
/// Public [`Wiring`](crate::Wiring) values hold a frozen copy; each container creation works
/// on a private clone.
#[derive(Debug, Clone, Default)]
pub(crate) struct WiringState {
    container_adjusters: AdjusterLists,
    wiring_adjusters: BTreeMap<String, VecDeque<WiringAdjuster>>,
    supplied: HashMap<AdjusterId, Resolution>,
}

impl WiringState {
    pub(crate) fn register_container_adjuster(
        &mut self,
        container_type: &ContainerType,
        adjuster: ContainerAdjuster,
    ) {
        self.container_adjusters
            .append(&container_type.key(), &AdjusterEntry::Container(adjuster));
    }

    /// Queues `adjuster` under `scope_key` and places its sentinel in every type's list.
    pub(crate) fn register_wiring_adjuster(&mut self, scope_key: &str, adjuster: WiringAdjuster) {
        self.container_adjusters.ensure(scope_key);
        self.container_adjusters
            .append(ROOT_KEY, &AdjusterEntry::Wiring(adjuster.clone()));
        self.enqueue(scope_key, adjuster);
    }

    fn enqueue(&mut self, scope_key: &str, adjuster: WiringAdjuster) {
        self.supplied.entry(adjuster.id()).or_default();
        let queue = self.wiring_adjusters.entry(scope_key.to_owned()).or_default();
        if !queue.iter().any(|queued| queued.ptr_eq(&adjuster)) {
            queue.push_back(adjuster);
        }
    }

    /// Merges another wiring into this one.
    pub(crate) fn import_from(&mut self, other: &Self) {
        self.container_adjusters.merge(&other.container_adjusters);
        self.merge_wiring_adjusters(other);
    }

    fn merge_wiring_adjusters(&mut self, other: &Self) {
        for (scope_key, queue) in &other.wiring_adjusters {
            for adjuster in queue {
                self.enqueue(scope_key, adjuster.clone());
            }
        }
        for (id, resolution) in &other.supplied {
            self.supplied
                .entry(*id)
                .or_insert_with(|| resolution.clone());
        }
    }

    pub(crate) fn is_known(&self, container_type: &ContainerType) -> bool {
        self.container_adjusters.is_known(&container_type.key())
    }

    pub(crate) fn container_types(&self) -> Vec<ContainerType> {
        self.container_adjusters
            .keys()
            .filter_map(|key| key.strip_prefix('.'))
            .filter_map(|name| ContainerType::parse(name).ok())
            .collect()
    }

    /// Pops the next wiring adjuster of `scope_key` that has not run yet, and marks it as
    /// resolved (to nothing, so far) before it runs.
    pub(crate) fn take_unresolved(&mut self, scope_key: &str) -> Option<WiringAdjuster> {
        let queue = self.wiring_adjusters.get_mut(scope_key)?;
        while let Some(adjuster) = queue.pop_front() {
            let resolution = self.supplied.entry(adjuster.id()).or_default();
            if matches!(resolution, Resolution::Unresolved) {
                *resolution = Resolution::Resolved(AdjusterLists::default());
                return Some(adjuster);
            }
        }
        None
    }

    /// Records wiring supplied by the wiring adjuster `supplier`.
    ///
    /// Container adjusters go into the supplier's resolution. Wiring adjusters are queued on
    /// `self`, so the running expansion picks them up.
    pub(crate) fn supply(&mut self, supplier: AdjusterId, wiring: &Self) {
        if let Some(Resolution::Resolved(lists)) = self.supplied.get_mut(&supplier) {
            lists.merge(&wiring.container_adjusters);
        }
        self.merge_wiring_adjusters(wiring);
    }

    /// Makes the types known to `supplier`'s resolution and to `self` known to both.
    pub(crate) fn reconcile(&mut self, supplier: AdjusterId) {
        let Self {
            container_adjusters,
            supplied,
            ..
        } = self;

        if let Some(Resolution::Resolved(lists)) = supplied.get_mut(&supplier) {
            container_adjusters.sync_keys_from(lists);
            lists.sync_keys_from(container_adjusters);
        }
    }

    /// Returns the container adjusters to apply to a container of `container_type`, in order,
    /// each at most once.
    ///
    /// Wiring adjusters that have not run yet contribute nothing. Those that have are replaced
    /// by whatever they supplied for the type.
    pub(crate) fn flatten(&self, container_type: &ContainerType) -> Vec<ContainerAdjuster> {
        let key = container_type.key();
        let mut flattened = Vec::new();
        let mut seen = HashSet::new();
        let mut expanding = Vec::new();

        if let Some(entries) = self.container_adjusters.nearest(&key) {
            self.flatten_into(entries, &key, &mut seen, &mut expanding, &mut flattened);
        }
        flattened
    }

    fn flatten_into(
        &self,
        entries: &[AdjusterEntry],
        key: &str,
        seen: &mut HashSet<AdjusterId>,
        expanding: &mut Vec<AdjusterId>,
        flattened: &mut Vec<ContainerAdjuster>,
    ) {
        for entry in entries {
            match entry {
                AdjusterEntry::Container(adjuster) => {
                    if seen.insert(adjuster.id()) {
                        flattened.push(adjuster.clone());
                    }
                }
                AdjusterEntry::Wiring(adjuster) => {
                    let id = adjuster.id();
                    // A resolution may contain its own sentinel.
                    if expanding.contains(&id) {
                        continue;
                    }
                    let Some(Resolution::Resolved(lists)) = self.supplied.get(&id) else {
                        continue;
                    };
                    if let Some(supplied) = lists.nearest(key) {
                        expanding.push(id);
                        self.flatten_into(supplied, key, seen, expanding, flattened);
                        expanding.pop();
                    }
                }
            }
        }
    }
}
