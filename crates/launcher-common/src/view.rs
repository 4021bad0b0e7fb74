//! Client-side view derivation.
//!
//! Turns the raw entry list plus the local UI state (search text, selected
//! category) into what the grid renders. Nothing here talks to the server;
//! the only output that leaves the client is the dense position batch built
//! by [`reorder_on_drop`].

use std::collections::HashMap;
use std::convert::Infallible;
use std::str::FromStr;

use crate::entry::{Entry, PositionUpdate, dense_positions};

/// Group label for entries with a null or empty category.
pub const UNCATEGORIZED: &str = "Uncategorized";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CategoryFilter {
    #[default]
    All,
    Uncategorized,
    Named(String),
}

impl CategoryFilter {
    pub fn as_selector(&self) -> &str {
        match self {
            Self::All => "all",
            Self::Uncategorized => "uncategorized",
            Self::Named(name) => name,
        }
    }

    pub fn matches(&self, entry: &Entry) -> bool {
        match self {
            Self::All => true,
            Self::Uncategorized => entry.is_uncategorized(),
            Self::Named(name) => entry.category.as_deref() == Some(name.as_str()),
        }
    }
}

impl FromStr for CategoryFilter {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "all" => Self::All,
            "uncategorized" => Self::Uncategorized,
            other => Self::Named(other.to_string()),
        })
    }
}

/// Local UI state that shapes the rendered grid.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewQuery {
    pub search: String,
    pub category: CategoryFilter,
}

impl ViewQuery {
    pub fn new(search: impl Into<String>, category: CategoryFilter) -> Self {
        Self {
            search: search.into(),
            category,
        }
    }

    /// The "All" view with an empty search box.
    pub fn is_unfiltered(&self) -> bool {
        self.category == CategoryFilter::All && self.search.is_empty()
    }

    pub fn matches_search(&self, entry: &Entry) -> bool {
        if self.search.is_empty() {
            return true;
        }
        let needle = self.search.to_lowercase();
        entry.name.to_lowercase().contains(&needle) || entry.url.to_lowercase().contains(&needle)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryGroup {
    pub label: String,
    pub entries: Vec<Entry>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LauncherView {
    /// Entries after search and category filtering, in display order.
    pub entries: Vec<Entry>,
    /// Category buckets; only populated when the category selector is "all".
    pub groups: Vec<EntryGroup>,
    /// Distinct non-empty categories, sorted, for the category selector.
    pub categories: Vec<String>,
    pub drag_enabled: bool,
    /// Size of the unfiltered list.
    pub total: usize,
}

fn count_apps(n: usize) -> String {
    format!("{} app{}", n, if n == 1 { "" } else { "s" })
}

impl LauncherView {
    pub fn is_grouped(&self) -> bool {
        !self.groups.is_empty()
    }

    /// Result-count line shown above the grid.
    pub fn summary(&self, query: &ViewQuery) -> String {
        if !query.search.is_empty() && self.entries.len() != self.total {
            format!("Showing {} of {} apps", self.entries.len(), self.total)
        } else if query.category != CategoryFilter::All {
            count_apps(self.entries.len())
        } else {
            count_apps(self.total)
        }
    }
}

/// Derive the rendered view from the server list.
///
/// Position order applies only to the unfiltered view. Under any filter the
/// list keeps the order the server returned it in.
pub fn derive_view(entries: &[Entry], query: &ViewQuery) -> LauncherView {
    let mut ordered: Vec<Entry> = entries.to_vec();
    if query.is_unfiltered() {
        ordered.sort_by_key(|e| e.position);
    }

    let categories = categories(&ordered);

    let search_filtered: Vec<Entry> = ordered
        .into_iter()
        .filter(|e| query.matches_search(e))
        .collect();

    let groups = if query.category == CategoryFilter::All {
        group_by_category(&search_filtered)
    } else {
        Vec::new()
    };

    let filtered = search_filtered
        .into_iter()
        .filter(|e| query.category.matches(e))
        .collect();

    LauncherView {
        entries: filtered,
        groups,
        categories,
        drag_enabled: query.is_unfiltered(),
        total: entries.len(),
    }
}

fn categories(entries: &[Entry]) -> Vec<String> {
    let mut cats: Vec<String> = entries
        .iter()
        .filter_map(|e| e.category.as_deref())
        .filter(|c| !c.is_empty())
        .map(str::to_string)
        .collect();
    cats.sort();
    cats.dedup();
    cats
}

/// Bucket by category label, alphabetical ignoring case, with
/// "Uncategorized" last.
pub fn group_by_category(entries: &[Entry]) -> Vec<EntryGroup> {
    let mut buckets: HashMap<String, Vec<Entry>> = HashMap::new();
    for entry in entries {
        let label = match entry.category.as_deref() {
            Some(c) if !c.is_empty() => c.to_string(),
            _ => UNCATEGORIZED.to_string(),
        };
        buckets.entry(label).or_default().push(entry.clone());
    }

    let uncategorized = buckets.remove(UNCATEGORIZED);
    let mut groups: Vec<EntryGroup> = buckets
        .into_iter()
        .map(|(label, entries)| EntryGroup { label, entries })
        .collect();
    groups.sort_by(|a, b| {
        a.label
            .to_lowercase()
            .cmp(&b.label.to_lowercase())
            .then_with(|| a.label.cmp(&b.label))
    });
    if let Some(entries) = uncategorized {
        groups.push(EntryGroup {
            label: UNCATEGORIZED.to_string(),
            entries,
        });
    }
    groups
}

/// Move the element at `from` so it ends up at index `to`.
pub fn array_move<T>(items: &mut Vec<T>, from: usize, to: usize) {
    if from >= items.len() || to >= items.len() || from == to {
        return;
    }
    let item = items.remove(from);
    items.insert(to, item);
}

/// Build the reorder batch for dropping `active_id` onto `over_id`.
///
/// `entries` must be the unfiltered list in display (position) order. Returns
/// `None` when the drop is a no-op. Otherwise every entry gets a new position
/// equal to its index in the moved list.
pub fn reorder_on_drop(
    entries: &[Entry],
    active_id: &str,
    over_id: &str,
) -> Option<Vec<PositionUpdate>> {
    if active_id == over_id {
        return None;
    }
    let old_index = entries.iter().position(|e| e.id == active_id)?;
    let new_index = entries.iter().position(|e| e.id == over_id)?;

    let mut ids: Vec<&str> = entries.iter().map(|e| e.id.as_str()).collect();
    array_move(&mut ids, old_index, new_index);
    Some(dense_positions(ids))
}
