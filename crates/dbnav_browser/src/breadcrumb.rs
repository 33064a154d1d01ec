use dbnav_core::{HierarchyUpdate, NavigationState, NavigatorConfig};
use log::debug;
use std::sync::Arc;
use tokio::sync::watch;

/// Most crumbs ever shown: server, database and table.
pub const MAX_CRUMBS: usize = 3;

/// Condensed, clickable view of the navigation hierarchy.
pub struct BreadcrumbProjector {
    state: Arc<NavigationState>,
    config: NavigatorConfig,
}

impl BreadcrumbProjector {
    pub fn new(state: Arc<NavigationState>, config: &NavigatorConfig) -> Self {
        Self {
            state,
            config: config.clone(),
        }
    }

    /// Projects a hierarchy onto at most [`MAX_CRUMBS`] labels.
    ///
    /// Server and database are kept as they are. Below them, the segment after
    /// a `tables` folder is shown, skipping structural folder names; without a
    /// `tables` folder the first object segment is shown unless it is itself a
    /// structural folder.
    pub fn project(&self, hierarchy: &[String]) -> Vec<String> {
        let mut crumbs: Vec<String> = hierarchy.iter().take(2).cloned().collect();

        let objects = hierarchy.get(2..).unwrap_or_default();
        let table = match objects
            .iter()
            .position(|segment| segment.eq_ignore_ascii_case("tables"))
        {
            Some(tables_at) => objects[tables_at + 1..]
                .iter()
                .find(|segment| !self.config.is_structural_folder(segment)),
            None => objects
                .first()
                .filter(|segment| !self.config.is_structural_folder(segment)),
        };
        crumbs.extend(table.cloned());

        crumbs
    }

    pub fn crumbs(&self) -> Vec<String> {
        self.project(&self.state.hierarchy())
    }

    /// Fires whenever the hierarchy, and so possibly the crumbs, changes.
    pub fn subscribe(&self) -> watch::Receiver<Vec<String>> {
        self.state.subscribe_hierarchy()
    }

    /// Navigates back to the clicked crumb.
    ///
    /// Truncates the hierarchy at the crumb's depth and clears selections
    /// below it: depth 0 clears database, table and index; depth 1 clears
    /// table and index; deeper clicks clear the index. Listeners of the
    /// breadcrumb click channel are told the depth last.
    pub fn on_crumb_click(&self, index: usize) {
        let hierarchy = self.state.hierarchy();
        let crumbs = self.project(&hierarchy);
        let Some(label) = crumbs.get(index) else {
            debug!("No crumb at {}", index);
            return;
        };

        let depth = match index {
            0 | 1 => index,
            _ => hierarchy
                .iter()
                .position(|segment| segment == label)
                .unwrap_or(index),
        };
        let truncated: Vec<String> = hierarchy.into_iter().take(depth + 1).collect();
        let database = truncated.get(1).cloned();

        self.state.set_hierarchy(truncated);
        match depth {
            0 => {
                self.state.set_selected_database(None, HierarchyUpdate::Keep);
                self.state.set_selected_table_name(None);
                self.state.set_selected_index_name(None);
            }
            1 => {
                self.state.set_selected_database(database, HierarchyUpdate::Keep);
                self.state.set_selected_table_name(None);
                self.state.set_selected_index_name(None);
            }
            _ => {
                self.state.set_selected_database(database, HierarchyUpdate::Keep);
                self.state.set_selected_index_name(None);
            }
        }

        self.state.trigger_breadcrumb_click(depth);
    }
}
