//! Server navigation components on top of `dbnav_core`.
//!
//! [`SidebarNavigator`] drives the single-selection sidebar,
//! [`SelectionPicker`] the multi-select tree used to build policies, and
//! [`BreadcrumbProjector`] the condensed path shown above them. All three
//! share one [`NavigationState`](dbnav_core::NavigationState).

mod breadcrumb;
mod lazy_tree;
mod selection_picker;
mod sidebar;

pub use breadcrumb::{BreadcrumbProjector, MAX_CRUMBS};
pub use selection_picker::{DatabaseTargets, ObjectTarget, PolicyTargets, SelectionPicker};
pub use sidebar::SidebarNavigator;
