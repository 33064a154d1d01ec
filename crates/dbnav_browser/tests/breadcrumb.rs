use dbnav_browser::{BreadcrumbProjector, MAX_CRUMBS, SidebarNavigator};
use dbnav_core::{HierarchyUpdate, NavigationState, NavigatorConfig};
use dbnav_test_support::fixtures::{SERVER, connection, init_logging, sales_records, strings};
use dbnav_test_support::{FakeGateway, RecordingNotifier};
use std::sync::Arc;

const INDEX_PATH: [&str; 6] = [
    SERVER,
    "Sales",
    "Tables",
    "dbo.Orders",
    "Indexes",
    "IX_Orders_1",
];

fn selected_index_state() -> Arc<NavigationState> {
    init_logging();
    let state = Arc::new(NavigationState::in_memory());
    state.set_connection(connection());
    state.set_hierarchy(strings(&INDEX_PATH));
    state.set_selected_database(Some("Sales".into()), HierarchyUpdate::Keep);
    state.set_selected_table_name(Some("dbo.Orders".into()));
    state.set_selected_index_name(Some("IX_Orders_1".into()));
    state
}

#[test]
fn crumbs_follow_hierarchy() {
    let state = selected_index_state();
    let projector = BreadcrumbProjector::new(state.clone(), &NavigatorConfig::default());

    let crumbs = projector.crumbs();

    assert!(crumbs.len() <= MAX_CRUMBS);
    assert_eq!(crumbs, strings(&[SERVER, "Sales", "dbo.Orders"]));

    state.set_hierarchy(strings(&[SERVER, "Sales"]));
    assert_eq!(projector.crumbs(), strings(&[SERVER, "Sales"]));
}

#[test]
fn server_crumb_clears_everything_below() {
    let state = selected_index_state();
    let projector = BreadcrumbProjector::new(state.clone(), &NavigatorConfig::default());
    let mut clicks = state.on_breadcrumb_click();

    projector.on_crumb_click(0);

    assert_eq!(state.hierarchy(), strings(&[SERVER]));
    assert_eq!(state.selected_database(), None);
    assert_eq!(state.selected_table_name(), None);
    assert_eq!(state.selected_index_name(), None);
    assert_eq!(clicks.try_recv().ok(), Some(0));
}

#[test]
fn database_crumb_keeps_database() {
    let state = selected_index_state();
    let projector = BreadcrumbProjector::new(state.clone(), &NavigatorConfig::default());
    let mut clicks = state.on_breadcrumb_click();

    projector.on_crumb_click(1);

    assert_eq!(state.hierarchy(), strings(&[SERVER, "Sales"]));
    assert_eq!(state.selected_database().as_deref(), Some("Sales"));
    assert_eq!(state.selected_table_name(), None);
    assert_eq!(state.selected_index_name(), None);
    assert_eq!(clicks.try_recv().ok(), Some(1));
}

#[test]
fn table_crumb_maps_back_to_hierarchy_depth() {
    let state = selected_index_state();
    let projector = BreadcrumbProjector::new(state.clone(), &NavigatorConfig::default());
    let mut clicks = state.on_breadcrumb_click();

    projector.on_crumb_click(2);

    assert_eq!(
        state.hierarchy(),
        strings(&[SERVER, "Sales", "Tables", "dbo.Orders"])
    );
    assert_eq!(state.selected_table_name().as_deref(), Some("dbo.Orders"));
    assert_eq!(state.selected_index_name(), None);
    assert_eq!(clicks.try_recv().ok(), Some(3));
}

#[tokio::test]
async fn sidebar_follows_crumb_click() {
    let state = selected_index_state();
    let gateway = FakeGateway::new()
        .with_databases(["Sales"])
        .with_objects("Sales", sales_records());
    let mut sidebar = SidebarNavigator::new(
        state.clone(),
        gateway.as_gateway_arc(),
        Arc::new(RecordingNotifier::new()),
        &NavigatorConfig::default(),
    );
    let projector = BreadcrumbProjector::new(state.clone(), &NavigatorConfig::default());
    sidebar.load_databases().await;
    sidebar.toggle_node(&"Sales\\Tables".into()).await;

    projector.on_crumb_click(2);
    sidebar.process_pending().await;

    let orders = sidebar.find(&"Sales\\Tables\\dbo.Orders".into()).unwrap();
    assert!(orders.is_expanded());
    assert!(sidebar.find(&"Sales\\Tables".into()).unwrap().is_expanded());
}
