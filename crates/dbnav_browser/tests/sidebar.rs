use dbnav_browser::SidebarNavigator;
use dbnav_core::{Connection, LoadState, NavigationState, NavigatorConfig, TreeNode};
use tokio::sync::broadcast::error::TryRecvError;
use dbnav_test_support::fixtures::{
    SERVER, connection, hr_records, id, init_logging, other_connection, sales_records, strings,
};
use dbnav_test_support::{FakeGateway, RecordingNotifier};
use std::sync::Arc;

struct Harness {
    state: Arc<NavigationState>,
    gateway: FakeGateway,
    notifier: RecordingNotifier,
    sidebar: SidebarNavigator,
}

fn scripted_gateway() -> FakeGateway {
    FakeGateway::new()
        .with_databases(["Sales", "HR"])
        .with_objects("Sales", sales_records())
        .with_objects("HR", hr_records())
}

fn harness(gateway: FakeGateway) -> Harness {
    harness_on(connection(), gateway)
}

fn harness_on(connection: Connection, gateway: FakeGateway) -> Harness {
    init_logging();
    let state = Arc::new(NavigationState::in_memory());
    state.set_connection(connection);
    harness_with_state(state, gateway)
}

fn harness_with_state(state: Arc<NavigationState>, gateway: FakeGateway) -> Harness {
    let notifier = RecordingNotifier::new();
    let sidebar = SidebarNavigator::new(
        state.clone(),
        gateway.clone().as_gateway_arc(),
        Arc::new(notifier.clone()),
        &NavigatorConfig::default(),
    );
    Harness {
        state,
        gateway,
        notifier,
        sidebar,
    }
}

fn child_names(node: &TreeNode) -> Vec<&str> {
    node.children().iter().map(TreeNode::name).collect()
}

#[tokio::test]
async fn load_databases_builds_server_root() {
    let mut h = harness(scripted_gateway());

    h.sidebar.load_databases().await;

    let root = h.sidebar.root().expect("tree loaded");
    assert_eq!(root.name(), SERVER);
    assert!(root.is_expanded());
    assert_eq!(child_names(root), vec!["Sales", "HR"]);
    assert!(h.state.is_database_list_loaded());
    assert_eq!(h.sidebar.database_load_state("Sales"), Some(LoadState::Unloaded));
    assert!(h.gateway.stats().object_requests.is_empty());
}

#[tokio::test]
async fn empty_database_list_clears_loaded_flag() {
    let mut h = harness(FakeGateway::new());
    h.state.set_database_list_loaded(true);

    h.sidebar.load_databases().await;

    assert!(h.sidebar.root().is_none());
    assert!(!h.state.is_database_list_loaded());
    assert_eq!(h.notifier.infos().len(), 1);
    assert!(h.notifier.errors().is_empty());
}

#[tokio::test]
async fn database_list_error_is_reported() {
    let mut h = harness(FakeGateway::new().with_database_list_error("login failed"));

    h.sidebar.load_databases().await;

    assert!(h.sidebar.root().is_none());
    assert!(!h.state.is_database_list_loaded());
    let errors = h.notifier.errors();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].message.contains("login failed"));
}

#[tokio::test]
async fn expanding_database_selects_and_loads_it() {
    let mut h = harness(scripted_gateway());
    h.sidebar.load_databases().await;

    h.sidebar.toggle_node(&id("Sales")).await;

    assert_eq!(h.state.selected_database().as_deref(), Some("Sales"));
    assert_eq!(h.state.hierarchy(), strings(&[SERVER, "Sales"]));
    let sales = h.sidebar.find(&id("Sales")).unwrap();
    assert!(sales.is_expanded());
    assert_eq!(
        child_names(sales),
        vec!["Tables", "Views", "Programmability"]
    );
    assert_eq!(h.sidebar.database_load_state("Sales"), Some(LoadState::Loaded));
}

#[tokio::test]
async fn collapsing_database_clears_selection_without_refetch() {
    let mut h = harness(scripted_gateway());
    h.sidebar.load_databases().await;
    h.sidebar.toggle_node(&id("Sales")).await;

    h.sidebar.toggle_node(&id("Sales")).await;

    assert!(!h.sidebar.find(&id("Sales")).unwrap().is_expanded());
    assert_eq!(h.state.selected_database(), None);
    assert_eq!(h.state.hierarchy(), strings(&[SERVER]));

    h.sidebar.toggle_node(&id("Sales")).await;

    assert!(h.sidebar.find(&id("Sales")).unwrap().is_expanded());
    assert_eq!(h.gateway.stats().object_requests_for("Sales"), 1);
}

#[tokio::test]
async fn index_leaf_click_publishes_table_and_index() {
    let mut h = harness(scripted_gateway());
    h.sidebar.load_databases().await;
    h.sidebar.toggle_node(&id("Sales")).await;
    let mut refresh = h.state.on_index_refresh();

    h.sidebar
        .toggle_node(&id("Sales\\Tables\\dbo.Orders\\Indexes\\IX_Orders_1"))
        .await;

    assert_eq!(
        h.state.hierarchy(),
        strings(&[
            SERVER,
            "Sales",
            "Tables",
            "dbo.Orders",
            "Indexes",
            "IX_Orders_1"
        ])
    );
    assert_eq!(h.state.selected_database().as_deref(), Some("Sales"));
    assert_eq!(h.state.selected_table_name().as_deref(), Some("dbo.Orders"));
    assert_eq!(h.state.selected_index_name().as_deref(), Some("IX_Orders_1"));
    assert!(refresh.try_recv().is_ok());
    assert!(matches!(refresh.try_recv(), Err(TryRecvError::Empty)));
}

#[tokio::test]
async fn non_index_leaf_click_does_not_refresh_indexes() {
    let mut h = harness(scripted_gateway());
    h.sidebar.load_databases().await;
    h.sidebar.toggle_node(&id("Sales")).await;
    h.state.set_selected_index_name(Some("IX_Old".into()));
    let mut refresh = h.state.on_index_refresh();

    h.sidebar
        .toggle_node(&id("Sales\\Tables\\dbo.Orders\\dbo.Orders"))
        .await;

    assert_eq!(h.state.selected_table_name().as_deref(), Some("dbo.Orders"));
    assert_eq!(h.state.selected_index_name(), None);
    assert!(refresh.try_recv().is_err());
}

#[tokio::test]
async fn deep_folder_expansion_updates_hierarchy() {
    let mut h = harness(scripted_gateway());
    h.sidebar.load_databases().await;
    h.sidebar.toggle_node(&id("Sales")).await;

    h.sidebar.toggle_node(&id("Sales\\Tables")).await;

    assert!(h.sidebar.find(&id("Sales\\Tables")).unwrap().is_expanded());
    assert_eq!(h.state.hierarchy(), strings(&[SERVER, "Sales", "Tables"]));

    h.sidebar.toggle_node(&id("Sales\\Tables")).await;

    assert!(!h.sidebar.find(&id("Sales\\Tables")).unwrap().is_expanded());
    assert_eq!(h.state.hierarchy(), strings(&[SERVER, "Sales", "Tables"]));
    assert_eq!(h.state.selected_database().as_deref(), Some("Sales"));
}

#[tokio::test]
async fn failed_object_load_is_retried() {
    let gateway = scripted_gateway().with_object_error("HR", "timeout");
    let mut h = harness(gateway);
    h.sidebar.load_databases().await;

    h.sidebar.toggle_node(&id("HR")).await;

    assert_eq!(h.sidebar.database_load_state("HR"), Some(LoadState::Failed));
    assert!(!h.sidebar.find(&id("HR")).unwrap().is_expanded());
    assert_eq!(h.notifier.errors().len(), 1);

    h.gateway.set_objects("HR", hr_records());
    h.sidebar.toggle_node(&id("HR")).await;

    assert_eq!(h.sidebar.database_load_state("HR"), Some(LoadState::Loaded));
    assert!(h.sidebar.find(&id("HR")).unwrap().is_expanded());
    assert_eq!(h.gateway.stats().object_requests_for("HR"), 2);
}

#[tokio::test]
async fn empty_database_is_not_fetched_again() {
    let mut h = harness(FakeGateway::new().with_databases(["Archive"]));
    h.sidebar.load_databases().await;

    let first = h
        .sidebar
        .lazy_load_database_children_if_needed(&id("Archive"))
        .await;
    let second = h
        .sidebar
        .lazy_load_database_children_if_needed(&id("Archive"))
        .await;

    assert_eq!(first, Some(LoadState::Empty));
    assert_eq!(second, Some(LoadState::Empty));
    assert!(h.sidebar.find(&id("Archive")).unwrap().children().is_empty());
    assert_eq!(h.gateway.stats().object_requests_for("Archive"), 1);
    assert_eq!(h.notifier.infos().len(), 1);
}

#[tokio::test]
async fn response_for_old_connection_is_discarded() {
    let mut h = harness(scripted_gateway());
    h.sidebar.load_databases().await;
    let state = h.state.clone();
    h.gateway
        .on_object_request(move |_| state.set_connection(other_connection()));

    let result = h
        .sidebar
        .lazy_load_database_children_if_needed(&id("Sales"))
        .await;

    assert_eq!(result, Some(LoadState::Unloaded));
    assert!(h.sidebar.find(&id("Sales")).unwrap().children().is_empty());
    assert!(h.notifier.notices().is_empty());
}

#[tokio::test]
async fn connection_change_during_expansion_keeps_selection() {
    let mut h = harness(scripted_gateway());
    h.sidebar.load_databases().await;
    let state = h.state.clone();
    h.gateway
        .on_object_request(move |_| state.set_connection(other_connection()));

    h.sidebar.toggle_node(&id("Sales")).await;

    assert_eq!(h.state.selected_database(), None);
    assert!(h.state.hierarchy().is_empty());
    assert!(!h.sidebar.find(&id("Sales")).unwrap().is_expanded());
    assert_eq!(h.sidebar.database_load_state("Sales"), Some(LoadState::Unloaded));
}

#[tokio::test]
async fn database_named_like_server_expands_itself() {
    let gateway = FakeGateway::new()
        .with_databases(["SALES", "HR"])
        .with_objects("SALES", sales_records());
    let mut h = harness_on(Connection::new("SALES", "sa", "secret"), gateway);
    h.sidebar.load_databases().await;

    h.sidebar.toggle_node(&id("SALES")).await;

    assert_eq!(h.state.selected_database().as_deref(), Some("SALES"));
    assert_eq!(h.state.hierarchy(), strings(&["SALES", "SALES"]));
    assert_eq!(h.gateway.stats().object_requests, strings(&["SALES"]));
    assert!(h.sidebar.root().unwrap().is_expanded());
    assert!(h.sidebar.find(&id("SALES")).unwrap().is_expanded());

    h.sidebar
        .toggle_node(&id("SALES\\Tables\\dbo.Orders\\Indexes\\IX_Orders_1"))
        .await;

    assert_eq!(h.state.selected_table_name().as_deref(), Some("dbo.Orders"));
    assert_eq!(h.state.selected_index_name().as_deref(), Some("IX_Orders_1"));
}

#[tokio::test]
async fn restored_hierarchy_is_expanded_after_load() {
    init_logging();
    let state = Arc::new(NavigationState::in_memory());
    state.set_connection(connection());
    state.set_hierarchy(strings(&[SERVER, "Sales", "Tables", "dbo.Orders"]));
    let mut h = harness_with_state(state, scripted_gateway());

    h.sidebar.load_databases().await;

    assert_eq!(h.sidebar.database_load_state("Sales"), Some(LoadState::Loaded));
    assert!(h.sidebar.find(&id("Sales")).unwrap().is_expanded());
    assert!(h.sidebar.find(&id("Sales\\Tables")).unwrap().is_expanded());
    assert!(h.sidebar
        .find(&id("Sales\\Tables\\dbo.Orders"))
        .unwrap()
        .is_expanded());
    assert_eq!(h.sidebar.database_load_state("HR"), Some(LoadState::Unloaded));
}

#[tokio::test]
async fn hierarchy_of_other_server_is_not_expanded() {
    init_logging();
    let state = Arc::new(NavigationState::in_memory());
    state.set_connection(connection());
    state.set_hierarchy(strings(&["sql02", "Sales"]));
    let mut h = harness_with_state(state, scripted_gateway());

    h.sidebar.load_databases().await;

    assert!(h.state.is_database_list_loaded());
    assert!(h.gateway.stats().object_requests.is_empty());
}

#[tokio::test]
async fn expansion_stops_at_unknown_name() {
    let mut h = harness(scripted_gateway());
    h.sidebar.load_databases().await;
    h.state
        .set_hierarchy(strings(&[SERVER, "Sales", "Missing", "dbo.Orders"]));

    h.sidebar.expand_to_hierarchy(3).await;

    assert!(h.sidebar.find(&id("Sales")).unwrap().is_expanded());
    assert!(!h.sidebar.find(&id("Sales\\Tables")).unwrap().is_expanded());
}

#[tokio::test]
async fn connection_change_reloads_tree() {
    let mut h = harness(scripted_gateway());
    h.sidebar.load_databases().await;

    h.state.set_connection(other_connection());
    h.sidebar.process_pending().await;

    assert_eq!(h.sidebar.root().unwrap().name(), "sql02");
    assert_eq!(h.gateway.stats().servers, strings(&[SERVER, "sql02"]));
    assert!(h.state.is_database_list_loaded());
}

#[tokio::test]
async fn cleared_connection_empties_tree() {
    let mut h = harness(scripted_gateway());
    h.sidebar.load_databases().await;

    h.state.clear_connection();
    h.sidebar.process_pending().await;

    assert!(h.sidebar.root().is_none());
    assert!(!h.state.is_database_list_loaded());
    assert_eq!(h.gateway.stats().database_list_calls, 1);
}

#[tokio::test]
async fn breadcrumb_click_re_expands_tree() {
    let mut h = harness(scripted_gateway());
    h.sidebar.load_databases().await;
    h.state.set_hierarchy(strings(&[SERVER, "HR"]));

    h.state.trigger_breadcrumb_click(1);
    h.sidebar.process_pending().await;

    assert_eq!(h.sidebar.database_load_state("HR"), Some(LoadState::Loaded));
    assert!(h.sidebar.find(&id("HR")).unwrap().is_expanded());
}

#[tokio::test]
async fn next_event_handles_breadcrumb_click() {
    let mut h = harness(scripted_gateway());
    h.sidebar.load_databases().await;
    h.state.set_hierarchy(strings(&[SERVER, "Sales"]));
    h.state.trigger_breadcrumb_click(1);

    assert!(h.sidebar.handle_next_event().await);
    assert_eq!(h.sidebar.database_load_state("Sales"), Some(LoadState::Loaded));
}
