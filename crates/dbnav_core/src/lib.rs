mod config;
mod connection;
mod error;
mod gateway;
mod icons;
mod navigation_state;
mod node_id;
mod notifier;
mod path_classifier;
mod storage;
mod tree;
mod tree_builder;

pub use config::{ConfigStore, NavigatorConfig};
pub use connection::Connection;
pub use error::NavError;
pub use gateway::{DatabaseList, ObjectGateway, ObjectRecord};
pub use icons::{NodeIcon, folder_icon, item_icon};
pub use navigation_state::{
    HierarchyUpdate, KEY_ALL_INDEX, KEY_CONNECTION, KEY_HIERARCHY, KEY_SELECTED_DATABASE,
    KEY_SELECTED_INDEX, KEY_SELECTED_TABLE, NavigationState,
};
pub use node_id::{NodeId, PATH_SEPARATOR};
pub use notifier::{LogNotifier, Notice, NoticeLevel, Notifier};
pub use path_classifier::{ConventionClassifier, ObjectSelection, PathClassifier};
pub use storage::{JsonFileStore, KeyValueStore, MemoryStore};
pub use tree::{FolderKind, FolderNode, LeafNode, LoadState, TreeNode};
pub use tree_builder::build_object_tree;

