use crate::icons::{folder_icon, item_icon};
use crate::{FolderNode, LeafNode, NodeId, ObjectRecord, PATH_SEPARATOR, TreeNode};
use indexmap::IndexMap;

#[derive(Default)]
struct FolderMap {
    folders: IndexMap<String, FolderMap>,
    items: Vec<PendingItem>,
}

struct PendingItem {
    name: String,
    folder: String,
}

/// Turns a flat object listing into nested tree nodes.
///
/// Every node id is `base` joined with the node's folder path, so passing the
/// database id yields `Sales\Tables\dbo.Orders` while an empty base yields
/// `Tables\dbo.Orders`. Sibling order follows first appearance in `records`,
/// with a folder's items listed before its sub-folders.
pub fn build_object_tree(records: &[ObjectRecord], base: &NodeId) -> Vec<TreeNode> {
    let mut root = FolderMap::default();

    for record in records {
        let mut level = &mut root;
        for segment in record.folder.split(PATH_SEPARATOR).filter(|s| !s.is_empty()) {
            level = level.folders.entry(segment.to_string()).or_default();
        }

        if record.item.is_empty() {
            continue;
        }

        level.items.push(PendingItem {
            name: record.item.clone(),
            folder: record.folder.clone(),
        });
    }

    convert(root, base, &NodeId::default())
}

fn convert(map: FolderMap, path: &NodeId, relative: &NodeId) -> Vec<TreeNode> {
    let mut nodes = Vec::with_capacity(map.items.len() + map.folders.len());

    for item in map.items {
        nodes.push(TreeNode::Leaf(LeafNode {
            id: path.child(&item.name),
            icon: item_icon(&item.name, &item.folder),
            name: item.name,
        }));
    }

    for (name, sub) in map.folders {
        let id = path.child(&name);
        let relative = relative.child(&name);
        let children = convert(sub, &id, &relative);
        let icon = folder_icon(relative.as_str());
        nodes.push(TreeNode::Folder(FolderNode::group(id, name, icon, children)));
    }

    nodes
}
