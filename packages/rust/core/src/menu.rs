//! Serialization of the navigation tree into SharePoint menu nodes.

use coursekit_shared::{CourseKitError, NavNode, Result};
use coursekit_sharepoint::MenuNode;

/// Convert `tree` into menu nodes with keys counting up from `base_id`.
///
/// Keys are assigned depth-first in sibling order, so a heading always gets
/// a smaller key than its children. Fails if the keys would run past
/// `u32::MAX`.
pub fn serialize_navigation(tree: &[NavNode], base_id: u32) -> Result<Vec<MenuNode>> {
    let mut next_id = Some(base_id);
    tree.iter().map(|node| to_menu_node(node, &mut next_id)).collect()
}

fn to_menu_node(node: &NavNode, next_id: &mut Option<u32>) -> Result<MenuNode> {
    let key = next_id.ok_or_else(|| {
        CourseKitError::validation("menu keys exceed u32::MAX; lower navigation.menu_base_id")
    })?;
    *next_id = key.checked_add(1);

    let mut menu = MenuNode::new(key, &node.display_name, &node.web_url);
    menu.nodes = node
        .children
        .iter()
        .map(|child| to_menu_node(child, next_id))
        .collect::<Result<_>>()?;
    Ok(menu)
}
