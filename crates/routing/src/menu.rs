//! Side menus derived from the route forest.

use serde::Serialize;

use crate::descriptor::{RouteTree, join_path};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MenuItem {
    /// Full path of the route; doubles as the active-menu key.
    pub key: String,
    /// Route title (or i18n key), falling back to the route name.
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<MenuItem>,
}

/// Which menu partition is on screen, chosen by the current path.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MenuMode {
    #[default]
    User,
    Admin,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MenuModel {
    pub user: Vec<MenuItem>,
    pub admin: Vec<MenuItem>,
    pub mode: MenuMode,
    /// Highlighted menu key.
    pub active: Option<String>,
}

impl MenuModel {
    pub fn current(&self) -> &[MenuItem] {
        match self.mode {
            MenuMode::User => &self.user,
            MenuMode::Admin => &self.admin,
        }
    }
}

/// Menus for a forest whose root paths are already absolute.
pub fn build_menus(forest: &[RouteTree]) -> Vec<MenuItem> {
    items(forest, None)
}

/// Menus of the admin area: the admin root's children, not the root itself.
pub fn admin_menus(admin_root: &RouteTree) -> Vec<MenuItem> {
    let base = join_path(None, &admin_root.descriptor.path);
    items(&admin_root.children, Some(&base))
}

fn items(trees: &[RouteTree], parent: Option<&str>) -> Vec<MenuItem> {
    let mut visible: Vec<&RouteTree> = trees
        .iter()
        .filter(|t| !t.descriptor.meta.is_hidden())
        .collect();
    visible.sort_by_key(|t| t.descriptor.meta.order.unwrap_or(0));

    visible
        .into_iter()
        .map(|tree| {
            let d = &tree.descriptor;
            let key = join_path(parent, &d.path);
            MenuItem {
                label: d.meta.title.clone().unwrap_or_else(|| d.name.clone()),
                icon: d.meta.icon.clone(),
                children: items(&tree.children, Some(&key)),
                key,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{RouteDescriptor, RouteMeta};

    fn node(path: &str, name: &str, meta: RouteMeta) -> RouteTree {
        RouteTree::leaf(RouteDescriptor::new(path, name).with_meta(meta))
    }

    #[test]
    fn hidden_routes_are_skipped_and_order_is_stable() {
        let forest = vec![
            node("/b", "b", RouteMeta { order: Some(2), ..RouteMeta::default() }),
            node("/hidden", "hidden", RouteMeta { hide: Some(true), ..RouteMeta::default() }),
            node("/a", "a", RouteMeta { order: Some(1), title: Some("A".into()), ..RouteMeta::default() }),
            node("/c", "c", RouteMeta { order: Some(2), ..RouteMeta::default() }),
        ];

        let menus = build_menus(&forest);
        let keys: Vec<&str> = menus.iter().map(|m| m.key.as_str()).collect();
        assert_eq!(keys, vec!["/a", "/b", "/c"]);
        assert_eq!(menus[0].label, "A");
        assert_eq!(menus[1].label, "b");
    }

    #[test]
    fn admin_menu_lists_children_with_full_keys() {
        let root = RouteTree::with_children(
            RouteDescriptor::new("/ops", "admin-root"),
            vec![
                node("users", "admin-users", RouteMeta::default()),
                node("users/:id", "admin-user-detail", RouteMeta { hide: Some(true), ..RouteMeta::default() }),
            ],
        );
        let menus = admin_menus(&root);
        assert_eq!(menus.len(), 1);
        assert_eq!(menus[0].key, "/ops/users");
    }

    #[test]
    fn current_follows_mode() {
        let mut model = MenuModel {
            user: build_menus(&[node("/u", "u", RouteMeta::default())]),
            admin: build_menus(&[node("/x", "x", RouteMeta::default())]),
            ..MenuModel::default()
        };
        assert_eq!(model.current()[0].key, "/u");
        model.mode = MenuMode::Admin;
        assert_eq!(model.current()[0].key, "/x");
    }
}
