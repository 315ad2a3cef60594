//! Structure of the admin area.
//!
//! A pure function of the configured base path. It performs no authorization
//! check; callers only register the result for admin sessions. The views it
//! references are loaded lazily on first navigation like any other route.

use crate::descriptor::{RouteDescriptor, RouteMeta, RouteTree, join_path};

pub const ADMIN_ROOT_NAME: &str = "admin-root";

fn admin_meta(title: &str, icon: Option<&str>) -> RouteMeta {
    RouteMeta {
        title: Some(title.to_string()),
        icon: icon.map(str::to_string),
        requires_auth: Some(true),
        requires_admin: Some(true),
        ..RouteMeta::default()
    }
}

fn page(path: &str, name: &str, component: &str, meta: RouteMeta) -> RouteTree {
    RouteTree::leaf(RouteDescriptor::new(path, name).with_component(component).with_meta(meta))
}

/// The admin forest rooted at `base_path`.
pub fn load_admin_subtree(base_path: &str) -> Vec<RouteTree> {
    let base = join_path(None, base_path);
    let users = format!("{}/users", base.trim_end_matches('/'));

    let root = RouteDescriptor::new(base.clone(), ADMIN_ROOT_NAME)
        .with_redirect(join_path(Some(&base), "dashboard"))
        .with_component("layout")
        .with_meta(admin_meta("admin.title", None));

    vec![RouteTree::with_children(
        root,
        vec![
            page(
                "dashboard",
                "admin-dashboard",
                "views/admin/dashboard",
                admin_meta("admin.dashboard", Some("icon-park-outline:dashboard")),
            ),
            page(
                "users",
                "admin-users",
                "views/admin/users",
                admin_meta("admin.users", Some("icon-park-outline:user")),
            ),
            page(
                "users/:id",
                "admin-user-detail",
                "views/admin/users/detail",
                RouteMeta {
                    hide: Some(true),
                    active_menu: Some(users),
                    ..admin_meta("admin.userDetail", None)
                },
            ),
            page(
                "logs",
                "admin-logs",
                "views/admin/logs",
                admin_meta("admin.logs", Some("icon-park-outline:log")),
            ),
            page(
                "settings",
                "admin-settings",
                "views/admin/settings",
                admin_meta("admin.settings", Some("icon-park-outline:setting-two")),
            ),
        ],
    )]
}
