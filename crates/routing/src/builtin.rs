//! Routes present for the whole lifetime of the process.

use crate::descriptor::{RouteDescriptor, RouteMeta, RouteTree};

pub const ROOT_NAME: &str = "root";
pub const LOGIN_NAME: &str = "login";
pub const LOADING_NAME: &str = "loading";
pub const PUBLIC_NAME: &str = "publicAccess";
pub const FORBIDDEN_NAME: &str = "403";
pub const SERVER_ERROR_NAME: &str = "500";
pub const NOT_FOUND_NAME: &str = "404";
pub const CATCH_ALL_NAME: &str = "notFoundCatchAll";
/// Parent of every authorized user route.
pub const APP_ROOT_NAME: &str = "appRoot";

pub const LOGIN_PATH: &str = "/login";
pub const FORBIDDEN_PATH: &str = "/403";
pub const NOT_FOUND_PATH: &str = "/404";
pub const APP_ROOT_PATH: &str = "/appRoot";

/// Whether `name` is one of the not-found routes.
pub fn is_not_found(name: &str) -> bool {
    name == NOT_FOUND_NAME || name == CATCH_ALL_NAME
}

fn fixed(path: &str, name: &str, component: &str, title: &str, requires_auth: Option<bool>) -> RouteTree {
    RouteTree::leaf(
        RouteDescriptor::new(path, name)
            .with_component(component)
            .with_meta(RouteMeta {
                title: Some(title.to_string()),
                without_tab: Some(true),
                requires_auth,
                ..RouteMeta::default()
            }),
    )
}

/// Root, login, loading, public and error pages, plus the catch-all.
pub fn builtin_routes() -> Vec<RouteTree> {
    vec![
        fixed("/", ROOT_NAME, "views/index", "app.title", Some(false)),
        fixed(LOGIN_PATH, LOGIN_NAME, "views/login", "login.signInTitle", None),
        fixed("/loading", LOADING_NAME, "views/loading", "app.loading", None),
        fixed("/public", PUBLIC_NAME, "views/public-access", "app.publicAccess", Some(false)),
        fixed(FORBIDDEN_PATH, FORBIDDEN_NAME, "views/error/403", "error.forbidden", Some(false)),
        fixed("/500", SERVER_ERROR_NAME, "views/error/500", "error.server", Some(false)),
        fixed(NOT_FOUND_PATH, NOT_FOUND_NAME, "views/error/404", "error.notFound", Some(false)),
        fixed("/:pathMatch(.*)*", CATCH_ALL_NAME, "views/error/404", "error.notFound", Some(false)),
    ]
}

/// The layout route wrapping the authorized user forest.
pub fn app_root(home_path: &str, children: Vec<RouteTree>) -> RouteTree {
    RouteTree::with_children(
        RouteDescriptor::new(APP_ROOT_PATH, APP_ROOT_NAME)
            .with_redirect(home_path)
            .with_component("layout"),
        children,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_pages_are_public() {
        for tree in builtin_routes() {
            let d = &tree.descriptor;
            if [FORBIDDEN_NAME, SERVER_ERROR_NAME, NOT_FOUND_NAME, CATCH_ALL_NAME, ROOT_NAME].contains(&d.name.as_str()) {
                assert_eq!(d.meta.requires_auth, Some(false), "{}", d.name);
            }
            assert!(d.meta.is_without_tab());
        }
    }

    #[test]
    fn not_found_names() {
        assert!(is_not_found("404"));
        assert!(is_not_found("notFoundCatchAll"));
        assert!(!is_not_found("login"));
    }
}
