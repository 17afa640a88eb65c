//! Client-side gating of protected pages. A stored, non-empty `authToken`
//! is the whole notion of "signed in": nothing is verified here.

use std::cell::Cell;
use std::rc::Rc;

use gloo_timers::callback::Timeout;
use serde_json::{json, Value};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::spawn_local;
use web_sys::{Event, MutationObserver, MutationObserverInit};

use crate::api::BackendReply;
use crate::config::{
    AUTH_TOKEN_KEY, HOME_PAGE, LOGIN_ENDPOINT, LOGIN_PAGE, LOGIN_WATCH_MS, POST_LOGIN_PAGE,
    PROTECTED_PAGES, REDIRECT_PARAM, SIGNUP_ENDPOINT, USER_DATA_KEY,
};
use crate::dom::{closest, event_element, listen, SharedContext};
use crate::forms::{claim, field_value, reset, restore_busy, set_busy, validate_login, validate_signup};
use crate::models::{LoginSession, SignupAccount};
use crate::notify::ToastKind;
use crate::storage::{save_json, KeyValueStore};

const LOGOUT_DELAY_MS: u32 = 500;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Gate {
    Allow,
    RedirectToLogin(String),
}

pub fn is_authenticated(store: &impl KeyValueStore) -> bool {
    store
        .get(AUTH_TOKEN_KEY)
        .map(|token| !token.is_empty())
        .unwrap_or(false)
}

pub fn store_session(store: &impl KeyValueStore, token: &str, user: &Value) {
    store.set(AUTH_TOKEN_KEY, token);
    save_json(store, USER_DATA_KEY, user);
}

pub fn clear_session(store: &impl KeyValueStore) {
    store.remove(AUTH_TOKEN_KEY);
    store.remove(USER_DATA_KEY);
}

/// Lowercased file name of a path; `index.html` for directory paths.
pub fn page_name(pathname: &str) -> String {
    let last = pathname.rsplit('/').next().unwrap_or("");
    if last.is_empty() {
        HOME_PAGE.to_string()
    } else {
        last.to_lowercase()
    }
}

pub fn is_protected_page(page: &str) -> bool {
    PROTECTED_PAGES.contains(&page)
}

fn link_is_protected(href: &str) -> bool {
    let href = href.to_lowercase();
    PROTECTED_PAGES.iter().any(|page| href.contains(page))
}

pub fn login_redirect_url(target: &str) -> String {
    format!("{}?{}={}", LOGIN_PAGE, REDIRECT_PARAM, urlencoding::encode(target))
}

/// Decision for the page being loaded.
pub fn gate_location(store: &impl KeyValueStore, pathname: &str, search: &str, hash: &str) -> Gate {
    if is_protected_page(&page_name(pathname)) && !is_authenticated(store) {
        Gate::RedirectToLogin(login_redirect_url(&format!("{}{}{}", pathname, search, hash)))
    } else {
        Gate::Allow
    }
}

/// Decision for an in-page link about to be followed.
pub fn gate_link(store: &impl KeyValueStore, href: &str) -> Gate {
    if link_is_protected(href) && !is_authenticated(store) {
        Gate::RedirectToLogin(login_redirect_url(href))
    } else {
        Gate::Allow
    }
}

/// The `redirect` query parameter, decoded. Only site-relative targets are
/// honoured; anything else sends the user home.
pub fn redirect_target(search: &str) -> Option<String> {
    let query = search.strip_prefix('?').unwrap_or(search);
    let raw = query.split('&').find_map(|pair| {
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        (key == REDIRECT_PARAM).then_some(value)
    })?;
    if raw.is_empty() {
        return None;
    }

    let decoded = urlencoding::decode(&raw.replace('+', " ")).ok()?.into_owned();
    if is_site_relative(&decoded) {
        Some(decoded)
    } else {
        log::warn!("Ignoring off-site redirect target");
        Some(HOME_PAGE.to_string())
    }
}

fn is_site_relative(target: &str) -> bool {
    if target.trim().is_empty() || target.starts_with("//") || target.starts_with('\\') {
        return false;
    }
    let head_end = target.find(['/', '?', '#']).unwrap_or(target.len());
    !target[..head_end].contains(':')
}

pub fn attach(ctx: &SharedContext) {
    guard_current_page(ctx);
    intercept_protected_links(ctx);
    handle_login_page(ctx);
    attach_login_form(ctx);
    attach_signup_form(ctx);
    attach_logout(ctx);
}

fn guard_current_page(ctx: &SharedContext) {
    let location = ctx.window.location();
    let pathname = location.pathname().unwrap_or_default();
    let search = location.search().unwrap_or_default();
    let hash = location.hash().unwrap_or_default();

    if let Gate::RedirectToLogin(url) = gate_location(&ctx.store, &pathname, &search, &hash) {
        log::info!("{} requires sign-in, redirecting", pathname);
        ctx.navigate(&url);
    }
}

fn intercept_protected_links(ctx: &SharedContext) {
    let ctx = ctx.clone();
    listen(&ctx.document.clone(), "click", move |event: Event| {
        let Some(anchor) = event_element(&event).and_then(|el| closest(&el, "a[href]")) else {
            return;
        };
        let Some(href) = anchor.get_attribute("href").filter(|h| !h.is_empty()) else {
            return;
        };
        if let Gate::RedirectToLogin(url) = gate_link(&ctx.store, &href) {
            event.prevent_default();
            ctx.navigate(&url);
        }
    });
}

fn handle_login_page(ctx: &SharedContext) {
    if ctx.current_page() != LOGIN_PAGE {
        return;
    }
    let search = ctx.window.location().search().unwrap_or_default();
    let Some(target) = redirect_target(&search) else {
        return;
    };

    if is_authenticated(&ctx.store) {
        ctx.navigate(&target);
        return;
    }

    let Some(body) = ctx.document.body() else {
        return;
    };

    // A login finishing in place shows up as DOM churn; check the token then.
    let fired = Rc::new(Cell::new(false));
    let on_mutation = {
        let ctx = ctx.clone();
        Closure::wrap(Box::new(move || {
            if !fired.get() && is_authenticated(&ctx.store) {
                fired.set(true);
                ctx.navigate(&target);
            }
        }) as Box<dyn FnMut()>)
    };

    let Ok(observer) = MutationObserver::new(on_mutation.as_ref().unchecked_ref()) else {
        return;
    };
    let options = MutationObserverInit::new();
    options.set_child_list(true);
    options.set_subtree(true);
    if observer.observe_with_options(&body, &options).is_err() {
        return;
    }
    on_mutation.forget();

    Timeout::new(LOGIN_WATCH_MS, move || observer.disconnect()).forget();
}

fn attach_login_form(ctx: &SharedContext) {
    let Some(form) = ctx.by_id("loginForm") else {
        return;
    };
    claim(&form);

    let ctx = ctx.clone();
    let target = form.clone();
    listen(&form, "submit", move |event: Event| {
        event.prevent_default();
        let email = field_value(&target, "email");
        let password = field_value(&target, "password");

        if let Err(err) = validate_login(&email, &password) {
            ctx.notifier.show(err.to_string(), ToastKind::Error);
            return;
        }

        let busy = set_busy(&target, "Signing in...");
        let ctx = ctx.clone();
        spawn_local(async move {
            let body = json!({ "email": email, "password": password });
            let reply = ctx
                .api
                .post_reply::<_, LoginSession>(LOGIN_ENDPOINT, &body)
                .await;
            if let Some((button, original)) = &busy {
                restore_busy(button, original);
            }

            match reply {
                Ok(BackendReply::Success(session)) => {
                    store_session(&ctx.store, &session.token, &session.user);
                    ctx.notifier.show("Login successful!", ToastKind::Success);
                    let search = ctx.window.location().search().unwrap_or_default();
                    let next = redirect_target(&search).unwrap_or_else(|| POST_LOGIN_PAGE.to_string());
                    ctx.navigate(&next);
                }
                Ok(BackendReply::Failure { error }) => ctx.notifier.show(
                    error.unwrap_or_else(|| "Login failed".to_string()),
                    ToastKind::Error,
                ),
                Err(err) => ctx.notifier.show(err.to_string(), ToastKind::Error),
            }
        });
    });
}

fn attach_signup_form(ctx: &SharedContext) {
    let Some(form) = ctx.by_id("signupForm") else {
        return;
    };
    claim(&form);

    let ctx = ctx.clone();
    let target = form.clone();
    listen(&form, "submit", move |event: Event| {
        event.prevent_default();
        let name = field_value(&target, "name").trim().to_string();
        let email = field_value(&target, "email");
        let password = field_value(&target, "password");

        if let Err(err) = validate_signup(&name, &email, &password) {
            ctx.notifier.show(err.to_string(), ToastKind::Error);
            return;
        }

        let ctx = ctx.clone();
        let form = target.clone();
        spawn_local(async move {
            let body = json!({ "name": name, "email": email, "password": password });
            match ctx
                .api
                .post_reply::<_, SignupAccount>(SIGNUP_ENDPOINT, &body)
                .await
            {
                Ok(BackendReply::Success(account)) => {
                    log::debug!("Registered {}", account.user);
                    ctx.notifier
                        .show("Account created! Please log in.", ToastKind::Success);
                    reset(&form);
                }
                Ok(BackendReply::Failure { error }) => ctx.notifier.show(
                    error.unwrap_or_else(|| "Sign up failed".to_string()),
                    ToastKind::Error,
                ),
                Err(err) => ctx.notifier.show(err.to_string(), ToastKind::Error),
            }
        });
    });
}

fn attach_logout(ctx: &SharedContext) {
    for button in ctx.query_all("[data-logout], #logoutBtn") {
        let ctx = ctx.clone();
        listen(&button, "click", move |event: Event| {
            event.prevent_default();
            clear_session(&ctx.store);
            ctx.notifier.show("You have been logged out.", ToastKind::Info);
            let ctx = ctx.clone();
            Timeout::new(LOGOUT_DELAY_MS, move || ctx.navigate(HOME_PAGE)).forget();
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::memory::MemoryStore;

    #[test]
    fn token_presence_is_authentication() {
        assert!(!is_authenticated(&MemoryStore::default()));
        assert!(!is_authenticated(&MemoryStore::with(&[(AUTH_TOKEN_KEY, "")])));
        assert!(is_authenticated(&MemoryStore::with(&[(AUTH_TOKEN_KEY, "abc")])));
    }

    #[test]
    fn dashboard_without_token_redirects_to_login() {
        let store = MemoryStore::default();
        assert_eq!(
            gate_location(&store, "/dashboard.html", "", ""),
            Gate::RedirectToLogin("login.html?redirect=%2Fdashboard.html".into())
        );
    }

    #[test]
    fn dashboard_with_token_is_allowed() {
        let store = MemoryStore::with(&[(AUTH_TOKEN_KEY, "abc")]);
        assert_eq!(gate_location(&store, "/dashboard.html", "", ""), Gate::Allow);
    }

    #[test]
    fn redirect_keeps_query_and_hash() {
        let store = MemoryStore::default();
        assert_eq!(
            gate_location(&store, "/site/Budget-Optimizer.html", "?m=1", "#top"),
            Gate::RedirectToLogin("login.html?redirect=%2Fsite%2FBudget-Optimizer.html%3Fm%3D1%23top".into())
        );
    }

    #[test]
    fn public_pages_pass() {
        let store = MemoryStore::default();
        assert_eq!(gate_location(&store, "/", "", ""), Gate::Allow);
        assert_eq!(gate_location(&store, "/index.html", "", ""), Gate::Allow);
        assert_eq!(gate_location(&store, "/login.html", "?redirect=x", ""), Gate::Allow);
    }

    #[test]
    fn page_names() {
        assert_eq!(page_name("/"), "index.html");
        assert_eq!(page_name(""), "index.html");
        assert_eq!(page_name("/a/B/Dashboard.HTML"), "dashboard.html");
    }

    #[test]
    fn protected_links_match_by_substring() {
        let store = MemoryStore::default();
        assert_eq!(
            gate_link(&store, "Investment-Guide.html#start"),
            Gate::RedirectToLogin("login.html?redirect=Investment-Guide.html%23start".into())
        );
        assert_eq!(gate_link(&store, "#features"), Gate::Allow);

        let signed_in = MemoryStore::with(&[(AUTH_TOKEN_KEY, "t")]);
        assert_eq!(gate_link(&signed_in, "dashboard.html"), Gate::Allow);
    }

    #[test]
    fn redirect_param_round_trips() {
        let url = login_redirect_url("/dashboard.html?tab=goals");
        let search = url.split_once('?').map(|(_, q)| format!("?{}", q)).unwrap();
        assert_eq!(redirect_target(&search).as_deref(), Some("/dashboard.html?tab=goals"));
    }

    #[test]
    fn redirect_param_edge_cases() {
        assert_eq!(redirect_target(""), None);
        assert_eq!(redirect_target("?redirect="), None);
        assert_eq!(redirect_target("?other=1"), None);
        assert_eq!(redirect_target("?a=1&redirect=dashboard.html").as_deref(), Some("dashboard.html"));
        assert_eq!(
            redirect_target("?redirect=https%3A%2F%2Fevil.example").as_deref(),
            Some(HOME_PAGE)
        );
        assert_eq!(redirect_target("?redirect=%2F%2Fevil.example").as_deref(), Some(HOME_PAGE));
        assert_eq!(redirect_target("?redirect=javascript%3Aalert(1)").as_deref(), Some(HOME_PAGE));
    }

    #[test]
    fn session_store_and_clear() {
        let store = MemoryStore::default();
        store_session(&store, "tok", &json!({"name": "Meera"}));
        assert_eq!(store.get(AUTH_TOKEN_KEY).as_deref(), Some("tok"));
        assert_eq!(store.get(USER_DATA_KEY).as_deref(), Some(r#"{"name":"Meera"}"#));

        clear_session(&store);
        assert!(!is_authenticated(&store));
        assert_eq!(store.get(USER_DATA_KEY), None);
    }
}
