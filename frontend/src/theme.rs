use web_sys::Event;

use crate::config::THEME_KEY;
use crate::dom::{listen, SharedContext};
use crate::storage::KeyValueStore;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    /// Anything but `dark` is the light theme.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            Some("dark") => Theme::Dark,
            _ => Theme::Light,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }

    /// Font Awesome class for the toggle icon: the icon shows the theme you
    /// would switch to.
    pub fn icon_class(self) -> &'static str {
        match self {
            Theme::Light => "fas fa-moon",
            Theme::Dark => "fas fa-sun",
        }
    }
}

pub fn load_theme(store: &impl KeyValueStore) -> Theme {
    Theme::parse(store.get(THEME_KEY).as_deref())
}

fn current_theme(ctx: &SharedContext) -> Theme {
    let attr = ctx.document.body().and_then(|b| b.get_attribute("data-theme"));
    Theme::parse(attr.as_deref())
}

fn apply_theme(ctx: &SharedContext, theme: Theme) {
    if let Some(body) = ctx.document.body() {
        let _ = match theme {
            Theme::Dark => body.set_attribute("data-theme", "dark"),
            Theme::Light => body.remove_attribute("data-theme"),
        };
    }
    if let Some(icon) = ctx.by_id("theme-icon") {
        icon.set_class_name(theme.icon_class());
    }
}

pub fn attach(ctx: &SharedContext) {
    apply_theme(ctx, load_theme(&ctx.store));

    for toggle in ctx.query_all("#themeToggle, .theme-toggle") {
        let ctx = ctx.clone();
        listen(&toggle, "click", move |_event: Event| {
            let next = current_theme(&ctx).toggled();
            apply_theme(&ctx, next);
            ctx.store.set(THEME_KEY, next.as_str());
            log::debug!("Theme switched to {}", next.as_str());
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::memory::MemoryStore;

    #[test]
    fn unknown_values_are_light() {
        assert_eq!(Theme::parse(None), Theme::Light);
        assert_eq!(Theme::parse(Some("solarized")), Theme::Light);
        assert_eq!(Theme::parse(Some("dark")), Theme::Dark);
    }

    #[test]
    fn toggle_flips_icon() {
        assert_eq!(Theme::Light.toggled(), Theme::Dark);
        assert_eq!(Theme::Dark.toggled().icon_class(), "fas fa-moon");
        assert_eq!(Theme::Dark.icon_class(), "fas fa-sun");
    }

    #[test]
    fn saved_preference_is_loaded() {
        assert_eq!(load_theme(&MemoryStore::with(&[(THEME_KEY, "dark")])), Theme::Dark);
        assert_eq!(load_theme(&MemoryStore::default()), Theme::Light);
    }
}
