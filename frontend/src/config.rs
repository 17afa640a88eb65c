use web_sys::Document;

/// Same-origin by default; the site's pages are served by the backend.
pub const DEFAULT_API_BASE_URL: &str = "";

pub const AUTH_TOKEN_KEY: &str = "authToken";
pub const USER_DATA_KEY: &str = "userData";
pub const THEME_KEY: &str = "theme";
pub const CHAT_HISTORY_KEY: &str = "chatHistory";

pub const PROTECTED_PAGES: [&str; 3] = [
    "dashboard.html",
    "budget-optimizer.html",
    "investment-guide.html",
];
pub const LOGIN_PAGE: &str = "login.html";
pub const HOME_PAGE: &str = "index.html";
pub const POST_LOGIN_PAGE: &str = "dashboard.html";
pub const REDIRECT_PARAM: &str = "redirect";
pub const LOGIN_WATCH_MS: u32 = 5_000;

pub const INVESTMENT_ENDPOINT: &str = "/api/investment/analyze";
pub const BUDGET_ENDPOINT: &str = "/api/budget/optimize";
pub const PORTFOLIO_ENDPOINT: &str = "/api/portfolio/optimize";
pub const CHAT_ADVANCED_ENDPOINT: &str = "/api/chatbot/ollama";
pub const CHAT_CLASSIC_ENDPOINT: &str = "/api/chatbot/query";
pub const LOGIN_ENDPOINT: &str = "/api/auth/login";
pub const SIGNUP_ENDPOINT: &str = "/api/auth/signup";
pub const ERROR_LOG_ENDPOINT: &str = "/api/errors/log";
pub const ANALYTICS_ENDPOINT: &str = "/api/analytics/track";

pub const SERVICE_WORKER_URL: &str = "/service-worker.js";

pub const STREAM_THRESHOLD_CHARS: usize = 400;
pub const STREAM_CHUNK_CHARS: usize = 30;
pub const STREAM_DELAY_MS: u32 = 30;
pub const DEFAULT_CHAT_HISTORY_CAP: usize = 100;

pub const TOAST_DEFAULT_MS: u32 = 5_000;
pub const TOAST_SHORT_MS: u32 = 3_000;
pub const TOAST_ENTER_MS: u32 = 100;
pub const TOAST_EXIT_MS: u32 = 300;

pub const RESULTS_SECTION: &str = "#tools";

/// Per-page settings resolved once at startup.
#[derive(Clone, Debug, PartialEq)]
pub struct SiteConfig {
    pub api_base_url: String,
    pub chat_history_cap: usize,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            chat_history_cap: DEFAULT_CHAT_HISTORY_CAP,
        }
    }
}

impl SiteConfig {
    /// Reads `<meta name="api-base-url">` and `<meta name="chat-history-cap">`
    /// overrides, keeping defaults for anything missing or unparsable.
    pub fn from_document(document: &Document) -> Self {
        let meta = |name: &str| {
            document
                .query_selector(&format!("meta[name=\"{}\"]", name))
                .ok()
                .flatten()
                .and_then(|el| el.get_attribute("content"))
        };

        Self::from_overrides(meta("api-base-url"), meta("chat-history-cap"))
    }

    fn from_overrides(base_url: Option<String>, history_cap: Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(url) = base_url {
            config.api_base_url = url.trim().trim_end_matches('/').to_string();
        }

        match history_cap.map(|raw| raw.trim().parse::<usize>()) {
            Some(Ok(cap)) if cap > 0 => config.chat_history_cap = cap,
            Some(_) => log::warn!("Ignoring invalid chat-history-cap meta value"),
            None => {}
        }

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_without_overrides() {
        assert_eq!(SiteConfig::from_overrides(None, None), SiteConfig::default());
    }

    #[test]
    fn base_url_override_drops_trailing_slash() {
        let config = SiteConfig::from_overrides(Some(" http://localhost:5000/ ".into()), None);
        assert_eq!(config.api_base_url, "http://localhost:5000");
    }

    #[test]
    fn invalid_history_cap_keeps_default() {
        let config = SiteConfig::from_overrides(None, Some("zero".into()));
        assert_eq!(config.chat_history_cap, DEFAULT_CHAT_HISTORY_CAP);

        let config = SiteConfig::from_overrides(None, Some("0".into()));
        assert_eq!(config.chat_history_cap, DEFAULT_CHAT_HISTORY_CAP);

        let config = SiteConfig::from_overrides(None, Some("25".into()));
        assert_eq!(config.chat_history_cap, 25);
    }
}
