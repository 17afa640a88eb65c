//! Which service answers a chat message: the preferred remote backend, then
//! the other one, then the offline responder.

use std::future::Future;

use crate::api::{ApiClient, BackendReply};
use crate::chatbot::responder::local_reply;
use crate::config::{CHAT_ADVANCED_ENDPOINT, CHAT_CLASSIC_ENDPOINT};
use crate::error::ApiError;
use crate::models::{ChatbotAnswer, ChatbotQuestion};

const EMPTY_CLASSIC_REPLY: &str = "Okay.";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BackendMode {
    #[default]
    Advanced,
    Classic,
}

impl BackendMode {
    /// Value of the mode selector; unknown values fall back to the default.
    pub fn parse(raw: &str) -> Self {
        match raw {
            "classic" => BackendMode::Classic,
            _ => BackendMode::Advanced,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BackendMode::Advanced => "ollama",
            BackendMode::Classic => "classic",
        }
    }

    /// Remote backends in the order they are tried.
    pub fn chain(self) -> [RemoteBackend; 2] {
        match self {
            BackendMode::Advanced => [RemoteBackend::Advanced, RemoteBackend::Classic],
            BackendMode::Classic => [RemoteBackend::Classic, RemoteBackend::Advanced],
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RemoteBackend {
    Advanced,
    Classic,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Accepted {
    pub text: String,
    pub suggestions: Vec<String>,
}

impl RemoteBackend {
    pub fn endpoint(self) -> &'static str {
        match self {
            RemoteBackend::Advanced => CHAT_ADVANCED_ENDPOINT,
            RemoteBackend::Classic => CHAT_CLASSIC_ENDPOINT,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            RemoteBackend::Advanced => "Ollama",
            RemoteBackend::Classic => "Classic",
        }
    }

    /// The advanced model only counts when it actually said something; the
    /// classic engine is trusted on `success` alone.
    pub fn accept(self, reply: BackendReply<ChatbotAnswer>) -> Option<Accepted> {
        let BackendReply::Success(answer) = reply else {
            return None;
        };
        let text = answer.response.filter(|text| !text.is_empty());
        let text = match self {
            RemoteBackend::Advanced => text?,
            RemoteBackend::Classic => text.unwrap_or_else(|| EMPTY_CLASSIC_REPLY.to_string()),
        };
        Some(Accepted {
            text,
            suggestions: answer.suggestions,
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ServedBy {
    Primary(RemoteBackend),
    Secondary(RemoteBackend),
    Local,
}

impl ServedBy {
    pub fn label(self) -> &'static str {
        match self {
            ServedBy::Primary(backend) | ServedBy::Secondary(backend) => backend.label(),
            ServedBy::Local => "Local",
        }
    }

    /// Badge `(background, foreground)`.
    pub fn badge_colors(self) -> (&'static str, &'static str) {
        match self {
            ServedBy::Primary(RemoteBackend::Advanced) | ServedBy::Secondary(RemoteBackend::Advanced) => {
                ("#ecfdf5", "#065f46")
            }
            ServedBy::Primary(RemoteBackend::Classic) | ServedBy::Secondary(RemoteBackend::Classic) => {
                ("#eff6ff", "#1e40af")
            }
            ServedBy::Local => ("#f3f4f6", "#374151"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BotReply {
    pub text: String,
    pub served: ServedBy,
    pub suggestions: Vec<String>,
}

/// Runs `attempt` on each candidate in turn and stops at the first `Some`,
/// reporting the position of the candidate that produced it.
pub async fn first_accepted<C, T, Fut>(
    candidates: impl IntoIterator<Item = C>,
    mut attempt: impl FnMut(C) -> Fut,
) -> Option<(usize, C, T)>
where
    C: Copy,
    Fut: Future<Output = Option<T>>,
{
    for (position, candidate) in candidates.into_iter().enumerate() {
        if let Some(value) = attempt(candidate).await {
            return Some((position, candidate, value));
        }
    }
    None
}

/// Answers `message`, asking remote backends through `ask`.
pub async fn answer<F, Fut>(mode: BackendMode, message: &str, ask: F) -> BotReply
where
    F: Fn(RemoteBackend) -> Fut,
    Fut: Future<Output = Result<BackendReply<ChatbotAnswer>, ApiError>>,
{
    let found = first_accepted(mode.chain(), |backend| {
        let pending = ask(backend);
        async move {
            match pending.await {
                Ok(reply) => backend.accept(reply),
                Err(err) => {
                    log::warn!("{} chat backend failed: {}", backend.label(), err);
                    None
                }
            }
        }
    })
    .await;

    match found {
        Some((position, backend, accepted)) => BotReply {
            text: accepted.text,
            served: if position == 0 {
                ServedBy::Primary(backend)
            } else {
                ServedBy::Secondary(backend)
            },
            suggestions: accepted.suggestions,
        },
        None => BotReply {
            text: local_reply(message).to_string(),
            served: ServedBy::Local,
            suggestions: Vec::new(),
        },
    }
}

pub async fn ask_remote(
    api: &ApiClient,
    backend: RemoteBackend,
    message: &str,
) -> Result<BackendReply<ChatbotAnswer>, ApiError> {
    api.post_reply(backend.endpoint(), &ChatbotQuestion { message })
        .await
}
