use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen_futures::spawn_local;
use web_sys::{Element, HtmlInputElement, HtmlSelectElement};
use yew::prelude::*;

use crate::api::ApiClient;
use crate::chatbot::backend::{answer, ask_remote, BackendMode, ServedBy};
use crate::chatbot::history::{load_history, save_history, ChatMessage, Role};
use crate::chatbot::markdown::render_markdown;
use crate::chatbot::reveal::{needs_reveal, spawn_reveal, RevealRegistry};
use crate::icons::{icon_close, icon_send};
use crate::storage::BrowserStorage;

#[derive(Clone, Debug, PartialEq)]
struct Entry {
    id: u64,
    role: Role,
    content: String,
    /// Visible prefix while a reveal is still running.
    shown: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ChatState {
    entries: Vec<Entry>,
    suggestions: Vec<String>,
    served: Option<ServedBy>,
    /// Bumped whenever the persisted transcript changes.
    revision: u64,
}

pub enum ChatAction {
    Push { id: u64, message: ChatMessage },
    BeginReveal { id: u64, text: String },
    Reveal { id: u64, shown: String, done: bool },
    Suggest(Vec<String>),
    Served(ServedBy),
}

impl Reducible for ChatState {
    type Action = ChatAction;

    fn reduce(self: Rc<Self>, action: Self::Action) -> Rc<Self> {
        let mut next = (*self).clone();
        match action {
            ChatAction::Push { id, message } => {
                next.entries.push(Entry {
                    id,
                    role: message.role,
                    content: message.content,
                    shown: None,
                });
                next.revision += 1;
            }
            ChatAction::BeginReveal { id, text } => {
                next.entries.push(Entry {
                    id,
                    role: Role::Assistant,
                    content: text,
                    shown: Some(String::new()),
                });
            }
            ChatAction::Reveal { id, shown, done } => {
                let Some(entry) = next.entries.iter_mut().find(|e| e.id == id) else {
                    return self;
                };
                if entry.shown.is_none() {
                    return self;
                }
                if done {
                    entry.shown = None;
                    next.revision += 1;
                } else {
                    entry.shown = Some(shown);
                }
            }
            ChatAction::Suggest(suggestions) => next.suggestions = suggestions,
            ChatAction::Served(served) => next.served = Some(served),
        }
        next.into()
    }
}

impl ChatState {
    fn restored(messages: Vec<ChatMessage>) -> Self {
        let entries = messages
            .into_iter()
            .zip(0u64..)
            .map(|(message, id)| Entry {
                id,
                role: message.role,
                content: message.content,
                shown: None,
            })
            .collect();
        Self {
            entries,
            ..Self::default()
        }
    }

    /// Finished messages only; a reveal in flight is saved once it completes.
    fn transcript(&self) -> Vec<ChatMessage> {
        self.entries
            .iter()
            .filter(|e| e.shown.is_none())
            .map(|e| ChatMessage {
                role: e.role,
                content: e.content.clone(),
            })
            .collect()
    }
}

fn next_id(ids: &Rc<RefCell<u64>>) -> u64 {
    let mut counter = ids.borrow_mut();
    let id = *counter;
    *counter += 1;
    id
}

fn markdown_paragraph(text: &str) -> Html {
    let paragraph = web_sys::window()
        .and_then(|w| w.document())
        .and_then(|d| d.create_element("p").ok());
    match paragraph {
        Some(p) => {
            p.set_inner_html(&render_markdown(text));
            Html::VRef(p.into())
        }
        None => html! { <p>{ text.to_string() }</p> },
    }
}

/// Puts `text` in the input box and sends whatever the box then holds.
fn fill_and_send(input_ref: &NodeRef, send: &Callback<String>, text: &str) {
    match input_ref.cast::<HtmlInputElement>() {
        Some(input) => {
            input.set_value(text);
            send.emit(input.value());
        }
        None => send.emit(text.to_string()),
    }
}

#[derive(Properties, PartialEq)]
pub struct ChatbotProps {
    pub api: ApiClient,
    pub store: BrowserStorage,
    pub history_cap: usize,
    pub reveals: RevealRegistry,
}

#[function_component(ChatbotWidget)]
pub fn chatbot_widget(props: &ChatbotProps) -> Html {
    let chat = {
        let store = props.store.clone();
        use_reducer(move || ChatState::restored(load_history(&store)))
    };
    let ids = {
        let restored = chat.entries.len() as u64;
        use_mut_ref(move || restored)
    };
    let mode = use_state(BackendMode::default);
    let input_ref = use_node_ref();
    let messages_ref = use_node_ref();

    {
        let revision = chat.revision;
        let chat = chat.clone();
        let store = props.store.clone();
        let cap = props.history_cap;
        use_effect_with_deps(
            move |revision: &u64| {
                if *revision > 0 && !save_history(&store, &chat.transcript(), cap) {
                    log::debug!("Chat history not persisted");
                }
                || ()
            },
            revision,
        );
    }

    {
        let reveals = props.reveals.clone();
        use_effect_with_deps(move |_| move || reveals.abandon_all(), ());
    }

    {
        let messages_ref = messages_ref.clone();
        use_effect(move || {
            if let Some(container) = messages_ref.cast::<Element>() {
                container.set_scroll_top(container.scroll_height());
            }
            || ()
        });
    }

    let send = {
        let chat = chat.clone();
        let ids = ids.clone();
        let mode = *mode;
        let api = props.api.clone();
        let reveals = props.reveals.clone();
        let input_ref = input_ref.clone();
        Callback::from(move |text: String| {
            let message = text.trim().to_string();
            if message.is_empty() {
                return;
            }
            if let Some(input) = input_ref.cast::<HtmlInputElement>() {
                input.set_value("");
            }

            chat.dispatch(ChatAction::Suggest(Vec::new()));
            chat.dispatch(ChatAction::Push {
                id: next_id(&ids),
                message: ChatMessage::user(message.clone()),
            });

            let chat = chat.clone();
            let ids = ids.clone();
            let api = api.clone();
            let reveals = reveals.clone();
            spawn_local(async move {
                let reply = {
                    let api = &api;
                    let question = message.as_str();
                    answer(mode, question, move |backend| ask_remote(api, backend, question)).await
                };
                log::debug!("Chat answered by {}", reply.served.label());
                chat.dispatch(ChatAction::Served(reply.served));

                let id = next_id(&ids);
                if needs_reveal(&reply.text) {
                    chat.dispatch(ChatAction::BeginReveal {
                        id,
                        text: reply.text.clone(),
                    });
                    let progress = chat.clone();
                    spawn_reveal(reply.text, reveals.start(), move |shown, done| {
                        progress.dispatch(ChatAction::Reveal {
                            id,
                            shown: shown.to_string(),
                            done,
                        })
                    });
                } else {
                    chat.dispatch(ChatAction::Push {
                        id,
                        message: ChatMessage::assistant(reply.text),
                    });
                }

                if !reply.suggestions.is_empty() {
                    chat.dispatch(ChatAction::Suggest(reply.suggestions));
                }
            });
        })
    };

    let on_keypress = {
        let send = send.clone();
        let input_ref = input_ref.clone();
        Callback::from(move |e: KeyboardEvent| {
            if e.key() == "Enter" {
                if let Some(input) = input_ref.cast::<HtmlInputElement>() {
                    send.emit(input.value());
                }
            }
        })
    };

    let on_send_click = {
        let send = send.clone();
        let input_ref = input_ref.clone();
        Callback::from(move |_: MouseEvent| {
            if let Some(input) = input_ref.cast::<HtmlInputElement>() {
                send.emit(input.value());
            }
        })
    };

    let on_mode_change = {
        let mode = mode.clone();
        Callback::from(move |e: Event| {
            if let Some(select) = e.target_dyn_into::<HtmlSelectElement>() {
                mode.set(BackendMode::parse(&select.value()));
            }
        })
    };

    let (badge_text, badge_style) = match chat.served {
        Some(served) => {
            let (background, color) = served.badge_colors();
            (
                served.label(),
                format!("font-size: 0.75rem; padding: 4px 8px; border-radius: 999px; background: {}; color: {};", background, color),
            )
        }
        None => (
            "Ready",
            "font-size: 0.75rem; padding: 4px 8px; border-radius: 999px; background: #eef2ff; color: #4f46e5;".to_string(),
        ),
    };

    html! {
        <div class="chatbot-widget">
            <div class="chatbot-header">
                <h3>{"AI Financial Assistant"}</h3>
                <div class="chatbot-controls" style="display: flex; align-items: center; gap: 8px; margin-left: auto;">
                    <label for="aiModeSelect" style="font-size: 0.85rem;">{"AI mode"}</label>
                    <select id="aiModeSelect" onchange={on_mode_change}>
                        <option value={BackendMode::Advanced.as_str()} selected={*mode == BackendMode::Advanced}>{"Ollama"}</option>
                        <option value={BackendMode::Classic.as_str()} selected={*mode == BackendMode::Classic}>{"Classic"}</option>
                    </select>
                    <span id="aiBackendBadge" style={badge_style}>{ badge_text }</span>
                    <button type="button" class="close-chatbot" data-close-chatbot="true" aria-label="Close chat">
                        { icon_close() }
                    </button>
                </div>
            </div>

            <div id="chatbotMessages" class="chatbot-messages" ref={messages_ref}>
                { for chat.entries.iter().map(|entry| html! {
                    <div key={entry.id} class={entry.role.css_class()}>
                        { markdown_paragraph(entry.shown.as_deref().unwrap_or(&entry.content)) }
                    </div>
                }) }
                {
                    if chat.suggestions.is_empty() {
                        html! {}
                    } else {
                        html! {
                            <div class="chatbot-suggestions">
                                <p>{"You might also want to ask about:"}</p>
                                <div class="suggestion-buttons">
                                    { for chat.suggestions.iter().map(|suggestion| {
                                        let send = send.clone();
                                        let input_ref = input_ref.clone();
                                        let text = suggestion.clone();
                                        let on_pick = Callback::from(move |_: MouseEvent| {
                                            fill_and_send(&input_ref, &send, &text)
                                        });
                                        html! {
                                            <button type="button" class="suggestion-btn" onclick={on_pick}>
                                                { suggestion }
                                            </button>
                                        }
                                    }) }
                                </div>
                            </div>
                        }
                    }
                }
            </div>

            <div class="chatbot-input">
                <input id="chatbotInput" type="text" ref={input_ref} placeholder="Ask me anything about personal finance..." onkeypress={on_keypress} />
                <button type="button" class="send-btn" aria-label="Send message" onclick={on_send_click}>
                    { icon_send() }
                </button>
            </div>
        </div>
    }
}
