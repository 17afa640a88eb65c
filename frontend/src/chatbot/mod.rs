//! The financial assistant: a Yew widget mounted inside the chat modal, plus
//! the plain DOM controller that opens and closes that modal.

pub mod backend;
pub mod history;
pub mod markdown;
pub mod responder;
pub mod reveal;
pub mod widget;

use gloo_timers::callback::Timeout;
use web_sys::{Element, Event};

use crate::dom::{as_html, closest, event_element, listen, set_style, SharedContext};
use reveal::RevealRegistry;
use widget::{ChatbotProps, ChatbotWidget};

const MODAL_ID: &str = "chatbotModal";
const INPUT_ID: &str = "chatbotInput";
const OPEN_SELECTOR: &str = "[data-open-chatbot], .chatbot-trigger";
const CLOSE_SELECTOR: &str = "[data-close-chatbot]";
const FOCUS_DELAY_MS: u32 = 100;

pub fn attach(ctx: &SharedContext) {
    let reveals = RevealRegistry::default();
    if mount_widget(ctx, &reveals) {
        attach_modal(ctx, reveals);
    }
}

/// `#chatbotWidget` when the page provides one, otherwise the modal's content
/// box, otherwise the modal itself.
fn widget_host(ctx: &SharedContext) -> Option<Element> {
    ctx.by_id("chatbotWidget")
        .or_else(|| ctx.query(&format!("#{} .modal-content", MODAL_ID)))
        .or_else(|| ctx.by_id(MODAL_ID))
}

fn mount_widget(ctx: &SharedContext, reveals: &RevealRegistry) -> bool {
    let Some(host) = widget_host(ctx) else {
        return false;
    };
    let props = ChatbotProps {
        api: ctx.api.clone(),
        store: ctx.store.clone(),
        history_cap: ctx.config.chat_history_cap,
        reveals: reveals.clone(),
    };
    yew::Renderer::<ChatbotWidget>::with_root_and_props(host, props).render();
    log::debug!("Chat widget mounted");
    true
}

fn open_modal(ctx: &SharedContext) {
    let Some(modal) = ctx.by_id(MODAL_ID) else {
        return;
    };
    set_style(&modal, "display", "block");

    let ctx = ctx.clone();
    Timeout::new(FOCUS_DELAY_MS, move || {
        if let Some(input) = ctx.by_id(INPUT_ID).and_then(|el| as_html(&el)) {
            let _ = input.focus();
        }
    })
    .forget();
}

fn close_modal(ctx: &SharedContext, reveals: &RevealRegistry) {
    if let Some(modal) = ctx.by_id(MODAL_ID) {
        set_style(&modal, "display", "none");
    }
    reveals.finish_all();
}

/// One delegated listener, since the close button is rendered by the widget.
fn attach_modal(ctx: &SharedContext, reveals: RevealRegistry) {
    let ctx = ctx.clone();
    listen(&ctx.document.clone(), "click", move |event: Event| {
        let Some(target) = event_element(&event) else {
            return;
        };

        if closest(&target, OPEN_SELECTOR).is_some() {
            event.prevent_default();
            open_modal(&ctx);
        } else if closest(&target, CLOSE_SELECTOR).is_some() || target.id() == MODAL_ID {
            close_modal(&ctx, &reveals);
        }
    });
}
