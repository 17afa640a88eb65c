//! Toast notifications: a queue with enter/visible/leaving phases, rendered
//! by the [`Toaster`] component and fed through a cloneable [`Notifier`].

use gloo_timers::callback::Timeout;
use web_sys::Document;
use yew::html::Scope;
use yew::prelude::*;

use crate::config::{TOAST_DEFAULT_MS, TOAST_ENTER_MS, TOAST_EXIT_MS};
use crate::icons::{icon_alert_circle, icon_alert_triangle, icon_check_circle, icon_close, icon_info};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ToastKind {
    Info,
    Success,
    Error,
    Warning,
}

impl ToastKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ToastKind::Info => "info",
            ToastKind::Success => "success",
            ToastKind::Error => "error",
            ToastKind::Warning => "warning",
        }
    }

    fn background(self) -> &'static str {
        match self {
            ToastKind::Success => "#4CAF50",
            ToastKind::Error => "#f44336",
            ToastKind::Warning => "#ff9800",
            ToastKind::Info => "#2196F3",
        }
    }

    fn icon(self) -> Html {
        match self {
            ToastKind::Success => icon_check_circle(),
            ToastKind::Error => icon_alert_circle(),
            ToastKind::Warning => icon_alert_triangle(),
            ToastKind::Info => icon_info(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Notification {
    pub message: String,
    pub kind: ToastKind,
    pub duration_ms: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Entering,
    Visible,
    Leaving,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Toast {
    pub id: u64,
    pub message: String,
    pub kind: ToastKind,
    pub phase: Phase,
}

#[derive(Debug, Default)]
pub struct ToastQueue {
    next_id: u64,
    toasts: Vec<Toast>,
}

impl ToastQueue {
    pub fn push(&mut self, message: String, kind: ToastKind) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.toasts.push(Toast {
            id,
            message,
            kind,
            phase: Phase::Entering,
        });
        id
    }

    pub fn reveal(&mut self, id: u64) -> bool {
        match self.toasts.iter_mut().find(|t| t.id == id) {
            Some(toast) if toast.phase == Phase::Entering => {
                toast.phase = Phase::Visible;
                true
            }
            _ => false,
        }
    }

    /// Starts the exit transition. Returns false when the toast is gone or
    /// already leaving, so a close click and the auto-dismiss timer never
    /// schedule two removals.
    pub fn dismiss(&mut self, id: u64) -> bool {
        match self.toasts.iter_mut().find(|t| t.id == id) {
            Some(toast) if toast.phase != Phase::Leaving => {
                toast.phase = Phase::Leaving;
                true
            }
            _ => false,
        }
    }

    pub fn remove(&mut self, id: u64) -> bool {
        let before = self.toasts.len();
        self.toasts.retain(|t| t.id != id);
        self.toasts.len() != before
    }

    pub fn toasts(&self) -> &[Toast] {
        &self.toasts
    }
}

pub enum ToasterMsg {
    Push(Notification),
    Reveal(u64),
    Dismiss(u64),
    Remove(u64),
}

pub struct Toaster {
    queue: ToastQueue,
}

impl Component for Toaster {
    type Message = ToasterMsg;
    type Properties = ();

    fn create(_ctx: &Context<Self>) -> Self {
        Self {
            queue: ToastQueue::default(),
        }
    }

    fn update(&mut self, ctx: &Context<Self>, msg: Self::Message) -> bool {
        match msg {
            ToasterMsg::Push(notification) => {
                let id = self.queue.push(notification.message, notification.kind);

                let link = ctx.link().clone();
                Timeout::new(TOAST_ENTER_MS, move || link.send_message(ToasterMsg::Reveal(id))).forget();

                let link = ctx.link().clone();
                Timeout::new(notification.duration_ms, move || {
                    link.send_message(ToasterMsg::Dismiss(id))
                })
                .forget();
                true
            }
            ToasterMsg::Reveal(id) => self.queue.reveal(id),
            ToasterMsg::Dismiss(id) => {
                if !self.queue.dismiss(id) {
                    return false;
                }
                let link = ctx.link().clone();
                Timeout::new(TOAST_EXIT_MS, move || link.send_message(ToasterMsg::Remove(id))).forget();
                true
            }
            ToasterMsg::Remove(id) => self.queue.remove(id),
        }
    }

    fn view(&self, ctx: &Context<Self>) -> Html {
        html! {
            <div class="notification-stack" style="position: fixed; top: 20px; right: 20px; z-index: 10000; display: flex; flex-direction: column; gap: 0.5rem;">
                { for self.queue.toasts().iter().map(|toast| {
                    let id = toast.id;
                    let on_close = ctx.link().callback(move |_: MouseEvent| ToasterMsg::Dismiss(id));
                    let offset = if toast.phase == Phase::Visible { "translateX(0)" } else { "translateX(120%)" };
                    let style = format!(
                        "background: {}; color: white; padding: 1rem 1.5rem; border-radius: 8px; box-shadow: 0 4px 12px rgba(0, 0, 0, 0.15); max-width: 300px; transform: {}; transition: transform 0.3s ease;",
                        toast.kind.background(),
                        offset
                    );

                    html! {
                        <div key={id} role="status" style={style} class={classes!(
                            "notification",
                            format!("notification-{}", toast.kind.as_str()),
                            (toast.phase == Phase::Visible).then_some("show"),
                        )}>
                            <div class="notification-content" style="display: flex; align-items: center; gap: 0.5rem;">
                                { toast.kind.icon() }
                                <span class="notification-message">{ &toast.message }</span>
                                <button class="notification-close" aria-label="Close notification" onclick={on_close} style="background: none; border: none; color: inherit; cursor: pointer;">
                                    { icon_close() }
                                </button>
                            </div>
                        </div>
                    }
                }) }
            </div>
        }
    }
}

/// Cheap handle any controller can hold to raise a toast.
#[derive(Clone, Default)]
pub struct Notifier {
    scope: Option<Scope<Toaster>>,
}

impl Notifier {
    /// Mounts the toast stack at the end of `<body>`.
    pub fn mount(document: &Document) -> Self {
        let host = document.create_element("div").ok();
        let body = document.body();

        match (host, body) {
            (Some(host), Some(body)) => {
                host.set_id("toast-root");
                if body.append_child(&host).is_err() {
                    return Self::default();
                }
                let handle = yew::Renderer::<Toaster>::with_root(host).render();
                Self {
                    scope: Some((*handle).clone()),
                }
            }
            _ => {
                log::warn!("No <body> to host notifications");
                Self::default()
            }
        }
    }

    pub fn show(&self, message: impl Into<String>, kind: ToastKind) {
        self.show_for(message, kind, TOAST_DEFAULT_MS);
    }

    pub fn show_for(&self, message: impl Into<String>, kind: ToastKind, duration_ms: u32) {
        let message = message.into();
        match &self.scope {
            Some(scope) => scope.send_message(ToasterMsg::Push(Notification {
                message,
                kind,
                duration_ms,
            })),
            None => log::info!("[{}] {}", kind.as_str(), message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toast_lifecycle() {
        let mut queue = ToastQueue::default();
        let a = queue.push("Saved".into(), ToastKind::Success);
        let b = queue.push("Oops".into(), ToastKind::Error);
        assert_ne!(a, b);
        assert_eq!(queue.toasts()[0].phase, Phase::Entering);

        assert!(queue.reveal(a));
        assert!(!queue.reveal(a));
        assert_eq!(queue.toasts()[0].phase, Phase::Visible);

        assert!(queue.dismiss(a));
        assert!(!queue.dismiss(a), "second dismiss must not schedule another removal");

        assert!(queue.remove(a));
        assert!(!queue.remove(a));
        assert_eq!(queue.toasts().len(), 1);
        assert_eq!(queue.toasts()[0].id, b);
    }

    #[test]
    fn dismiss_before_reveal_skips_visible_phase() {
        let mut queue = ToastQueue::default();
        let id = queue.push("Closing fast".into(), ToastKind::Info);
        assert!(queue.dismiss(id));
        assert!(!queue.reveal(id));
        assert_eq!(queue.toasts()[0].phase, Phase::Leaving);
    }

    #[test]
    fn unmounted_notifier_does_not_panic() {
        Notifier::default().show("hello", ToastKind::Warning);
    }
}
