//! Progressive reveal of long bot answers, chunk by chunk on a timer.

use std::cell::{Cell, RefCell};
use std::future::Future;
use std::rc::Rc;

use gloo_timers::future::TimeoutFuture;
use wasm_bindgen_futures::spawn_local;

use crate::config::{STREAM_CHUNK_CHARS, STREAM_DELAY_MS, STREAM_THRESHOLD_CHARS};

pub fn needs_reveal(text: &str) -> bool {
    text.chars().count() > STREAM_THRESHOLD_CHARS
}

/// Walks forward through `text` a fixed number of characters at a time,
/// never splitting a UTF-8 sequence.
#[derive(Debug, Clone)]
pub struct RevealCursor {
    text: String,
    shown: usize,
    chunk_chars: usize,
}

impl RevealCursor {
    pub fn new(text: impl Into<String>, chunk_chars: usize) -> Self {
        Self {
            text: text.into(),
            shown: 0,
            chunk_chars: chunk_chars.max(1),
        }
    }

    /// Reveals the next chunk and returns everything shown so far.
    pub fn advance(&mut self) -> &str {
        let rest = &self.text[self.shown..];
        let step = rest
            .char_indices()
            .nth(self.chunk_chars)
            .map(|(i, _)| i)
            .unwrap_or(rest.len());
        self.shown += step;
        &self.text[..self.shown]
    }

    pub fn is_done(&self) -> bool {
        self.shown >= self.text.len()
    }

    pub fn full_text(&self) -> &str {
        &self.text
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum RevealState {
    Running,
    Finishing,
    Done,
    Abandoned,
}

/// Shared switch for one running reveal.
#[derive(Clone, Debug)]
pub struct RevealHandle {
    state: Rc<Cell<RevealState>>,
}

impl Default for RevealHandle {
    fn default() -> Self {
        Self {
            state: Rc::new(Cell::new(RevealState::Running)),
        }
    }
}

impl RevealHandle {
    /// Show the rest at once on the next tick.
    pub fn finish(&self) {
        if self.state.get() == RevealState::Running {
            self.state.set(RevealState::Finishing);
        }
    }

    /// Stop without emitting anything further.
    pub fn abandon(&self) {
        self.state.set(RevealState::Abandoned);
    }

    pub fn is_running(&self) -> bool {
        self.state.get() == RevealState::Running
    }
}

/// Every reveal started by the chat widget, so the modal can finish them
/// all when it closes.
#[derive(Clone, Debug, Default)]
pub struct RevealRegistry {
    handles: Rc<RefCell<Vec<RevealHandle>>>,
}

impl PartialEq for RevealRegistry {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.handles, &other.handles)
    }
}

impl RevealRegistry {
    pub fn start(&self) -> RevealHandle {
        let handle = RevealHandle::default();
        let mut handles = self.handles.borrow_mut();
        handles.retain(RevealHandle::is_running);
        handles.push(handle.clone());
        handle
    }

    pub fn finish_all(&self) {
        for handle in self.handles.borrow_mut().drain(..) {
            handle.finish();
        }
    }

    pub fn abandon_all(&self) {
        for handle in self.handles.borrow_mut().drain(..) {
            handle.abandon();
        }
    }
}

/// Drives a reveal to completion. `on_step(shown, done)` sees strictly
/// growing prefixes and is called with `done == true` exactly once, unless
/// the handle is abandoned first.
pub async fn run_reveal<S, F>(text: String, handle: RevealHandle, mut on_step: impl FnMut(&str, bool), sleep: S)
where
    S: Fn() -> F,
    F: Future<Output = ()>,
{
    let mut cursor = RevealCursor::new(text, STREAM_CHUNK_CHARS);
    loop {
        let shown = cursor.advance().len();
        let done = cursor.is_done();
        on_step(&cursor.full_text()[..shown], done);
        if done {
            handle.state.set(RevealState::Done);
            return;
        }

        sleep().await;

        match handle.state.get() {
            RevealState::Running => {}
            RevealState::Finishing => {
                on_step(cursor.full_text(), true);
                handle.state.set(RevealState::Done);
                return;
            }
            RevealState::Done | RevealState::Abandoned => return,
        }
    }
}

pub fn spawn_reveal(text: String, handle: RevealHandle, on_step: impl FnMut(&str, bool) + 'static) {
    spawn_local(run_reveal(text, handle, on_step, || TimeoutFuture::new(STREAM_DELAY_MS)));
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;

    fn long_text() -> String {
        "₹ savings grow when you invest early. ".repeat(12)
    }

    #[test]
    fn threshold_counts_characters() {
        assert!(!needs_reveal(&"a".repeat(400)));
        assert!(needs_reveal(&"a".repeat(401)));
        assert!(!needs_reveal(&"₹".repeat(400)));
    }

    #[test]
    fn cursor_respects_char_boundaries() {
        let mut cursor = RevealCursor::new("₹₹₹₹₹", 2);
        assert_eq!(cursor.advance(), "₹₹");
        assert_eq!(cursor.advance(), "₹₹₹₹");
        assert!(!cursor.is_done());
        assert_eq!(cursor.advance(), "₹₹₹₹₹");
        assert!(cursor.is_done());
        assert_eq!(cursor.advance(), "₹₹₹₹₹");
    }

    #[test]
    fn full_run_emits_growing_prefixes() {
        let text = long_text();
        let mut frames: Vec<(String, bool)> = Vec::new();
        block_on(run_reveal(
            text.clone(),
            RevealHandle::default(),
            |shown, done| frames.push((shown.to_string(), done)),
            || async {},
        ));

        let expected = text.chars().count().div_ceil(STREAM_CHUNK_CHARS);
        assert_eq!(frames.len(), expected);
        assert!(frames.windows(2).all(|w| w[0].0.len() < w[1].0.len()));
        assert!(frames.iter().all(|(shown, _)| text.starts_with(shown.as_str())));
        assert_eq!(frames.iter().filter(|(_, done)| *done).count(), 1);
        assert_eq!(frames.last().map(|(s, d)| (s.as_str(), *d)), Some((text.as_str(), true)));
    }

    #[test]
    fn finishing_shows_the_rest_at_once() {
        let text = long_text();
        let handle = RevealHandle::default();
        let remote = handle.clone();
        let mut frames: Vec<(String, bool)> = Vec::new();
        block_on(run_reveal(
            text.clone(),
            handle,
            |shown, done| {
                frames.push((shown.to_string(), done));
                remote.finish();
            },
            || async {},
        ));

        assert_eq!(frames.len(), 2);
        assert!(!frames[0].1);
        assert_eq!(frames[1], (text, true));
    }

    #[test]
    fn abandoning_stops_silently() {
        let handle = RevealHandle::default();
        let remote = handle.clone();
        let mut frames = 0;
        block_on(run_reveal(
            long_text(),
            handle,
            |_, done| {
                assert!(!done);
                frames += 1;
                remote.abandon();
            },
            || async {},
        ));
        assert_eq!(frames, 1);
    }

    #[test]
    fn registry_finishes_every_running_reveal() {
        let registry = RevealRegistry::default();
        let a = registry.start();
        let b = registry.start();
        assert!(a.is_running() && b.is_running());

        registry.finish_all();
        assert!(!a.is_running());
        assert!(!b.is_running());
        assert!(registry.handles.borrow().is_empty());

        let c = registry.start();
        registry.abandon_all();
        assert!(!c.is_running());
    }

    #[test]
    fn completed_reveals_leave_the_registry() {
        let registry = RevealRegistry::default();
        let first = registry.start();
        block_on(run_reveal(long_text(), first.clone(), |_, _| {}, || async {}));
        assert!(!first.is_running());
        assert_eq!(first.state.get(), RevealState::Done);

        let second = registry.start();
        assert_eq!(registry.handles.borrow().len(), 1);
        assert!(second.is_running());

        first.finish();
        assert_eq!(first.state.get(), RevealState::Done);
    }

    #[test]
    fn finish_does_not_revive_an_abandoned_reveal() {
        let handle = RevealHandle::default();
        handle.abandon();
        handle.finish();
        assert_eq!(handle.state.get(), RevealState::Abandoned);
    }
}
