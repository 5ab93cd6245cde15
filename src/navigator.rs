//! Flutter-style stack navigation over trait-object views.
//!
//! The navigator owns the screen stack and is the sole dispatcher of input,
//! resize, and navigation requests. It is error-agnostic plumbing: none of
//! the stack operations can fail, and the only terminal condition is popping
//! the last view, which ends the program.

use crate::event::{Cmd, Event, Msg, WinSize};
use crate::key;

/// One interactive screen. Implementations mutate themselves in response to
/// events; moving to a different screen is expressed through a
/// [`NavRequest`] rather than by swapping state in place.
pub trait View {
    /// Kicks off the view's initial background work.
    fn init(&mut self) -> Option<Cmd> {
        None
    }

    /// Renders the view at the given viewport size.
    fn render(&mut self, size: WinSize) -> String;

    /// Handles one event, optionally returning an effect.
    fn handle_event(&mut self, event: &Event) -> Option<Cmd>;
}

/// Predicate deciding which ancestor to keep during
/// [`NavRequest::PushAndRemoveUntil`]; receives the index and view currently
/// at the top of the stack.
pub type KeepFn = Box<dyn Fn(usize, &dyn View) -> bool + Send>;

/// A stack mutation requested by a view. Consumed exactly once by the
/// navigator on the tick after the view emits it.
pub enum NavRequest {
    Push(Box<dyn View>),
    /// Replaces the top of the stack in place. Used for same-level
    /// transitions that must not be reachable via back-navigation.
    Replace(Box<dyn View>),
    /// Pops the top view, optionally delivering a result to the new top.
    Pop(Option<Msg>),
    /// Pops from the top while the predicate rejects the current top, then
    /// pushes the view.
    PushAndRemoveUntil(Box<dyn View>, KeepFn),
}

/// Requests pushing a view onto the stack.
pub fn push(view: impl View + 'static) -> Cmd {
    Cmd::Nav(NavRequest::Push(Box::new(view)))
}

/// Requests replacing the active view in place.
pub fn replace(view: impl View + 'static) -> Cmd {
    Cmd::Nav(NavRequest::Replace(Box::new(view)))
}

/// Requests popping the active view.
pub fn pop() -> Cmd {
    Cmd::Nav(NavRequest::Pop(None))
}

/// Requests popping the active view, delivering `result` to the view below.
pub fn pop_with_result(result: impl std::any::Any + Send) -> Cmd {
    Cmd::Nav(NavRequest::Pop(Some(Box::new(result))))
}

/// Requests popping until `keep` accepts the current top, then pushing `view`.
pub fn push_and_remove_until(
    view: impl View + 'static,
    keep: impl Fn(usize, &dyn View) -> bool + Send + 'static,
) -> Cmd {
    Cmd::Nav(NavRequest::PushAndRemoveUntil(Box::new(view), Box::new(keep)))
}

/// Outcome of one navigator step.
pub enum Control {
    /// Keep running; the carried command (if any) is dispatched by the loop.
    Continue(Option<Cmd>),
    /// The program should exit.
    Quit,
}

pub struct Navigator {
    stack: Vec<Box<dyn View>>,
    size: WinSize,
}

impl Navigator {
    pub fn new(root: Box<dyn View>) -> Self {
        Self {
            stack: vec![root],
            size: WinSize::default(),
        }
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    pub fn size(&self) -> WinSize {
        self.size
    }

    /// Initializes the root view.
    pub fn init(&mut self) -> Option<Cmd> {
        self.top().init()
    }

    /// Renders the active view at the last known size.
    pub fn render(&mut self) -> String {
        let size = self.size;
        self.top().render(size)
    }

    /// Routes one event. The global quit hot-key is intercepted here,
    /// regardless of which view is active; everything else goes to the top of
    /// the stack.
    pub fn handle_event(&mut self, event: &Event) -> Control {
        match event {
            Event::Input(data) if key::matches_key(data, "ctrl+c") => return Control::Quit,
            Event::Resize(size) => self.size = *size,
            _ => {}
        }
        Control::Continue(self.top().handle_event(event))
    }

    /// Applies one stack mutation. Never fails; popping the last view is the
    /// designed program exit, not an error.
    pub fn apply(&mut self, request: NavRequest) -> Control {
        match request {
            NavRequest::Push(view) => {
                tracing::debug!(depth = self.stack.len() + 1, "nav push");
                self.stack.push(view);
                Control::Continue(self.activate_top())
            }
            NavRequest::Replace(view) => {
                tracing::debug!(depth = self.stack.len(), "nav replace");
                *self.stack.last_mut().expect("stack is never empty") = view;
                Control::Continue(self.activate_top())
            }
            NavRequest::Pop(result) => {
                if self.stack.len() == 1 {
                    tracing::debug!("nav pop on root; quitting");
                    return Control::Quit;
                }
                self.stack.pop();
                tracing::debug!(depth = self.stack.len(), "nav pop");
                let mut cmds = Vec::new();
                if let Some(cmd) = self.deliver_size() {
                    cmds.push(cmd);
                }
                if let Some(msg) = result {
                    if let Some(cmd) = self.top().handle_event(&Event::Message(msg)) {
                        cmds.push(cmd);
                    }
                }
                Control::Continue(Cmd::batch(cmds))
            }
            NavRequest::PushAndRemoveUntil(view, keep) => {
                while let Some(top) = self.stack.last() {
                    let index = self.stack.len() - 1;
                    if keep(index, top.as_ref()) {
                        break;
                    }
                    self.stack.pop();
                }
                tracing::debug!(depth = self.stack.len() + 1, "nav push_and_remove_until");
                self.stack.push(view);
                Control::Continue(self.activate_top())
            }
        }
    }

    /// Initializes the new top view and re-delivers the viewport size so it
    /// lays out correctly before its first real resize event.
    fn activate_top(&mut self) -> Option<Cmd> {
        let mut cmds = Vec::new();
        if let Some(cmd) = self.top().init() {
            cmds.push(cmd);
        }
        if let Some(cmd) = self.deliver_size() {
            cmds.push(cmd);
        }
        Cmd::batch(cmds)
    }

    fn deliver_size(&mut self) -> Option<Cmd> {
        let size = self.size;
        self.top().handle_event(&Event::Resize(size))
    }

    fn top(&mut self) -> &mut Box<dyn View> {
        self.stack.last_mut().expect("stack is never empty")
    }
}
