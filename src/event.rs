//! Message vocabulary of the program loop.

use std::any::Any;

use crate::navigator::NavRequest;
use crate::program::EventSender;

/// Opaque message produced by background work and delivered to the active
/// view. Views downcast to the concrete message types they understand.
pub type Msg = Box<dyn Any + Send>;

/// Viewport dimensions, re-delivered to every freshly pushed/replaced view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WinSize {
    pub width: usize,
    pub height: usize,
}

/// One unit of input to the program loop. The loop consumes exactly one event
/// per tick; views never see events concurrently.
pub enum Event {
    /// Raw terminal input data; use [`crate::key::parse_key`] to classify.
    Input(String),
    Resize(WinSize),
    Message(Msg),
}

impl Event {
    /// Downcasts a message event to a concrete type.
    pub fn message<T: 'static>(&self) -> Option<&T> {
        match self {
            Self::Message(msg) => msg.downcast_ref::<T>(),
            _ => None,
        }
    }
}

/// Effect returned by a view in response to an event.
pub enum Cmd {
    /// Stack mutation, applied by the loop on the next tick.
    Nav(NavRequest),
    /// Background work; runs on its own thread and posts its result back into
    /// the loop as an [`Event::Message`].
    Task(Box<dyn FnOnce() -> Option<Msg> + Send>),
    /// Long-running background work that posts messages as it goes, e.g. the
    /// checkout pipeline. Runs on its own thread with a handle to the loop.
    Stream(Box<dyn FnOnce(EventSender) + Send>),
    Batch(Vec<Cmd>),
    /// Ends the program after the next repaint.
    Quit,
}

impl Cmd {
    pub fn task<F, T>(work: F) -> Self
    where
        F: FnOnce() -> Option<T> + Send + 'static,
        T: Any + Send,
    {
        Self::Task(Box::new(move || {
            work().map(|msg| Box::new(msg) as Msg)
        }))
    }

    pub fn stream<F>(work: F) -> Self
    where
        F: FnOnce(EventSender) + Send + 'static,
    {
        Self::Stream(Box::new(work))
    }

    /// Collapses a command list to nothing, a single command, or a batch.
    pub fn batch(mut cmds: Vec<Cmd>) -> Option<Cmd> {
        match cmds.len() {
            0 => None,
            1 => cmds.pop(),
            _ => Some(Cmd::Batch(cmds)),
        }
    }
}
