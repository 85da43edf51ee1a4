use std::any::Any;

use super::message::SystemMessage;

/// Identifies one listener registration on a `System`.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct ListenerId(pub(crate) u64);

/// Upcast helper so registered listeners can be borrowed back by concrete type.
pub trait AsAny: Any {
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Receives frame pump notifications.
///
/// Listeners are notified in registration order. Anything a listener wants to
/// change on the pump itself goes through `ctx` and is applied after the
/// message has reached every listener.
pub trait SystemListener: AsAny {
    fn on_message(&mut self, msg: &SystemMessage, ctx: &mut SystemCtx);
}

/// Closures make convenient one-off listeners.
impl<F> SystemListener for F
where
    F: FnMut(&SystemMessage, &mut SystemCtx) + 'static,
{
    fn on_message(&mut self, msg: &SystemMessage, ctx: &mut SystemCtx) {
        self(msg, ctx)
    }
}

/// Command buffer handed to listeners during a dispatch.
#[derive(Debug, Default)]
pub struct SystemCtx {
    commands: Vec<Command>,
}

impl SystemCtx {
    pub fn set_pause(&mut self, paused: bool) {
        self.commands.push(Command::SetPause(paused));
    }

    pub fn pause(&mut self) {
        self.set_pause(true);
    }

    pub fn resume(&mut self) {
        self.set_pause(false);
    }

    pub fn set_time_scale(&mut self, scale: f64) {
        self.commands.push(Command::SetTimeScale(scale));
    }

    pub fn stop(&mut self) {
        self.commands.push(Command::Stop);
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub(crate) fn drain(&mut self) -> std::vec::Drain<'_, Command> {
        self.commands.drain(..)
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub(crate) enum Command {
    SetPause(bool),
    SetTimeScale(f64),
    Stop,
}

pub(crate) struct ListenerEntry {
    pub(crate) id: ListenerId,
    pub(crate) listener: Box<dyn SystemListener>,
}
