//! Input: device samples, classification, registration dispatch and focus.

pub mod classify;
pub mod device;
pub mod dispatcher;
pub mod event;
pub mod focus;
pub mod terminal;

pub use classify::{classify, HitState};
pub use device::{Device, EdgeKind, Key, KeyEdge, MouseButtons, PointerState, PointerTracker};
pub use dispatcher::{Handler, InputDispatcher, Registration, RegistrationId};
pub use event::{EventDetail, InputEvent, InputKind};
pub use focus::FocusManager;
pub use terminal::TerminalDevice;
