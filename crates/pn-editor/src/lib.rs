pub mod channel;
pub mod commands;
pub mod editor;
pub mod input;
pub mod inspector;
pub mod shortcuts;
pub mod sync;
pub mod tools;

pub use channel::{ChannelError, CommandChannel, ConnectionState, Transport};
pub use commands::{HistoryState, Intent};
pub use editor::{Editor, Notice};
pub use input::InputEvent;
pub use inspector::{InspectorState, SelectionBinder};
pub use sync::{ReconcileReport, Reconciler};
pub use tools::{EditingMode, Gesture};
