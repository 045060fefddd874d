pub mod controller;
pub mod history;
pub mod input;
pub mod shortcuts;
pub mod store;
pub mod tools;

pub use controller::Controller;
pub use history::History;
pub use input::{InputEvent, Modifiers};
pub use shortcuts::{ShortcutAction, ShortcutMap};
pub use store::{
    DecodeFailure, DecodedImage, ImageHandle, ImageState, Selection, Store, StoreEvent,
};
pub use tools::{Preview, Tool, ToolAction, ToolKind};
