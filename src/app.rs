//! Application module: exposes the session model used by the TUI and runtime.
//!
//! The `App` model lives in `app::model`; the add/edit popup state lives in
//! `app::form`.

mod form;
mod model;

pub use form::*;
pub use model::*;
