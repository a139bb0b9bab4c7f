//! Editable email list and secondary email lifecycle

pub mod lifecycle;
pub mod list;

pub use lifecycle::SecondaryEmailLifecycle;
pub use list::EditedEmailList;
