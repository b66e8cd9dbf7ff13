//! Command implementations on [`crate::App`].

mod toggle;
