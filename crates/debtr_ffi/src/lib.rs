//! Flutter bridge entry points for Debtr.

pub mod api;
