//! Browse, search and prune the contacts of one contact group held by a
//! DreamFactory-style REST backend.

pub mod api;
pub mod cascade;
pub mod config;
pub mod error;
pub mod gate;
pub mod list;
pub mod model;
pub mod remote;
pub mod screen;
pub mod sections;
