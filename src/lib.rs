//! Espert application core.
//!
//! The heart of the crate is [`mvi`], a generic Model-View-Intent state
//! container. The remaining modules are the collaborators concrete screens
//! are built from: preference [`storage`], content [`repository`] sources
//! wrapped by [`usecase`]s, user-facing error messages ([`errors`]), and the
//! [`screens`] themselves.

pub mod config;
pub mod errors;
pub mod logging;
pub mod mvi;
pub mod repository;
pub mod screens;
pub mod storage;
pub mod usecase;
