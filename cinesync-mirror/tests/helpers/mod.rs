//! Test Helper Utilities
//!
//! Shared fakes and fixtures for cinesync-mirror integration tests

#![allow(dead_code)]
#![allow(unused_imports)]

pub mod db_utils;
pub mod fake_catalog;
pub mod scripted_prompt;

pub use db_utils::{create_test_store, fast_scheduler, seed, test_collection_names};
pub use fake_catalog::{credits_body, requested, CallLog, FakeCatalog};
pub use scripted_prompt::{QuestionLog, ScriptedPrompt};
