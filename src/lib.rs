//! Conversational client core: session-gated navigation + chat pipeline.
//!
//! ## Backend bootstrap
//!
//! `persona_chat` selects its backend at startup:
//!
//! - `PERSONA_CHAT_BACKEND=mock` (default) for deterministic local runs
//! - `PERSONA_CHAT_BACKEND=http` for real transport
//!
//! When `PERSONA_CHAT_BACKEND=http`, set `PERSONA_CHAT_CONFIG_PATH` to a
//! readable UTF-8 JSON file with this shape:
//!
//! ```json
//! {
//!   "assistant_url": "http://localhost:3010/api/chat",
//!   "image_url": "http://localhost:3010/api/image",
//!   "identity_base_url": "http://localhost:3010/api/onboard",
//!   "timeout_secs": 30
//! }
//! ```
//!
//! Contract notes:
//! - `assistant_url` and `image_url` are required and must be non-empty.
//! - `identity_base_url` is optional and defaults to the local identity
//!   service base.
//! - `timeout_secs` is optional; every request carries a bounded timeout.
//! - Unknown JSON fields are rejected.
//!
//! ## State contract
//!
//! Session state (auth flag, onboard flag, token, display name) and chat
//! history live in one persisted document owned by `session_store`. The
//! route guard derives the permitted screen from that state alone, so every
//! view in every process arrives at the same decision. Workers report back
//! only through the runtime event queue; all app mutation happens on the
//! driving thread.

pub mod app;
pub mod auth;
pub mod backends;
pub mod commands;
pub mod guard;
pub mod onboarding;
pub mod runtime;
