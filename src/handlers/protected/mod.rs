// handlers/protected/mod.rs - Session-scoped resource handlers
//
// Every handler here receives `Extension<AuthSession>` from `require_auth`
// and reaches the store only through `session.db`, which carries the
// caller's identity into each query.

pub mod chat;
pub mod notes;
pub mod sections;
