//! Library surface for the Approval Callback Handler API, exposed so
//! integration tests can drive the router in-process with
//! `tower::ServiceExt::oneshot` instead of binding a real socket.

pub mod handlers;
pub mod routes;
pub mod state;
