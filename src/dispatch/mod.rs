//! Deferred callback execution.
//!
//! `publish` never runs callbacks inline. Each scheduled invocation is
//! queued on a channel and drained by a single dispatch thread, so a
//! callback always runs strictly after the call that scheduled it has
//! returned. Barriers over the same channel let callers wait for the
//! queue to drain (see [`Registry::settle`](crate::Registry::settle)).

mod worker;

pub(crate) use worker::{Dispatcher, Invocation};
