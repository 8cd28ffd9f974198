pub mod config;
pub mod ctx;
pub mod ops;

use ctx::LogCtx;

pub fn fetch() -> LogCtx<ops::fetch::Fetch> {
    LogCtx { json: config::logs_are_json(), _marker: std::marker::PhantomData }
}

pub fn interact() -> LogCtx<ops::interact::Interact> {
    LogCtx { json: config::logs_are_json(), _marker: std::marker::PhantomData }
}
