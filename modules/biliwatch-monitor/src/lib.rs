pub mod compose;
pub mod dedup;
pub mod notify;
pub mod pacing;
pub mod poller;
pub mod providers;
pub mod retry;
#[cfg(any(test, feature = "test-support"))]
pub mod testing;
