pub mod config;
pub mod ctx;
pub mod emit;
pub mod ops;

use ctx::LogCtx;

// One factory per command; each context carries its own span vocabulary
pub fn poll() -> LogCtx<ops::poll::Poll> { LogCtx { json: config::logs_are_json(), _marker: std::marker::PhantomData } }
pub fn feed() -> LogCtx<ops::feed::Feed> { LogCtx { json: config::logs_are_json(), _marker: std::marker::PhantomData } }
pub fn status() -> LogCtx<ops::status::Status> { LogCtx { json: config::logs_are_json(), _marker: std::marker::PhantomData } }
pub fn init() -> LogCtx<ops::init::Init> { LogCtx { json: config::logs_are_json(), _marker: std::marker::PhantomData } }
pub fn run() -> LogCtx<ops::run::Run> { LogCtx { json: config::logs_are_json(), _marker: std::marker::PhantomData } }
