mod api;
mod app;
mod auth;
mod chatbot;
mod config;
mod dom;
mod error;
mod format;
mod forms;
mod icons;
mod models;
mod nav;
mod notify;
mod results;
mod storage;
mod telemetry;
mod theme;

fn main() {
    console_error_panic_hook::set_once();
    if let Err(err) = console_log::init_with_level(log::Level::Debug) {
        web_sys::console::error_1(&format!("logger already set: {}", err).into());
    }
    app::start();
}
