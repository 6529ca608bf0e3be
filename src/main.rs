mod api;
mod app;
mod capture;
mod commands;
mod config;
mod history;
mod logging;
mod session;

#[tokio::main]
async fn main() {
    if let Err(e) = app::run().await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
