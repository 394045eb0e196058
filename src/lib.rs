mod api;
mod commands;
mod db;
mod review;
mod session;

use std::sync::Arc;

use api::http::HttpBackend;
use db::Database;
use log::info;
use review::ReviewController;
use tauri::Manager;

#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    // Initialize logging (reads RUST_LOG env var)
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    tauri::Builder::default()
        .plugin(tauri_plugin_opener::init())
        .plugin(tauri_plugin_dialog::init())
        .setup(|app| {
            let app_dir = app.path().app_data_dir()?;
            let database = Database::new(&app_dir).expect("Failed to initialize database");
            let backend = HttpBackend::from_env();
            info!("Using analysis service at {}", backend.base_url());
            app.manage(ReviewController::new(database, Arc::new(backend)));
            Ok(())
        })
        .invoke_handler(tauri::generate_handler![
            commands::document::pick_document,
            commands::document::select_document,
            commands::review::analyze_document,
            commands::review::ask_question,
            commands::review::get_conversation,
            commands::review::session_snapshot,
            commands::settings::get_theme,
            commands::settings::toggle_theme,
        ])
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}
