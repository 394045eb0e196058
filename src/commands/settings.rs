use tauri::State;

use crate::review::ReviewController;
use crate::session::Theme;

#[tauri::command]
pub fn get_theme(controller: State<'_, ReviewController>) -> Result<Theme, String> {
    Ok(controller.theme())
}

#[tauri::command]
pub fn toggle_theme(controller: State<'_, ReviewController>) -> Result<Theme, String> {
    Ok(controller.toggle_theme())
}
