use tauri::State;

use crate::review::ReviewController;
use crate::session::{ReportView, SessionView, Turn};

/// Submits the staged document. Ok(None) means the submission was refused or
/// superseded; Err carries the banner text.
#[tauri::command]
pub async fn analyze_document(
    controller: State<'_, ReviewController>,
) -> Result<Option<ReportView>, String> {
    controller.analyze().await
}

/// Asks a question against the current report. Never errors: failures resolve
/// to the fixed apology turn, and refused questions return None.
#[tauri::command]
pub async fn ask_question(
    controller: State<'_, ReviewController>,
    question: String,
) -> Result<Option<Turn>, String> {
    Ok(controller.ask(&question).await)
}

#[tauri::command]
pub fn get_conversation(controller: State<'_, ReviewController>) -> Result<Vec<Turn>, String> {
    Ok(controller.conversation())
}

/// Full render state in one call; the webview hydrates from this after every
/// operation.
#[tauri::command]
pub fn session_snapshot(controller: State<'_, ReviewController>) -> Result<SessionView, String> {
    Ok(controller.snapshot())
}
