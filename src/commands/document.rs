use std::path::Path;

use tauri::State;
use tauri_plugin_dialog::DialogExt;

use crate::review::ReviewController;
use crate::session::{Document, DocumentView};

/// File types the analysis service accepts.
const SUPPORTED_EXTENSIONS: &[&str] = &["pdf", "png", "jpg", "jpeg"];

fn mime_for_extension(ext: &str) -> Option<&'static str> {
    match ext {
        "pdf" => Some("application/pdf"),
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        _ => None,
    }
}

/// Reads a file into a Document, rejecting unsupported types before the
/// session is touched.
fn load_document(path: &Path) -> Result<Document, String> {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("unknown")
        .to_string();
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    let mime_type = mime_for_extension(&ext)
        .ok_or_else(|| format!("Unsupported file type: {}", name))?;
    let bytes = std::fs::read(path).map_err(|e| e.to_string())?;
    Ok(Document {
        name,
        mime_type: mime_type.to_string(),
        bytes,
    })
}

/// Opens the native file picker and stages the chosen document. Returns None
/// when the dialog is dismissed.
#[tauri::command]
pub async fn pick_document(
    app: tauri::AppHandle,
    controller: State<'_, ReviewController>,
) -> Result<Option<DocumentView>, String> {
    let picked = app
        .dialog()
        .file()
        .set_title("Select a lease document")
        .add_filter("Lease documents", SUPPORTED_EXTENSIONS)
        .blocking_pick_file();

    let Some(picked) = picked else {
        return Ok(None);
    };
    let path = picked.into_path().map_err(|e| e.to_string())?;
    let document = load_document(&path)?;
    Ok(Some(controller.select_document(document)))
}

/// Stages a document from a path the webview already has, e.g. a drop event.
#[tauri::command]
pub fn select_document(
    controller: State<'_, ReviewController>,
    file_path: String,
) -> Result<DocumentView, String> {
    let document = load_document(Path::new(&file_path))?;
    Ok(controller.select_document(document))
}
