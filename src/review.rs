use std::sync::{Arc, Mutex};

use log::{error, info, warn};
use tokio::sync::Mutex as AsyncMutex;

use crate::api::AnalysisBackend;
use crate::db::Database;
use crate::session::{
    AnalysisReport, Document, DocumentView, ReportView, Role, Session, SessionView, Theme, Turn,
};

const THEME_KEY: &str = "theme";

/// Shown when the service rejects an analysis without attaching a reason, or
/// when the request never reaches it.
pub const ANALYZE_FALLBACK_ERROR: &str =
    "Failed to analyze document. Ensure backend is running.";

/// Substituted assistant turn for any failed question.
pub const FAILED_ANSWER: &str = "Sorry, I couldn't process that question.";

/// Owns the session aggregate and drives the two remote contracts. The
/// session mutex is never held across an await: each flow captures a job
/// under the lock, awaits the network, then commits under the lock again
/// with an epoch check. Questions additionally serialize on `chat_gate`,
/// whose FIFO acquisition order fixes the turn order.
pub struct ReviewController {
    session: Mutex<Session>,
    chat_gate: AsyncMutex<()>,
    backend: Arc<dyn AnalysisBackend>,
    db: Database,
}

impl ReviewController {
    pub fn new(db: Database, backend: Arc<dyn AnalysisBackend>) -> Self {
        let theme = match db.get_setting(THEME_KEY) {
            Ok(value) => Theme::from_setting(value.as_deref()),
            Err(e) => {
                warn!("Failed to read theme setting: {}", e);
                Theme::Light
            }
        };
        Self {
            session: Mutex::new(Session::new(theme)),
            chat_gate: AsyncMutex::new(()),
            backend,
            db,
        }
    }

    /// Stages a document and resets everything downstream of it. Any
    /// in-flight analysis or question settles as stale afterwards.
    pub fn select_document(&self, document: Document) -> DocumentView {
        let mut session = self.session.lock().unwrap();
        let view = session.select_document(document);
        info!("Selected document {} ({} bytes)", view.name, view.size);
        view
    }

    /// Submits the staged document for analysis. Returns Ok(None) when the
    /// submission is refused (nothing staged, or one already running) or when
    /// the response landed after a reset; Err carries the banner text, which
    /// is also recorded on the session.
    pub async fn analyze(&self) -> Result<Option<ReportView>, String> {
        let job = {
            let mut session = self.session.lock().unwrap();
            session.begin_analysis()
        }; // lock released here

        let Some(job) = job else {
            info!("Analysis request ignored: nothing staged or already running");
            return Ok(None);
        };

        info!(
            "Submitting {} for analysis ({} bytes)",
            job.file_name,
            job.bytes.len()
        );
        let outcome = self
            .backend
            .analyze(job.file_name, job.mime_type, job.bytes)
            .await;

        match outcome {
            Ok(payload) => {
                let report = AnalysisReport::from_payload(payload);
                let view = report.view();
                let mut session = self.session.lock().unwrap();
                if !session.finish_analysis(job.epoch, Ok(report)) {
                    warn!("Discarding analysis response for a replaced document");
                    return Ok(None);
                }
                info!("Analysis complete, rating {}", view.rating_label);
                Ok(Some(view))
            }
            Err(err) => {
                error!("Analysis request failed: {}", err);
                let banner = err
                    .server_message()
                    .map(str::to_string)
                    .unwrap_or_else(|| ANALYZE_FALLBACK_ERROR.to_string());
                let mut session = self.session.lock().unwrap();
                if !session.finish_analysis(job.epoch, Err(banner.clone())) {
                    return Ok(None);
                }
                Err(banner)
            }
        }
    }

    /// Asks a question against the current report. Questions run strictly one
    /// at a time in submission order; the user turn appears as soon as the
    /// question's slot opens. Failures resolve to the fixed apology turn, so
    /// this never errors. None means the question was refused (blank, no
    /// extracted text) or its context was replaced mid-flight.
    pub async fn ask(&self, text: &str) -> Option<Turn> {
        let _slot = self.chat_gate.lock().await;

        let job = {
            let mut session = self.session.lock().unwrap();
            session.begin_question(text)
        }?; // lock released here

        let answer = match self.backend.ask(job.question, job.context).await {
            Ok(answer) => answer,
            Err(err) => {
                error!("Chat request failed: {}", err);
                FAILED_ANSWER.to_string()
            }
        };

        let mut session = self.session.lock().unwrap();
        if !session.finish_question(job.epoch, answer.clone()) {
            warn!("Discarding answer for a replaced document");
            return None;
        }
        Some(Turn {
            role: Role::Assistant,
            content: answer,
        })
    }

    pub fn snapshot(&self) -> SessionView {
        self.session.lock().unwrap().view()
    }

    pub fn conversation(&self) -> Vec<Turn> {
        self.session.lock().unwrap().turns.clone()
    }

    pub fn theme(&self) -> Theme {
        self.session.lock().unwrap().theme
    }

    /// Flips the theme and persists it. Storage failures keep the in-memory
    /// flip and are only logged.
    pub fn toggle_theme(&self) -> Theme {
        let theme = {
            let mut session = self.session.lock().unwrap();
            session.theme = session.theme.toggled();
            session.theme
        }; // lock released here
        if let Err(e) = self.db.set_setting(THEME_KEY, theme.as_setting()) {
            warn!("Failed to persist theme setting: {}", e);
        }
        theme
    }
}
