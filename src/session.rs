use serde::Serialize;

use crate::api::AnalysisPayload;

pub const FALLBACK_SUMMARY: &str = "No summary available.";
pub const NO_FLAGS_NOTE: &str = "No major red flags found.";

/// The lease file currently staged for analysis. Replaced wholesale on every
/// selection, never mutated in place.
#[derive(Debug)]
pub struct Document {
    pub name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DocumentView {
    pub name: String,
    pub mime_type: String,
    pub size: usize,
}

/// Validated analysis result. Built from the wire payload exactly once, at the
/// network boundary; readers never see a partial record.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AnalysisReport {
    pub rating: Option<u8>,
    pub summary: Option<String>,
    pub red_flags: Vec<String>,
    pub full_text: Option<String>,
}

impl AnalysisReport {
    /// Normalizes the all-optional wire payload. Ratings must be whole numbers
    /// in 0..=10; anything else counts as absent. Blank summary and full_text
    /// collapse to absent.
    pub fn from_payload(payload: AnalysisPayload) -> Self {
        let rating = payload.rating.and_then(|r| {
            if r.fract() == 0.0 && (0.0..=10.0).contains(&r) {
                Some(r as u8)
            } else {
                None
            }
        });
        Self {
            rating,
            summary: payload.summary.filter(|s| !s.trim().is_empty()),
            red_flags: payload.red_flags,
            full_text: payload.full_text.filter(|s| !s.trim().is_empty()),
        }
    }

    pub fn rating_label(&self) -> String {
        match self.rating {
            Some(r) => format!("{r}/10"),
            None => "?/10".to_string(),
        }
    }

    pub fn summary_text(&self) -> &str {
        self.summary.as_deref().unwrap_or(FALLBACK_SUMMARY)
    }

    /// Lines for the red-flag card. An empty wire list collapses to the single
    /// positive note so the renderer never picks fallback text itself.
    pub fn red_flag_lines(&self) -> Vec<String> {
        if self.red_flags.is_empty() {
            vec![NO_FLAGS_NOTE.to_string()]
        } else {
            self.red_flags.clone()
        }
    }

    /// Questions need extracted text to ground against.
    pub fn chat_available(&self) -> bool {
        self.full_text.is_some()
    }

    pub fn view(&self) -> ReportView {
        ReportView {
            rating_label: self.rating_label(),
            summary: self.summary_text().to_string(),
            red_flags: self.red_flag_lines(),
            has_flags: !self.red_flags.is_empty(),
            chat_available: self.chat_available(),
        }
    }
}

/// Display-ready projection of a report. All fallback text is decided here,
/// not in the webview.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ReportView {
    pub rating_label: String,
    pub summary: String,
    pub red_flags: Vec<String>,
    pub has_flags: bool,
    pub chat_available: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Turn {
    pub role: Role,
    pub content: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
}

impl Theme {
    /// Stored values other than the literal "dark" resolve to light.
    pub fn from_setting(value: Option<&str>) -> Self {
        match value {
            Some("dark") => Theme::Dark,
            _ => Theme::Light,
        }
    }

    pub fn as_setting(self) -> &'static str {
        match self {
            Theme::Dark => "dark",
            Theme::Light => "light",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Theme::Dark => Theme::Light,
            Theme::Light => Theme::Dark,
        }
    }
}

/// Everything an analysis request needs, captured under the session lock so
/// the request itself runs without holding it.
pub struct AnalysisJob {
    pub epoch: u64,
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

pub struct QuestionJob {
    pub epoch: u64,
    pub question: String,
    pub context: String,
}

/// The one mutable application state aggregate. Every mutation goes through a
/// named transition below; the epoch identifies the current document/analysis
/// context so late responses from a previous context can be detected.
pub struct Session {
    pub document: Option<Document>,
    pub report: Option<AnalysisReport>,
    pub analysis_error: Option<String>,
    pub turns: Vec<Turn>,
    pub analyzing: bool,
    pub answering: bool,
    pub epoch: u64,
    pub theme: Theme,
}

impl Session {
    pub fn new(theme: Theme) -> Self {
        Self {
            document: None,
            report: None,
            analysis_error: None,
            turns: Vec::new(),
            analyzing: false,
            answering: false,
            epoch: 0,
            theme,
        }
    }

    /// Stages a new document. Clears the report, the error banner and the
    /// conversation, resets both busy flags and advances the epoch, so any
    /// in-flight request settles as stale.
    pub fn select_document(&mut self, document: Document) -> DocumentView {
        let view = DocumentView {
            name: document.name.clone(),
            mime_type: document.mime_type.clone(),
            size: document.bytes.len(),
        };
        self.document = Some(document);
        self.report = None;
        self.analysis_error = None;
        self.turns.clear();
        self.analyzing = false;
        self.answering = false;
        self.epoch += 1;
        view
    }

    /// Starts an analysis submission. Refuses (None) with no document staged
    /// or while one is already in flight. Clears the previous report, error
    /// and conversation, drops the chat busy flag (any pending question now
    /// belongs to a dead context) and advances the epoch; the returned job
    /// carries the new epoch for the commit check.
    pub fn begin_analysis(&mut self) -> Option<AnalysisJob> {
        if self.analyzing {
            return None;
        }
        let document = self.document.as_ref()?;
        self.report = None;
        self.analysis_error = None;
        self.turns.clear();
        self.analyzing = true;
        self.answering = false;
        self.epoch += 1;
        Some(AnalysisJob {
            epoch: self.epoch,
            file_name: document.name.clone(),
            mime_type: document.mime_type.clone(),
            bytes: document.bytes.clone(),
        })
    }

    /// Commits an analysis outcome. A stale epoch mutates nothing and reports
    /// false; the transition that advanced the epoch already reset the flags.
    pub fn finish_analysis(
        &mut self,
        epoch: u64,
        outcome: Result<AnalysisReport, String>,
    ) -> bool {
        if epoch != self.epoch {
            return false;
        }
        self.analyzing = false;
        match outcome {
            Ok(report) => self.report = Some(report),
            Err(message) => self.analysis_error = Some(message),
        }
        true
    }

    /// Accepts a question: appends the user turn immediately and captures the
    /// grounding context. Refuses (None) blank questions and questions asked
    /// without extracted text; refusal appends nothing.
    pub fn begin_question(&mut self, text: &str) -> Option<QuestionJob> {
        let question = text.trim();
        if question.is_empty() {
            return None;
        }
        let context = self.report.as_ref()?.full_text.clone()?;
        self.turns.push(Turn {
            role: Role::User,
            content: question.to_string(),
        });
        self.answering = true;
        Some(QuestionJob {
            epoch: self.epoch,
            question: question.to_string(),
            context,
        })
    }

    /// Commits the assistant turn for the active question. Stale epochs
    /// mutate nothing.
    pub fn finish_question(&mut self, epoch: u64, answer: String) -> bool {
        if epoch != self.epoch {
            return false;
        }
        self.answering = false;
        self.turns.push(Turn {
            role: Role::Assistant,
            content: answer,
        });
        true
    }

    pub fn view(&self) -> SessionView {
        SessionView {
            document: self.document.as_ref().map(|d| DocumentView {
                name: d.name.clone(),
                mime_type: d.mime_type.clone(),
                size: d.bytes.len(),
            }),
            report: self.report.as_ref().map(AnalysisReport::view),
            analysis_error: self.analysis_error.clone(),
            turns: self.turns.clone(),
            analyzing: self.analyzing,
            answering: self.answering,
            theme: self.theme,
        }
    }
}

/// Full render state, fetched by the webview in one call.
#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub document: Option<DocumentView>,
    pub report: Option<ReportView>,
    pub analysis_error: Option<String>,
    pub turns: Vec<Turn>,
    pub analyzing: bool,
    pub answering: bool,
    pub theme: Theme,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(name: &str) -> Document {
        Document {
            name: name.to_string(),
            mime_type: "application/pdf".to_string(),
            bytes: vec![1, 2, 3],
        }
    }

    fn report_with_text() -> AnalysisReport {
        AnalysisReport::from_payload(AnalysisPayload {
            rating: Some(7.0),
            summary: Some("Standard lease.".to_string()),
            red_flags: vec!["No pet clause".to_string()],
            full_text: Some("THIS LEASE AGREEMENT...".to_string()),
        })
    }

    #[test]
    fn rating_validation() {
        let rate = |r: Option<f64>| {
            AnalysisReport::from_payload(AnalysisPayload {
                rating: r,
                ..Default::default()
            })
            .rating
        };
        assert_eq!(rate(Some(7.0)), Some(7));
        assert_eq!(rate(Some(0.0)), Some(0));
        assert_eq!(rate(Some(10.0)), Some(10));
        assert_eq!(rate(Some(7.5)), None);
        assert_eq!(rate(Some(-1.0)), None);
        assert_eq!(rate(Some(11.0)), None);
        assert_eq!(rate(None), None);
    }

    #[test]
    fn rating_zero_is_not_absent() {
        let report = AnalysisReport::from_payload(AnalysisPayload {
            rating: Some(0.0),
            ..Default::default()
        });
        assert_eq!(report.rating_label(), "0/10");
    }

    #[test]
    fn missing_fields_render_defaults() {
        let report = AnalysisReport::from_payload(AnalysisPayload::default());
        assert_eq!(report.rating_label(), "?/10");
        assert_eq!(report.summary_text(), FALLBACK_SUMMARY);
        assert_eq!(report.red_flag_lines(), vec![NO_FLAGS_NOTE.to_string()]);
        assert!(!report.chat_available());
    }

    #[test]
    fn blank_summary_and_text_collapse_to_absent() {
        let report = AnalysisReport::from_payload(AnalysisPayload {
            summary: Some("   ".to_string()),
            full_text: Some("".to_string()),
            ..Default::default()
        });
        assert_eq!(report.summary_text(), FALLBACK_SUMMARY);
        assert!(!report.chat_available());
    }

    #[test]
    fn present_fields_render_verbatim() {
        let report = report_with_text();
        assert_eq!(report.rating_label(), "7/10");
        assert_eq!(report.summary_text(), "Standard lease.");
        assert_eq!(report.red_flag_lines(), vec!["No pet clause".to_string()]);
        assert!(report.view().has_flags);
        assert!(report.chat_available());
    }

    #[test]
    fn select_document_resets_downstream_state() {
        let mut session = Session::new(Theme::Light);
        session.select_document(doc("old.pdf"));
        let job = session.begin_analysis().unwrap();
        session.finish_analysis(job.epoch, Ok(report_with_text()));
        session.begin_question("Can I have a pet?").unwrap();

        let before = session.epoch;
        let view = session.select_document(doc("new.pdf"));
        assert_eq!(view.name, "new.pdf");
        assert!(session.report.is_none());
        assert!(session.analysis_error.is_none());
        assert!(session.turns.is_empty());
        assert!(!session.analyzing);
        assert!(!session.answering);
        assert_eq!(session.epoch, before + 1);
    }

    #[test]
    fn begin_analysis_requires_document() {
        let mut session = Session::new(Theme::Light);
        assert!(session.begin_analysis().is_none());
    }

    #[test]
    fn begin_analysis_refuses_while_in_flight() {
        let mut session = Session::new(Theme::Light);
        session.select_document(doc("lease.pdf"));
        assert!(session.begin_analysis().is_some());
        assert!(session.begin_analysis().is_none());
    }

    #[test]
    fn resubmission_clears_previous_outcome() {
        let mut session = Session::new(Theme::Light);
        session.select_document(doc("lease.pdf"));
        let job = session.begin_analysis().unwrap();
        session.finish_analysis(job.epoch, Err("parse failed".to_string()));
        assert!(session.analysis_error.is_some());

        session.begin_analysis().unwrap();
        assert!(session.analysis_error.is_none());
        assert!(session.report.is_none());
        assert!(session.turns.is_empty());
    }

    #[test]
    fn stale_analysis_outcome_is_discarded() {
        let mut session = Session::new(Theme::Light);
        session.select_document(doc("old.pdf"));
        let job = session.begin_analysis().unwrap();
        session.select_document(doc("new.pdf"));

        assert!(!session.finish_analysis(job.epoch, Ok(report_with_text())));
        assert!(session.report.is_none());
        assert!(!session.analyzing);
    }

    #[test]
    fn blank_question_is_a_no_op() {
        let mut session = Session::new(Theme::Light);
        session.select_document(doc("lease.pdf"));
        let job = session.begin_analysis().unwrap();
        session.finish_analysis(job.epoch, Ok(report_with_text()));

        assert!(session.begin_question("").is_none());
        assert!(session.begin_question("   ").is_none());
        assert!(session.turns.is_empty());
        assert!(!session.answering);
    }

    #[test]
    fn question_requires_extracted_text() {
        let mut session = Session::new(Theme::Light);
        session.select_document(doc("lease.pdf"));
        let job = session.begin_analysis().unwrap();
        session.finish_analysis(
            job.epoch,
            Ok(AnalysisReport::from_payload(AnalysisPayload {
                rating: Some(7.0),
                ..Default::default()
            })),
        );

        assert!(session.begin_question("Anything?").is_none());
        assert!(session.turns.is_empty());
    }

    #[test]
    fn question_appends_user_turn_then_assistant_turn() {
        let mut session = Session::new(Theme::Light);
        session.select_document(doc("lease.pdf"));
        let job = session.begin_analysis().unwrap();
        session.finish_analysis(job.epoch, Ok(report_with_text()));

        let q = session.begin_question("  Can I have a pet?  ").unwrap();
        assert_eq!(q.question, "Can I have a pet?");
        assert_eq!(q.context, "THIS LEASE AGREEMENT...");
        assert!(session.answering);
        assert_eq!(session.turns.len(), 1);
        assert_eq!(session.turns[0].role, Role::User);
        assert_eq!(session.turns[0].content, "Can I have a pet?");

        assert!(session.finish_question(q.epoch, "No".to_string()));
        assert!(!session.answering);
        assert_eq!(session.turns.len(), 2);
        assert_eq!(session.turns[1].role, Role::Assistant);
        assert_eq!(session.turns[1].content, "No");
    }

    #[test]
    fn resubmission_orphans_a_pending_question() {
        let mut session = Session::new(Theme::Light);
        session.select_document(doc("lease.pdf"));
        let job = session.begin_analysis().unwrap();
        session.finish_analysis(job.epoch, Ok(report_with_text()));
        let q = session.begin_question("Can I sublet?").unwrap();
        assert!(session.answering);

        session.begin_analysis().unwrap();
        assert!(!session.answering);
        assert!(session.turns.is_empty());

        assert!(!session.finish_question(q.epoch, "Yes".to_string()));
        assert!(session.turns.is_empty());
        assert!(!session.answering);
    }

    #[test]
    fn stale_answer_is_discarded() {
        let mut session = Session::new(Theme::Light);
        session.select_document(doc("lease.pdf"));
        let job = session.begin_analysis().unwrap();
        session.finish_analysis(job.epoch, Ok(report_with_text()));
        let q = session.begin_question("Late fees?").unwrap();

        session.select_document(doc("other.pdf"));
        assert!(!session.finish_question(q.epoch, "Yes".to_string()));
        assert!(session.turns.is_empty());
        assert!(!session.answering);
    }

    #[test]
    fn theme_setting_round_trip() {
        assert_eq!(Theme::from_setting(Some("dark")), Theme::Dark);
        assert_eq!(Theme::from_setting(Some("light")), Theme::Light);
        assert_eq!(Theme::from_setting(Some("solarized")), Theme::Light);
        assert_eq!(Theme::from_setting(None), Theme::Light);
        assert_eq!(Theme::Dark.toggled(), Theme::Light);
        assert_eq!(Theme::Light.toggled().as_setting(), "dark");
    }
}
