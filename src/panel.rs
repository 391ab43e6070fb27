// src/panel.rs
//! The side panel: extracts the problem from the active tab, asks the
//! analysis service about it, and on request generates and pastes code.
//!
//! Both actions may be triggered again while a previous run is still in
//! flight. Each run carries the generation it was started under and a
//! response that arrives for an older generation is dropped, so the view
//! always reflects the latest click.

use std::sync::{Mutex, MutexGuard};

use crate::browser::Tabs;
use crate::errors::{CoachError, Result};
use crate::protocol::{AnalysisResult, PageRequest, PageResponse, Problem};
use crate::service::AnalysisService;

pub const EXTRACTING: &str = "Extracting problem...";
pub const ANALYZING: &str = "Analyzing with local AI...";
pub const GENERATING: &str = "Generating C++ solution...";
pub const EXTRACT_FAILED: &str = "Failed to extract problem.";
pub const PAGE_UNREACHABLE: &str = "Could not reach the problem page.";
pub const SERVICE_UNAVAILABLE: &str = "Analysis service unavailable.";
pub const CODE_FAILED: &str = "Code generation failed.";
pub const NO_PROBLEM: &str = "Extract a problem first.";
pub const PASTE_FAILED: &str = "Could not paste code into the page.";

/// Contents of the analysis region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Output {
    Text(String),
    Markup(String),
}

impl Output {
    pub fn as_str(&self) -> &str {
        match self {
            Output::Text(s) | Output::Markup(s) => s,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelView {
    pub output: Output,
    pub code_button_visible: bool,
    pub code_block_visible: bool,
    pub code_block: String,
    pub status: Option<String>,
}

impl Default for PanelView {
    fn default() -> Self {
        Self {
            output: Output::Text(String::new()),
            code_button_visible: false,
            code_block_visible: false,
            code_block: String::new(),
            status: None,
        }
    }
}

/// How an action ended when it did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Completed,
    /// A newer action took over the view before this one finished.
    Superseded,
}

#[derive(Default)]
struct PanelState {
    view: PanelView,
    /// The last extracted problem and the extract generation it came from.
    cached_problem: Option<(u64, Problem)>,
    problem_generation: u64,
    code_generation: u64,
}

impl PanelState {
    fn is_current(&self, problem_generation: u64, code_generation: u64) -> bool {
        self.problem_generation == problem_generation && self.code_generation == code_generation
    }
}

pub struct PanelController<T, S> {
    tabs: T,
    service: S,
    state: Mutex<PanelState>,
}

impl<T: Tabs, S: AnalysisService> PanelController<T, S> {
    pub fn new(tabs: T, service: S) -> Self {
        Self {
            tabs,
            service,
            state: Mutex::new(PanelState::default()),
        }
    }

    pub fn tabs(&self) -> &T {
        &self.tabs
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    pub fn view(&self) -> PanelView {
        self.lock().view.clone()
    }

    pub fn cached_problem(&self) -> Option<Problem> {
        self.lock().cached_problem.as_ref().map(|(_, p)| p.clone())
    }

    fn lock(&self) -> MutexGuard<'_, PanelState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// The "Extract" action.
    pub async fn extract(&self) -> Result<Outcome> {
        let generation = {
            let mut state = self.lock();
            state.problem_generation += 1;
            state.cached_problem = None;
            state.view.output = Output::Text(EXTRACTING.to_string());
            state.view.code_block_visible = false;
            state.view.code_button_visible = false;
            state.view.status = None;
            state.problem_generation
        };
        log::debug!("extract #{} started", generation);

        match self.run_extract(generation).await {
            Ok(outcome) => Ok(outcome),
            Err(err) => self.fail_extract(generation, err),
        }
    }

    async fn run_extract(&self, generation: u64) -> Result<Outcome> {
        let tab = self.tabs.active_tab().await?;
        let problem = match self.tabs.send_message(tab, &PageRequest::GetProblem).await? {
            Some(PageResponse::Problem(problem)) if !problem.description.is_empty() => problem,
            Some(PageResponse::Failure { error, details }) => {
                return Err(CoachError::Extraction {
                    message: error,
                    details,
                });
            }
            _ => {
                return Err(CoachError::Extraction {
                    message: "page returned no problem description".to_string(),
                    details: None,
                });
            }
        };

        {
            let mut state = self.lock();
            if state.problem_generation != generation {
                return Ok(self.superseded("extract", generation));
            }
            state.cached_problem = Some((generation, problem.clone()));
            state.view.output = Output::Text(ANALYZING.to_string());
        }
        log::info!("extracted \"{}\"", problem.title);

        let analysis = self.service.analyze(&problem).await?;

        let mut state = self.lock();
        if state.problem_generation != generation {
            drop(state);
            return Ok(self.superseded("extract", generation));
        }
        state.view.output = Output::Markup(render_analysis(&analysis));
        state.view.code_button_visible = true;
        Ok(Outcome::Completed)
    }

    fn fail_extract(&self, generation: u64, err: CoachError) -> Result<Outcome> {
        let headline = match &err {
            CoachError::PageUnreachable(_) => PAGE_UNREACHABLE,
            CoachError::Extraction { .. } => EXTRACT_FAILED,
            _ => SERVICE_UNAVAILABLE,
        };

        {
            let mut state = self.lock();
            if state.problem_generation != generation {
                drop(state);
                log::debug!("extract #{} failed after being superseded: {}", generation, err);
                return Ok(Outcome::Superseded);
            }
            state.view.output = Output::Text(failure_text(headline, &err));
            state.view.code_button_visible = false;
            state.view.code_block_visible = false;
        }

        log::warn!("extract #{} failed: {}", generation, err);
        Err(err)
    }

    /// The "Generate Code" action.
    pub async fn generate_code(&self) -> Result<Outcome> {
        let (problem, problem_generation, code_generation) = {
            let mut state = self.lock();
            state.code_generation += 1;
            state.view.code_block = GENERATING.to_string();
            state.view.code_block_visible = true;
            state.view.status = None;
            let current = state.problem_generation;
            (
                state
                    .cached_problem
                    .as_ref()
                    .filter(|(generation, _)| *generation == current)
                    .map(|(_, problem)| problem.clone()),
                state.problem_generation,
                state.code_generation,
            )
        };

        let Some(problem) = problem else {
            return self.fail_code(problem_generation, code_generation, CoachError::NoCachedProblem);
        };

        let code = match self.service.generate_code(&problem).await {
            Ok(result) => result.code,
            Err(err) => return self.fail_code(problem_generation, code_generation, err),
        };

        {
            let mut state = self.lock();
            if !state.is_current(problem_generation, code_generation) {
                drop(state);
                return Ok(self.superseded("generate", code_generation));
            }
            state.view.code_block = code.clone();
        }

        if let Err(err) = self.paste(&code).await {
            let mut state = self.lock();
            if state.is_current(problem_generation, code_generation) {
                state.view.status = Some(failure_text(PASTE_FAILED, &err));
            }
            drop(state);
            log::warn!("paste failed: {}", err);
            return Err(err);
        }
        Ok(Outcome::Completed)
    }

    async fn paste(&self, code: &str) -> Result<()> {
        let tab = self.tabs.active_tab().await?;
        let request = PageRequest::PasteCode {
            code: code.to_string(),
        };
        match self.tabs.send_message(tab, &request).await? {
            Some(PageResponse::Failure { error, details }) => Err(CoachError::Extraction {
                message: error,
                details,
            }),
            Some(PageResponse::Pasted { ok: false }) => Err(CoachError::Extraction {
                message: "page rejected the pasted code".to_string(),
                details: None,
            }),
            _ => Ok(()),
        }
    }

    fn fail_code(
        &self,
        problem_generation: u64,
        code_generation: u64,
        err: CoachError,
    ) -> Result<Outcome> {
        let headline = match &err {
            CoachError::NoCachedProblem => NO_PROBLEM,
            _ => CODE_FAILED,
        };

        {
            let mut state = self.lock();
            if !state.is_current(problem_generation, code_generation) {
                drop(state);
                log::debug!("generate #{} failed after being superseded: {}", code_generation, err);
                return Ok(Outcome::Superseded);
            }
            state.view.code_block = failure_text(headline, &err);
            state.view.code_block_visible = true;
        }

        log::warn!("generate #{} failed: {}", code_generation, err);
        Err(err)
    }

    fn superseded(&self, action: &str, generation: u64) -> Outcome {
        log::debug!("{} #{} superseded, dropping its response", action, generation);
        Outcome::Superseded
    }
}

fn failure_text(headline: &str, err: &CoachError) -> String {
    match err {
        CoachError::NoCachedProblem => headline.to_string(),
        CoachError::Extraction {
            message,
            details: Some(details),
        } => format!("{}\n{}: {}", headline, message, details),
        _ => format!("{}\n{}", headline, err),
    }
}

/// Renders the analysis as a heading and paragraph per field.
pub fn render_analysis(analysis: &AnalysisResult) -> String {
    let mut sections = vec![
        ("Explanation", analysis.explanation.as_str()),
        ("Approach", analysis.approach.as_str()),
        ("Time Complexity", analysis.time_complexity.as_str()),
        ("Space Complexity", analysis.space_complexity.as_str()),
    ];
    if let Some(hints) = &analysis.hints {
        sections.push(("Hints", hints.as_str()));
    }

    sections
        .into_iter()
        .map(|(label, value)| format!("<h3>{}</h3>\n<p>{}</p>", label, escape_html(value)))
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
