// tests/panel_flow.rs
use leetcoach::browser::{LocalBrowser, TabId, Tabs};
use leetcoach::content_script::Page;
use leetcoach::errors::{CoachError, Result};
use leetcoach::panel::{
    ANALYZING, CODE_FAILED, EXTRACT_FAILED, NO_PROBLEM, Outcome, Output, PAGE_UNREACHABLE,
    PASTE_FAILED, PanelController, SERVICE_UNAVAILABLE,
};
use leetcoach::protocol::{AnalysisResult, CodeResult, PageRequest, PageResponse, Problem};
use leetcoach::service::AnalysisService;
use std::collections::VecDeque;
use std::sync::Mutex;
use tokio::sync::oneshot;

fn problem_page(title: &str, description: &str) -> Page {
    Page::new(
        format!("https://leetcode.com/problems/{}/", title.to_lowercase().replace(' ', "-")),
        format!(
            r#"<div class="text-title-large">
                 {}
               </div>
               <div data-track-load="description_content">
                 <p>{}</p>
               </div>"#,
            title, description
        ),
    )
}

/// Records every request and answers from the problem title. Calls can be
/// held back until the test releases them.
#[derive(Default)]
struct FakeService {
    analyze_calls: Mutex<Vec<Problem>>,
    code_calls: Mutex<Vec<Problem>>,
    gates: Mutex<VecDeque<Option<oneshot::Receiver<()>>>>,
    fail_analyze: Mutex<bool>,
    code: Mutex<String>,
}

impl FakeService {
    fn with_code(code: &str) -> Self {
        let service = Self::default();
        *service.code.lock().unwrap() = code.to_string();
        service
    }

    fn gate_next(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.gates.lock().unwrap().push_back(Some(rx));
        tx
    }

    fn analyze_calls(&self) -> Vec<Problem> {
        self.analyze_calls.lock().unwrap().clone()
    }

    fn code_calls(&self) -> Vec<Problem> {
        self.code_calls.lock().unwrap().clone()
    }

    async fn wait_gate(&self) {
        let gate = self.gates.lock().unwrap().pop_front().flatten();
        if let Some(gate) = gate {
            let _ = gate.await;
        }
    }
}

impl AnalysisService for FakeService {
    async fn analyze(&self, problem: &Problem) -> Result<AnalysisResult> {
        self.analyze_calls.lock().unwrap().push(problem.clone());
        self.wait_gate().await;
        if *self.fail_analyze.lock().unwrap() {
            return Err(CoachError::ApiError {
                status: 500,
                body: "model offline".to_string(),
            });
        }
        Ok(AnalysisResult {
            explanation: format!("About {}", problem.title),
            approach: "A".to_string(),
            time_complexity: "O(n)".to_string(),
            space_complexity: "O(n)".to_string(),
            hints: None,
        })
    }

    async fn generate_code(&self, problem: &Problem) -> Result<CodeResult> {
        self.code_calls.lock().unwrap().push(problem.clone());
        self.wait_gate().await;
        Ok(CodeResult {
            code: self.code.lock().unwrap().clone(),
        })
    }
}

fn panel_with(page: Page, service: FakeService) -> PanelController<LocalBrowser, FakeService> {
    let browser = LocalBrowser::default();
    browser.open(page);
    PanelController::new(browser, service)
}

#[tokio::test]
async fn test_extract_analyzes_and_reveals_code_button() {
    let panel = panel_with(
        problem_page("Two Sum", "Given an array..."),
        FakeService::default(),
    );

    assert_eq!(panel.extract().await.unwrap(), Outcome::Completed);

    let expected = Problem {
        title: "Two Sum".to_string(),
        description: "Given an array...".to_string(),
    };
    assert_eq!(panel.service().analyze_calls(), vec![expected.clone()]);
    assert_eq!(panel.cached_problem(), Some(expected));

    let view = panel.view();
    let Output::Markup(markup) = &view.output else {
        panic!("expected markup, got {:?}", view.output);
    };
    assert!(markup.contains("<p>About Two Sum</p>"));
    assert!(markup.contains("<h3>Time Complexity</h3>\n<p>O(n)</p>"));
    assert!(view.code_button_visible);
    assert!(!view.code_block_visible);
}

#[tokio::test]
async fn test_missing_elements_stop_before_the_service() {
    let panel = panel_with(
        Page::new("https://leetcode.com/problemset/", "<main>problem list</main>"),
        FakeService::default(),
    );

    let err = panel.extract().await.unwrap_err();
    assert!(matches!(err, CoachError::Extraction { .. }));

    let view = panel.view();
    assert_eq!(
        view.output,
        Output::Text(format!("{}\nProblem elements not found", EXTRACT_FAILED))
    );
    assert!(!view.code_button_visible);
    assert!(panel.service().analyze_calls().is_empty());
    assert_eq!(panel.cached_problem(), None);
}

#[tokio::test]
async fn test_empty_description_counts_as_failed_extraction() {
    let panel = panel_with(problem_page("Two Sum", ""), FakeService::default());

    assert!(panel.extract().await.is_err());
    assert!(panel.view().output.as_str().starts_with(EXTRACT_FAILED));
    assert!(panel.service().analyze_calls().is_empty());
}

#[tokio::test]
async fn test_unreachable_page() {
    let browser = LocalBrowser::default();
    browser.open_without_listener(Page::new("chrome://extensions", ""));
    let panel = PanelController::new(browser, FakeService::default());

    let err = panel.extract().await.unwrap_err();
    assert!(matches!(err, CoachError::PageUnreachable(_)));
    assert!(panel.view().output.as_str().starts_with(PAGE_UNREACHABLE));
}

#[tokio::test]
async fn test_service_failure_leaves_panel_retryable() {
    let panel = panel_with(problem_page("Two Sum", "d"), FakeService::default());
    *panel.service().fail_analyze.lock().unwrap() = true;

    let err = panel.extract().await.unwrap_err();
    assert!(err.is_service_failure());
    let view = panel.view();
    assert!(view.output.as_str().starts_with(SERVICE_UNAVAILABLE));
    assert!(view.output.as_str().contains("model offline"));
    assert!(!view.code_button_visible);
    assert!(!view.code_block_visible);

    *panel.service().fail_analyze.lock().unwrap() = false;
    assert_eq!(panel.extract().await.unwrap(), Outcome::Completed);
    assert!(panel.view().code_button_visible);
}

#[tokio::test]
async fn test_generate_code_posts_cached_problem_and_pastes() {
    let panel = panel_with(
        problem_page("Two Sum", "Given an array..."),
        FakeService::with_code("int main(){}"),
    );
    panel.extract().await.unwrap();
    let cached = panel.cached_problem().unwrap();

    assert_eq!(panel.generate_code().await.unwrap(), Outcome::Completed);

    assert_eq!(panel.service().code_calls(), vec![cached]);
    let view = panel.view();
    assert!(view.code_block_visible);
    assert_eq!(view.code_block, "int main(){}");
    assert_eq!(view.status, None);

    let tab = 1;
    assert_eq!(panel.tabs().page(tab).unwrap().editor, "int main(){}");
}

#[tokio::test]
async fn test_generate_code_requires_an_extracted_problem() {
    let panel = panel_with(problem_page("Two Sum", "d"), FakeService::with_code("x"));

    let err = panel.generate_code().await.unwrap_err();
    assert!(matches!(err, CoachError::NoCachedProblem));
    assert!(panel.service().code_calls().is_empty());

    let view = panel.view();
    assert!(view.code_block_visible);
    assert_eq!(view.code_block, NO_PROBLEM);
}

#[tokio::test]
async fn test_paste_failure_keeps_generated_code() {
    let panel = panel_with(problem_page("Two Sum", "d"), FakeService::with_code("int main(){}"));
    panel.extract().await.unwrap();
    let settings = panel
        .tabs()
        .open_without_listener(Page::new("chrome://settings", ""));
    assert_eq!(settings, 2);

    let err = panel.generate_code().await.unwrap_err();
    assert!(matches!(err, CoachError::PageUnreachable(_)));

    let view = panel.view();
    assert_eq!(view.code_block, "int main(){}");
    assert!(view.status.unwrap().starts_with(PASTE_FAILED));
    assert_eq!(panel.tabs().page(1).unwrap().editor, "");
}

#[tokio::test]
async fn test_stale_analysis_is_dropped() {
    let browser = LocalBrowser::default();
    let first_tab = browser.open(problem_page("First", "one"));
    let second_tab = browser.open(problem_page("Second", "two"));
    browser.activate(first_tab).unwrap();

    let service = FakeService::default();
    let release_first = service.gate_next();
    let panel = PanelController::new(browser, service);

    let first = panel.extract();
    let second = async {
        while panel.service().analyze_calls().is_empty() {
            tokio::task::yield_now().await;
        }
        assert_eq!(panel.view().output, Output::Text(ANALYZING.to_string()));
        panel.tabs().activate(second_tab).unwrap();
        let outcome = panel.extract().await;
        release_first.send(()).unwrap();
        outcome
    };
    let (first, second) = tokio::join!(first, second);

    assert_eq!(first.unwrap(), Outcome::Superseded);
    assert_eq!(second.unwrap(), Outcome::Completed);
    assert_eq!(panel.cached_problem().unwrap().title, "Second");
    assert!(panel.view().output.as_str().contains("About Second"));
    assert!(!panel.view().output.as_str().contains("About First"));
}

#[tokio::test]
async fn test_code_for_a_replaced_problem_is_dropped() {
    let panel = panel_with(problem_page("Two Sum", "d"), FakeService::with_code("old()"));
    panel.extract().await.unwrap();
    let release_code = panel.service().gate_next();

    let generate = panel.generate_code();
    let extract_again = async {
        while panel.service().code_calls().is_empty() {
            tokio::task::yield_now().await;
        }
        let outcome = panel.extract().await;
        release_code.send(()).unwrap();
        outcome
    };
    let (generated, extracted) = tokio::join!(generate, extract_again);

    assert_eq!(generated.unwrap(), Outcome::Superseded);
    assert_eq!(extracted.unwrap(), Outcome::Completed);
    let view = panel.view();
    assert!(!view.code_block_visible);
    assert_eq!(panel.tabs().page(1).unwrap().editor, "");
}

#[tokio::test]
async fn test_code_failure_message() {
    struct DownService;

    impl AnalysisService for DownService {
        async fn analyze(&self, _problem: &Problem) -> Result<AnalysisResult> {
            Err(CoachError::ApiResponse("Model returned invalid JSON".to_string()))
        }

        async fn generate_code(&self, _problem: &Problem) -> Result<CodeResult> {
            Err(CoachError::ApiResponse("Code generation failed".to_string()))
        }
    }

    let browser = LocalBrowser::default();
    browser.open(problem_page("Two Sum", "d"));
    let panel = PanelController::new(browser, DownService);

    // the problem is cached even though analysis failed
    assert!(panel.extract().await.is_err());
    assert!(panel.cached_problem().is_some());

    assert!(panel.generate_code().await.is_err());
    let view = panel.view();
    assert!(view.code_block.starts_with(CODE_FAILED));
    assert!(view.code_block_visible);
}

#[tokio::test]
async fn test_failed_re_extract_forgets_the_previous_problem() {
    let browser = LocalBrowser::default();
    let problem_tab = browser.open(problem_page("First", "one"));
    let panel = PanelController::new(browser, FakeService::with_code("code_for_first()"));
    panel.extract().await.unwrap();
    assert!(panel.cached_problem().is_some());

    let list_tab = panel
        .tabs()
        .open(Page::new("https://leetcode.com/problemset/", "<main>problem list</main>"));
    assert!(panel.extract().await.is_err());
    assert_eq!(panel.cached_problem(), None);
    assert!(!panel.view().code_button_visible);

    let err = panel.generate_code().await.unwrap_err();
    assert!(matches!(err, CoachError::NoCachedProblem));
    assert!(panel.service().code_calls().is_empty());
    assert_eq!(panel.view().code_block, NO_PROBLEM);
    assert_eq!(panel.tabs().page(list_tab).unwrap().editor, "");
    assert_eq!(panel.tabs().page(problem_tab).unwrap().editor, "");
}

/// A browser whose pages refuse every paste.
struct ReadOnlyEditorTabs(LocalBrowser);

impl Tabs for ReadOnlyEditorTabs {
    async fn active_tab(&self) -> Result<TabId> {
        self.0.active_tab().await
    }

    async fn send_message(&self, tab: TabId, request: &PageRequest) -> Result<Option<PageResponse>> {
        match request {
            PageRequest::PasteCode { .. } => Ok(Some(PageResponse::Pasted { ok: false })),
            _ => self.0.send_message(tab, request).await,
        }
    }
}

#[tokio::test]
async fn test_rejected_paste_is_reported() {
    let browser = LocalBrowser::default();
    browser.open(problem_page("Two Sum", "d"));
    let panel = PanelController::new(
        ReadOnlyEditorTabs(browser),
        FakeService::with_code("int main(){}"),
    );
    panel.extract().await.unwrap();

    let err = panel.generate_code().await.unwrap_err();
    assert!(matches!(err, CoachError::Extraction { .. }));

    let view = panel.view();
    assert_eq!(view.code_block, "int main(){}");
    let status = view.status.unwrap();
    assert!(status.starts_with(PASTE_FAILED));
    assert!(status.contains("rejected"));
}
