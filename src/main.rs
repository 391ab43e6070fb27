use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;

use leetcoach::banner;
use leetcoach::browser::{LocalBrowser, Tabs};
use leetcoach::config::{AppConfig, ServiceConfig};
use leetcoach::content_script::{ContentScript, Page};
use leetcoach::errors::Result;
use leetcoach::extractor::markup_to_text;
use leetcoach::lifecycle::{self, LifecycleEvent, NativeHost};
use leetcoach::panel::{Output, PanelController, PanelView};
use leetcoach::service::HttpAnalysisClient;

/// Analyze a saved coding-problem page with the local analysis service.
#[derive(Parser, Debug)]
#[command(name = "leetcoach", version, about)]
struct Cli {
    /// Saved HTML of the problem page
    #[arg(long)]
    page: PathBuf,

    /// Address the page was saved from
    #[arg(long, default_value = "file://problem.html")]
    url: String,

    /// Base URL of the analysis service
    #[arg(long)]
    service_url: Option<String>,

    /// Also generate a solution and paste it into the page editor
    #[arg(long)]
    generate_code: bool,

    /// Write the page editor contents here after pasting
    #[arg(long, requires = "generate_code")]
    out: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    banner::print_banner();

    if let Err(e) = dotenvy::dotenv() {
        eprintln!("⚠️  Warning: Could not load .env file: {}", e);
    }
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("❌ {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = AppConfig::from_env()?;
    if let Some(url) = &cli.service_url {
        config.service = ServiceConfig::new(url)?;
    }

    lifecycle::handle(&NativeHost, LifecycleEvent::Startup)?;

    let html = std::fs::read_to_string(&cli.page)?;
    let browser = LocalBrowser::new(ContentScript::new(config.selectors.extractor()));
    browser.open(Page::new(cli.url.clone(), html));

    let service = HttpAnalysisClient::new(reqwest::Client::new(), config.service.clone());
    let panel = PanelController::new(browser, service);

    println!("🔍 Analyzing with {}", config.service.base_url);
    let extracted = panel.extract().await;
    print_view(&panel.view());
    extracted?;

    if !cli.generate_code {
        return Ok(());
    }

    let generated = panel.generate_code().await;
    print_view(&panel.view());
    generated?;

    if let Some(out) = &cli.out {
        let tab = panel.tabs().active_tab().await?;
        let editor = panel.tabs().page(tab).map(|p| p.editor).unwrap_or_default();
        std::fs::write(out, editor)?;
        println!("💾 Wrote solution to {}", out.display());
    }
    Ok(())
}

fn print_view(view: &PanelView) {
    match &view.output {
        Output::Text(text) => println!("{}\n", text),
        Output::Markup(markup) => println!("{}\n", markup_to_text(markup)),
    }
    if view.code_block_visible {
        println!("----- code -----\n{}\n----------------", view.code_block);
    }
    if let Some(status) = &view.status {
        println!("⚠️  {}", status);
    }
}
