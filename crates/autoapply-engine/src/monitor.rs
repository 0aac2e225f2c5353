use crate::backend::{Backend, BackendError};
use crate::config::AppConfig;
use crate::jobs::{self, JobPosting, normalize_link};
use crate::launcher;
use crate::login;
use crate::runner::OutputHandlers;
use crate::selector::Selector;
use crate::session::SessionStore;
use serde::Deserialize;
use std::time::Duration;
use tracing::{info, warn};
use url::Url;

pub const CARD_SELECTOR: &str = ".job-card-container";

pub const CARD_TIMEOUT: Duration = Duration::from_secs(20);

/// Collects title, company and href from every job card on the page.
const CARD_SCRIPT: &str = r#"
(() => Array.from(document.querySelectorAll('.job-card-container')).map(card => {
    const text = (el) => el ? (el.innerText || el.textContent || '').trim() : '';
    const titleEl = card.querySelector('a.job-card-container__link, a.job-card-list__title, h3');
    const companyEl = card.querySelector('a.job-card-container__company-name, span.job-card-container__primary-description, h4');
    const linkEl = card.querySelector('a.job-card-container__link, a.job-card-list__title, a');
    return {
        title: text(titleEl),
        company: text(companyEl),
        link: linkEl ? (linkEl.getAttribute('href') || '').trim() : ''
    };
}))()
"#;

#[derive(Debug, Deserialize)]
struct ScrapedCard {
    #[serde(default)]
    title: String,
    #[serde(default)]
    company: String,
    #[serde(default)]
    link: String,
}

/// Search URL for the first configured keyword: past 24 hours, internship
/// and entry level, optionally Easy Apply only.
pub fn search_url(config: &AppConfig) -> Result<Url, url::ParseError> {
    let keyword = config
        .search
        .keywords
        .first()
        .map(String::as_str)
        .unwrap_or_default();

    let mut url = Url::parse(&config.site.base_url)?.join("/jobs/search/")?;
    {
        let mut query = url.query_pairs_mut();
        query
            .append_pair("keywords", keyword)
            .append_pair("location", &config.search.location)
            .append_pair("f_TP", "1")
            .append_pair("f_E", "1,2");
        if config.search.easy_apply_only {
            query.append_pair("f_AL", "true");
        }
    }
    Ok(url)
}

/// Turn raw cards into postings: drop cards without a link, resolve
/// relative links, stamp with the scan time.
fn into_postings(cards: Vec<ScrapedCard>, base_url: &str, stamp: &str) -> Vec<JobPosting> {
    cards
        .into_iter()
        .filter(|card| !card.link.is_empty())
        .map(|card| JobPosting {
            title: card.title,
            company: card.company,
            link: normalize_link(&card.link, base_url),
            timestamp: Some(stamp.to_string()),
        })
        .collect()
}

/// Scrape the search results page the backend is pointed at.
pub async fn collect<B: Backend + ?Sized>(
    backend: &mut B,
    config: &AppConfig,
) -> Result<Vec<JobPosting>, BackendError> {
    let url = search_url(config).map_err(|e| BackendError::Navigation(e.to_string()))?;
    info!("Searching jobs at {}", url);
    backend.navigate(url.as_str()).await?;

    match backend
        .wait_for(&Selector::css(CARD_SELECTOR), CARD_TIMEOUT)
        .await
    {
        Ok(()) => {}
        Err(e) if e.is_restartable() => return Err(e),
        Err(e) => {
            warn!("Could not locate job cards: {}", e);
            return Ok(Vec::new());
        }
    }

    let value = backend.execute_script(CARD_SCRIPT).await?;
    let cards: Vec<ScrapedCard> = serde_json::from_value(value)?;
    let stamp = chrono::Local::now().to_rfc3339();
    Ok(into_postings(cards, &config.site.base_url, &stamp))
}

/// Launch, log in when credentials are set, scrape, and write the job list.
/// Returns the number of postings saved.
pub async fn run_monitor<B: Backend + ?Sized>(
    backend: &mut B,
    config: &AppConfig,
    output: OutputHandlers,
) -> Result<usize, BackendError> {
    let store = SessionStore::new(&config.files.session_state);
    launcher::launch(backend, Some(&store)).await?;

    let result = scan(backend, config, Some(&store), output).await;
    launcher::shutdown(backend).await;
    Ok(result?.len())
}

/// Log in when credentials are set, scrape the search page and write the
/// postings to the job list file. The backend must already be launched.
pub async fn scan<B: Backend + ?Sized>(
    backend: &mut B,
    config: &AppConfig,
    store: Option<&SessionStore>,
    output: OutputHandlers,
) -> Result<Vec<JobPosting>, BackendError> {
    if config.credentials.is_complete() {
        if let Err(e) = login::login(backend, config, store).await {
            if e.is_restartable() {
                return Err(e);
            }
            warn!("Login failed, searching anonymously: {}", e);
        }
    } else {
        info!("No credentials found. Proceeding without login.");
    }

    let postings = collect(backend, config).await?;
    for job in &postings {
        (output.out)(&format!("{} at {}\n  {}", job.title, job.company, job.link));
    }

    jobs::save(&config.files.job_data, &postings).await?;
    (output.out)(&format!(
        "Saved {} job(s) to {}",
        postings.len(),
        config.files.job_data.display()
    ));
    Ok(postings)
}
