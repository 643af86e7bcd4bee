//!  FareScout Flight Agent
//!
//!  Copyright (C) 2026  FareScout contributors
//!
//!  This program is free software: you can redistribute it and/or modify
//!  it under the terms of the GNU Affero General Public License as published by
//!  the Free Software Foundation, either version 3 of the License, or
//!  (at your option) any later version.
//!
//!  This program is distributed in the hope that it will be useful,
//!  but WITHOUT ANY WARRANTY; without even the implied warranty of
//!  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
//!  GNU Affero General Public License for more details.
//!
//!  You should have received a copy of the GNU Affero General Public License
//!  along with this program.  If not, see <http://www.gnu.org/licenses/>.

//! # Flight Search Client
//!
//! Effectful (time, network) operations: the [`Renderer`] seam to the page
//! renderer, a default HTTP implementation, and the driver that fetches a
//! query's legs strictly sequentially. The renderer is not reentrant; one
//! blocking round trip per leg, in leg order. Leg-local failures become
//! empty results, never a batch abort.

use std::time::Duration;

use anyhow::{Context, Result};
use farescout_leg_pacing::PacingPolicy;
use scraper::{ElementRef, Html};
use thiserror::Error;
use wreq::redirect::Policy;
use wreq_util::Emulation;

use crate::explore_parser::ExploreTable;
use crate::results_parser::{parse_results, OfferTable, SectionMarkers};
use crate::trip_combine::{QueryResults, TripQuery};

/// Failure of one render round trip.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("render timed out")]
    Timeout,
    #[error("render failed: {0}")]
    Transport(#[source] anyhow::Error),
}

/// External collaborator that fetches and renders one URL.
pub trait Renderer {
    /// Newline-delimited visible text of the results region.
    async fn visible_text(&self, url: &str) -> Result<Vec<String>, RenderError>;
    /// Full document, for the explore (structural) parsing path.
    async fn document(&self, url: &str) -> Result<String, RenderError>;
}

/// Per-batch configuration, scoped to one invocation. There is no
/// process-wide mutable browser state.
#[derive(Debug, Clone)]
pub struct BatchConfig {
    pub language: String,
    pub currency: String,
    /// Per-leg bound on one render round trip.
    pub render_timeout: Duration,
    /// Inter-leg delay policy; disabled for batch/offline runs.
    pub pacing: PacingPolicy,
    /// Section boundary phrases, overridable when the service UI copy moves.
    pub markers: SectionMarkers,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            language: "en".to_string(),
            currency: "EUR".to_string(),
            render_timeout: Duration::from_secs(30),
            pacing: PacingPolicy::Disabled,
            markers: SectionMarkers::default(),
        }
    }
}

/// Per-batch accounting: every leg is fetched, skipped or empty; whatever
/// parsed is committed.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BatchReport {
    pub queries: usize,
    pub legs_fetched: usize,
    pub legs_empty: usize,
    pub legs_skipped: usize,
}

impl BatchReport {
    fn absorb(&mut self, other: BatchReport) {
        self.queries += other.queries;
        self.legs_fetched += other.legs_fetched;
        self.legs_empty += other.legs_empty;
        self.legs_skipped += other.legs_skipped;
    }
}

/// Default [`Renderer`] on a plain HTTP client with browser emulation.
pub struct HttpRenderer {
    client: wreq::Client,
}

impl HttpRenderer {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = wreq::Client::builder()
            .emulation(Emulation::Safari18_5)
            .redirect(Policy::default())
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { client })
    }

    async fn fetch(&self, url: &str) -> Result<String, RenderError> {
        let start = std::time::Instant::now();
        tracing::trace!("[fetch] Starting HTTP request to: {}", url);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| RenderError::Transport(e.into()))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| RenderError::Transport(e.into()))?;
        tracing::debug!(
            "[fetch] HTTP {} in {:?}: {} KB",
            status.as_u16(),
            start.elapsed(),
            body.len() / 1024
        );
        if !status.is_success() {
            let preview = body.chars().take(500).collect::<String>();
            return Err(RenderError::Transport(anyhow::anyhow!(
                "HTTP error {}: {}",
                status,
                preview
            )));
        }
        Ok(body)
    }
}

impl Renderer for HttpRenderer {
    async fn visible_text(&self, url: &str) -> Result<Vec<String>, RenderError> {
        let html = self.fetch(url).await?;
        Ok(visible_text_lines(&html))
    }

    async fn document(&self, url: &str) -> Result<String, RenderError> {
        self.fetch(url).await
    }
}

/// Visible text of a document, one token per text node, script/style
/// subtrees skipped. Approximates what a browser reports for the rendered
/// results region.
pub fn visible_text_lines(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    let mut lines = Vec::new();
    collect_visible_text(document.root_element(), &mut lines);
    lines
}

fn collect_visible_text(element: ElementRef, out: &mut Vec<String>) {
    for child in element.children() {
        if let Some(el) = ElementRef::wrap(child) {
            match el.value().name() {
                "script" | "style" | "noscript" => continue,
                _ => collect_visible_text(el, out),
            }
        } else if let Some(text) = child.value().as_text() {
            let trimmed = text.trim();
            if !trimmed.is_empty() {
                out.push(trimmed.to_string());
            }
        }
    }
}

/// Drives one or more trip queries against a renderer, strictly one leg at
/// a time.
pub struct FlightSearchClient<R> {
    renderer: R,
    config: BatchConfig,
}

impl<R: Renderer> FlightSearchClient<R> {
    pub fn new(renderer: R, config: BatchConfig) -> Self {
        Self { renderer, config }
    }

    pub fn config(&self) -> &BatchConfig {
        &self.config
    }

    /// Fetch and parse every leg of one query, then attach the results.
    /// Per-leg timeouts and transport failures yield empty legs and a
    /// warning; only structural misuse (an already-queried query) errors.
    pub async fn run(&self, query: &mut TripQuery) -> Result<BatchReport> {
        let mut report = BatchReport {
            queries: 1,
            ..BatchReport::default()
        };

        if query.spec().is_explore() {
            let url = self.localize(&query.urls()[0]);
            let table = match self.bounded(self.renderer.document(&url)).await {
                Ok(html) => {
                    report.legs_fetched += 1;
                    ExploreTable::from_html(&html)
                }
                Err(e) => {
                    tracing::warn!("Explore render failed ({}); committing empty result", e);
                    report.legs_skipped += 1;
                    ExploreTable::default()
                }
            };
            if table.is_empty() {
                report.legs_empty += 1;
            }
            query.attach_results(QueryResults::Explore(table))?;
            return Ok(report);
        }

        let today = chrono::Local::now().date_naive();
        let mut table = OfferTable::default();
        let legs = query.spec().legs();
        let urls: Vec<String> = query.urls().iter().map(|u| self.localize(u)).collect();
        for (i, (leg, url)) in legs.iter().zip(urls).enumerate() {
            if i > 0 {
                self.config.pacing.pause().await;
            }
            if leg.date < today {
                tracing::warn!("Search date {} is in the past", leg.date);
                report.legs_skipped += 1;
                continue;
            }
            match self.bounded(self.renderer.visible_text(&url)).await {
                Ok(tokens) => {
                    report.legs_fetched += 1;
                    let leg_table = parse_results(&tokens, leg.date, &self.config.markers);
                    if leg_table.is_empty() {
                        tracing::warn!(
                            "No offers for {} --> {} on {}",
                            leg.origins.join("/"),
                            leg.dests.join("/"),
                            leg.date
                        );
                        report.legs_empty += 1;
                    }
                    table.extend(&leg_table);
                }
                Err(e) => {
                    tracing::warn!(
                        "Render failed for {} --> {} on {} ({}); leg skipped",
                        leg.origins.join("/"),
                        leg.dests.join("/"),
                        leg.date,
                        e
                    );
                    report.legs_skipped += 1;
                }
            }
        }

        query.attach_results(QueryResults::Offers(table))?;
        Ok(report)
    }

    /// Run a whole batch; sibling queries are never aborted by leg-local
    /// failures.
    pub async fn run_batch(&self, queries: &mut [TripQuery]) -> Result<BatchReport> {
        let mut report = BatchReport::default();
        for query in queries.iter_mut() {
            report.absorb(self.run(query).await?);
        }
        tracing::info!(
            "Batch done: {} queries, {} legs fetched, {} empty, {} skipped",
            report.queries,
            report.legs_fetched,
            report.legs_empty,
            report.legs_skipped
        );
        Ok(report)
    }

    /// URLs are encoded with the default locale; the batch config overrides
    /// it at fetch time.
    fn localize(&self, url: &str) -> String {
        url.replace("hl=en", &format!("hl={}", self.config.language))
            .replace("curr=EUR", &format!("curr={}", self.config.currency))
    }

    /// Enforce the per-leg render bound regardless of the renderer's own
    /// timeout handling.
    async fn bounded<T>(
        &self,
        fut: impl std::future::Future<Output = Result<T, RenderError>>,
    ) -> Result<T, RenderError> {
        match tokio::time::timeout(self.config.render_timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(RenderError::Timeout),
        }
    }
}
