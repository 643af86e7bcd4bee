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

//! # Explore Results Parser
//!
//! Structural-document parsing for explore-style (city/country) searches,
//! which return aggregated city-level rows instead of individual offers.

use scraper::{Html, Selector};
use serde::Serialize;

use crate::results_parser::parse_duration_minutes;

/// Cards whose travel-mode indicator carries more sub-elements than this are
/// ground-transport suggestions, not flights.
const MAX_TRAVEL_MODE_SPANS: usize = 3;

/// One city-level result row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExploreRow {
    pub city: Option<String>,
    pub price: u32,
    pub stops: Option<String>,
    pub duration_minutes: Option<i32>,
}

/// Aggregated explore rows for one query.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExploreTable {
    pub rows: Vec<ExploreRow>,
}

impl ExploreTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Row-wise union, order preserved.
    pub fn extend(&mut self, other: &ExploreTable) {
        self.rows.extend(other.rows.iter().cloned());
    }

    /// Parse the rendered explore document. An empty document yields an
    /// empty table and a warning, never an error.
    pub fn from_html(html: &str) -> Self {
        let selectors = ExploreSelectors::new();
        let document = Html::parse_document(html);
        let mut rows = Vec::new();

        for card in document.select(&selectors.card) {
            // Skip ground-transport cards (train/car suggestions).
            if let Some(travel_info) = card.select(&selectors.travel_mode).next() {
                let spans = travel_info.select(&selectors.span).count();
                if spans > MAX_TRAVEL_MODE_SPANS {
                    continue;
                }
            }

            // Price is essential; some cards are placeholders without one.
            let Some(price) = card
                .select(&selectors.price)
                .next()
                .and_then(|e| clean_explore_price(&e.text().collect::<String>()))
            else {
                continue;
            };

            let city = card
                .select(&selectors.city)
                .next()
                .map(|e| e.text().collect::<String>().trim().to_string())
                .filter(|s| !s.is_empty());
            let stops = card
                .select(&selectors.stops)
                .next()
                .map(|e| e.text().collect::<String>().trim().to_string())
                .filter(|s| !s.is_empty());
            let duration_minutes = card
                .select(&selectors.duration)
                .next()
                .map(|e| parse_duration_minutes(&e.text().collect::<String>()));

            rows.push(ExploreRow {
                city,
                price,
                stops,
                duration_minutes,
            });
        }

        if rows.is_empty() {
            tracing::warn!("No explore results found in document");
        }
        ExploreTable { rows }
    }
}

struct ExploreSelectors {
    card: Selector,
    travel_mode: Selector,
    span: Selector,
    city: Selector,
    price: Selector,
    stops: Selector,
    duration: Selector,
}

impl ExploreSelectors {
    fn new() -> Self {
        Self {
            card: Selector::parse(r#"div.tsAU4e"#).unwrap(),
            travel_mode: Selector::parse(r#"div.o9JBjb.sSHqwe"#).unwrap(),
            span: Selector::parse(r#"span"#).unwrap(),
            city: Selector::parse(r#"h3.W6bZuc.YMlIz"#).unwrap(),
            price: Selector::parse(r#"div.MJg7fb.QB2Jof span"#).unwrap(),
            stops: Selector::parse(r#"span.nx0jzf"#).unwrap(),
            duration: Selector::parse(r#"span.Xq1DAb"#).unwrap(),
        }
    }
}

fn clean_explore_price(s: &str) -> Option<u32> {
    let digits: String = s.chars().filter(|c| c.is_ascii_digit()).collect();
    digits.parse().ok()
}
