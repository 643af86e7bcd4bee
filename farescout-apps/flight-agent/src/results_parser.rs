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

//! # Results Parser
//!
//! Side-effect free parsing of the rendered results region: locate the
//! relevant subsection of the raw token stream, slice it into per-offer
//! token groups at time-token boundaries, then classify each group's tokens
//! into offer fields with ordered, once-only rules.
//!
//! The marker phrases are literal external-service UI copy. When that copy
//! changes, tokenization yields empty results rather than raising; the
//! marker list is configuration, not code.

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

static DURATION_H_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d+)\s*hr").unwrap());
static DURATION_M_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d+)\s*min").unwrap());

/// Section boundary phrases of the results page.
#[derive(Debug, Clone)]
pub struct SectionMarkers {
    /// Alternative section-opening phrases, tried in order (exact match).
    pub start: Vec<String>,
    /// Ground-transport suggestion header (exact match).
    pub mid_trains: String,
    /// Price-tracking header, only honored past the start marker (exact).
    pub mid_track_prices: String,
    /// Secondary results header, also the middle-section end (exact).
    pub mid_other_flights: String,
    /// Page-footer prefix used when no middle header is present.
    pub mid_fallback_prefix: String,
    /// End-of-results suffix ("View more flights" and variants).
    pub end_suffix: String,
}

impl Default for SectionMarkers {
    fn default() -> Self {
        Self {
            start: vec![
                "Sorted by top flights".to_string(),
                "Checking prices from multiple sources...".to_string(),
            ],
            mid_trains: "Trains to considerTo arrive closer to your destination".to_string(),
            mid_track_prices: "Track prices".to_string(),
            mid_other_flights: "Other flights".to_string(),
            mid_fallback_prefix: "Language".to_string(),
            end_suffix: "more flights".to_string(),
        }
    }
}

/// Contiguous sub-sequence of the token stream believed to describe one offer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenGroup(pub Vec<String>);

/// Departure/arrival times delimit offers: a meridiem time with a colon, or
/// any token carrying the "+N days" suffix.
fn is_time_token(t: &str) -> bool {
    let chars: Vec<char> = t.chars().collect();
    if chars.len() <= 2 {
        return false;
    }
    if chars[chars.len() - 2] == '+' {
        return true;
    }
    (t.ends_with("PM") || t.ends_with("AM")) && t.contains(':')
}

/// Locate the offer subsection of a raw token stream and slice it into one
/// [`TokenGroup`] per offer. Missing boundaries yield an empty list and a
/// warning; callers treat that as "no data", never as a fatal error.
pub fn split_offer_groups(raw: &[String], markers: &SectionMarkers) -> Vec<TokenGroup> {
    let tokens: Vec<String> = raw.iter().map(|t| t.trim().to_string()).collect();

    let start = markers
        .start
        .iter()
        .find_map(|m| tokens.iter().position(|t| t == m))
        .map(|i| i + 1);
    let Some(start) = start else {
        tracing::warn!("No start marker found in results");
        tracing::warn!("Raw tokens: {:?}", tokens);
        return Vec::new();
    };

    // Middle informational subsection: trains suggestion, price tracking or
    // the secondary results header; the page footer is the last resort.
    let mid_start = tokens
        .iter()
        .position(|t| t == &markers.mid_trains)
        .or_else(|| {
            tokens
                .iter()
                .position(|t| t == &markers.mid_track_prices)
                .filter(|&i| i > start)
        })
        .or_else(|| tokens.iter().position(|t| t == &markers.mid_other_flights))
        .or_else(|| {
            tokens
                .iter()
                .position(|t| t.starts_with(&markers.mid_fallback_prefix))
        })
        .unwrap_or(tokens.len());

    let retained: Vec<String> = match tokens
        .iter()
        .position(|t| t == &markers.mid_other_flights)
        .map(|i| i + 1)
    {
        Some(mid_end) => {
            let Some(end) = tokens.iter().position(|t| t.ends_with(&markers.end_suffix))
            else {
                tracing::warn!("Did not find \"{}\" end marker", markers.end_suffix);
                tracing::warn!("Raw tokens: {:?}", tokens);
                return Vec::new();
            };
            let head = tokens.get(start..mid_start.max(start)).unwrap_or(&[]);
            let tail = tokens.get(mid_end..end.max(mid_end)).unwrap_or(&[]);
            head.iter().chain(tail.iter()).cloned().collect()
        }
        None => tokens
            .get(start..mid_start.max(start))
            .unwrap_or(&[])
            .to_vec(),
    };

    // Time tokens come in departure/arrival pairs; every second one opens a
    // new offer.
    let mut bounds: Vec<usize> = retained
        .iter()
        .enumerate()
        .filter(|(_, t)| is_time_token(t))
        .map(|(i, _)| i)
        .step_by(2)
        .collect();
    if bounds.is_empty() {
        tracing::warn!("No offers detected between section markers");
        tracing::warn!("Retained tokens: {:?}", retained);
        return Vec::new();
    }
    bounds.push(retained.len());

    bounds
        .windows(2)
        .map(|w| TokenGroup(retained[w[0]..w[1]].to_vec()))
        .collect()
}

/// One parsed flight offer for a single leg-date.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Offer {
    pub origin: Option<String>,
    pub dest: Option<String>,
    pub time_leave: Option<NaiveDateTime>,
    pub time_arrive: Option<NaiveDateTime>,
    /// Elapsed duration exactly as displayed ("1 hr 30 min").
    pub duration: Option<String>,
    pub airline: Option<String>,
    pub num_stops: Option<u32>,
    /// Layover description: duration plus airport code, or the comma-joined
    /// codes of multiple stops.
    pub layover: Option<String>,
    pub co2_kg: Option<i32>,
    pub emissions_diff_pct: Option<i32>,
    pub price: Option<u32>,
    pub price_eur: Option<u32>,
    pub price_usd: Option<u32>,
    pub search_date: NaiveDate,
    /// Tokens no rule claimed. Diagnostics only, never surfaced in output.
    #[serde(skip)]
    pub unclassified: Vec<String>,
}

impl Offer {
    /// Classify one token group into an offer. The search date is the
    /// processing day.
    pub fn from_group(date: NaiveDate, group: &TokenGroup) -> Self {
        Self::from_group_at(date, group, chrono::Local::now().date_naive())
    }

    /// Deterministic variant with an injected search date.
    pub fn from_group_at(date: NaiveDate, group: &TokenGroup, search_date: NaiveDate) -> Self {
        let mut draft = OfferDraft::new(date);
        for token in &group.0 {
            if BOILERPLATE.iter().any(|b| token.contains(b)) {
                continue;
            }
            draft.classify(token);
        }
        draft.finish(search_date)
    }

    /// Duration in minutes derived from the raw text; a missing hour or
    /// minute segment counts as zero.
    pub fn duration_minutes(&self) -> Option<i32> {
        self.duration.as_deref().map(parse_duration_minutes)
    }
}

pub(crate) fn parse_duration_minutes(s: &str) -> i32 {
    let hours = DURATION_H_RE
        .captures(s)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<i32>().ok())
        .unwrap_or(0);
    let minutes = DURATION_M_RE
        .captures(s)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<i32>().ok())
        .unwrap_or(0);
    if hours == 0 && minutes == 0 {
        tracing::debug!("Could not parse duration from: '{}'", s);
    }
    hours * 60 + minutes
}

/// Phrases that never belong to an offer field.
const BOILERPLATE: &[&str] = &[
    "View price history",
    "Avoids as much CO2e",
    "Prices are currently",
    "Price insights",
];

/// Partial-offer accumulator. Rules are applied in a fixed order and each
/// claims a token only if its field is still unset; the first matching rule
/// wins.
struct OfferDraft {
    date: NaiveDate,
    times: Vec<NaiveDateTime>,
    duration: Option<String>,
    num_stops: Option<u32>,
    co2_kg: Option<i32>,
    emissions_diff_pct: Option<i32>,
    price: Option<u32>,
    price_eur: Option<u32>,
    price_usd: Option<u32>,
    origin: Option<String>,
    dest: Option<String>,
    layover: Option<String>,
    airline: Option<String>,
    unclassified: Vec<String>,
}

type Rule = fn(&mut OfferDraft, &str) -> bool;

/// Ordered once-only classification rules; see the module docs for the
/// field each one feeds.
const RULES: &[Rule] = &[
    OfferDraft::claim_time,
    OfferDraft::claim_duration,
    OfferDraft::claim_stop_count,
    OfferDraft::claim_co2,
    OfferDraft::claim_emissions,
    OfferDraft::claim_plain_price,
    OfferDraft::claim_eur_price,
    OfferDraft::claim_usd_price,
    OfferDraft::claim_endpoints,
    OfferDraft::claim_layover,
    OfferDraft::claim_airline,
];

impl OfferDraft {
    fn new(date: NaiveDate) -> Self {
        Self {
            date,
            times: Vec::new(),
            duration: None,
            num_stops: None,
            co2_kg: None,
            emissions_diff_pct: None,
            price: None,
            price_eur: None,
            price_usd: None,
            origin: None,
            dest: None,
            layover: None,
            airline: None,
            unclassified: Vec::new(),
        }
    }

    fn classify(&mut self, token: &str) {
        for rule in RULES {
            if rule(self, token) {
                return;
            }
        }
        self.unclassified.push(token.to_string());
    }

    /// Departure then arrival; a `+N` suffix shifts the arrival by N days.
    fn claim_time(&mut self, token: &str) -> bool {
        if self.times.len() >= 2 {
            return false;
        }
        if !(token.contains("AM") || token.contains("PM")) || !token.contains(':') {
            return false;
        }
        let chars: Vec<char> = token.chars().collect();
        let (body, plus_days) = if chars.len() > 2 && chars[chars.len() - 2] == '+' {
            let days = chars[chars.len() - 1].to_digit(10).unwrap_or(0) as i64;
            (chars[..chars.len() - 2].iter().collect::<String>(), days)
        } else {
            (token.to_string(), 0)
        };
        match NaiveTime::parse_from_str(body.trim(), "%I:%M %p") {
            Ok(time) => {
                self.times
                    .push(NaiveDateTime::new(self.date, time) + Duration::days(plus_days));
                true
            }
            Err(_) => false,
        }
    }

    fn claim_duration(&mut self, token: &str) -> bool {
        if self.duration.is_some() || !(token.contains("hr") || token.contains("min")) {
            return false;
        }
        self.duration = Some(token.to_string());
        true
    }

    fn claim_stop_count(&mut self, token: &str) -> bool {
        if self.num_stops.is_some() || !token.contains("stop") {
            return false;
        }
        if token == "Nonstop" {
            self.num_stops = Some(0);
            return true;
        }
        match token.split_whitespace().next().and_then(|w| w.parse().ok()) {
            Some(n) => {
                self.num_stops = Some(n);
                true
            }
            None => false,
        }
    }

    fn claim_co2(&mut self, token: &str) -> bool {
        if self.co2_kg.is_some() || !token.ends_with("CO2e") {
            return false;
        }
        match token.split_whitespace().next().and_then(|w| w.parse().ok()) {
            Some(kg) => {
                self.co2_kg = Some(kg);
                true
            }
            None => false,
        }
    }

    /// "Avg emissions" is the baseline; otherwise a signed percentage
    /// relative to it ("-12% emissions", "+23% emissions").
    fn claim_emissions(&mut self, token: &str) -> bool {
        if self.emissions_diff_pct.is_some() || !token.ends_with("emissions") {
            return false;
        }
        let Some(word) = token.split_whitespace().next() else {
            return false;
        };
        if word == "Avg" {
            self.emissions_diff_pct = Some(0);
            return true;
        }
        let chars: Vec<char> = word.chars().collect();
        if chars.len() < 2 {
            return false;
        }
        match chars[..chars.len() - 1]
            .iter()
            .collect::<String>()
            .parse::<i32>()
        {
            Ok(pct) => {
                self.emissions_diff_pct = Some(pct);
                true
            }
            Err(_) => false,
        }
    }

    fn claim_plain_price(&mut self, token: &str) -> bool {
        if token.is_empty() || !token.chars().all(|c| c.is_ascii_digit()) {
            return false;
        }
        self.price = token.parse().ok();
        self.price.is_some()
    }

    fn claim_eur_price(&mut self, token: &str) -> bool {
        if self.price_eur.is_some() || !token.contains('€') {
            return false;
        }
        self.price_eur = parse_currency_amount(token);
        self.price_eur.is_some()
    }

    fn claim_usd_price(&mut self, token: &str) -> bool {
        if self.price_usd.is_some() || !token.contains('$') {
            return false;
        }
        self.price_usd = parse_currency_amount(token);
        self.price_usd.is_some()
    }

    /// Concatenated airport pair ("JFKLAX").
    fn claim_endpoints(&mut self, token: &str) -> bool {
        if self.origin.is_some() || self.dest.is_some() {
            return false;
        }
        if token.len() != 6 || !token.chars().all(|c| c.is_ascii_uppercase()) {
            return false;
        }
        self.origin = Some(token[..3].to_string());
        self.dest = Some(token[3..].to_string());
        true
    }

    /// Layover description: a duration with a trailing airport code
    /// ("1 hr 35 min LIS"), or comma-joined codes for multiple stops.
    fn claim_layover(&mut self, token: &str) -> bool {
        let chars: Vec<char> = token.chars().collect();
        let tail_upper = chars.len() >= 3
            && chars[chars.len() - 3..]
                .iter()
                .all(|c| c.is_ascii_uppercase());
        let duration_with_code =
            (token.contains("hr") || token.contains("min")) && tail_upper;
        let multi_codes = token.split(", ").count() > 1
            && token.chars().any(|c| c.is_alphabetic())
            && token
                .chars()
                .filter(|c| c.is_alphabetic())
                .all(|c| c.is_uppercase());
        if !(duration_with_code || multi_codes) {
            return false;
        }
        self.layover = Some(token.to_string());
        true
    }

    fn claim_airline(&mut self, token: &str) -> bool {
        if token.is_empty()
            || token == "Separate tickets booked together"
            || token == "Change of airport"
        {
            return false;
        }
        let cleaned = token
            .split(',')
            .map(|e| e.split("Operated").next().unwrap_or("").trim())
            .filter(|e| !e.is_empty())
            .collect::<Vec<_>>()
            .join(",");
        if cleaned.is_empty() {
            return false;
        }
        match &mut self.airline {
            Some(existing) => {
                existing.push(',');
                existing.push_str(&cleaned);
            }
            None => self.airline = Some(cleaned),
        }
        true
    }

    fn finish(mut self, search_date: NaiveDate) -> Offer {
        // Canonical price falls back to the uniquely-present currency price.
        // Both currencies present without a plain token leaves it unset.
        if self.price.is_none() {
            self.price = match (self.price_eur, self.price_usd) {
                (Some(eur), None) => Some(eur),
                (None, Some(usd)) => Some(usd),
                _ => None,
            };
        }

        let mut times = self.times.drain(..);
        Offer {
            origin: self.origin,
            dest: self.dest,
            time_leave: times.next(),
            time_arrive: times.next(),
            duration: self.duration,
            airline: self.airline,
            num_stops: self.num_stops,
            layover: self.layover,
            co2_kg: self.co2_kg,
            emissions_diff_pct: self.emissions_diff_pct,
            price: self.price,
            price_eur: self.price_eur,
            price_usd: self.price_usd,
            search_date,
            unclassified: self.unclassified,
        }
    }
}

fn parse_currency_amount(token: &str) -> Option<u32> {
    let digits: String = token.chars().filter(|c| c.is_ascii_digit()).collect();
    digits.parse().ok()
}

/// Aggregated offers for one or more leg-dates. Row order follows the
/// source stream; unions never deduplicate.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OfferTable {
    pub offers: Vec<Offer>,
}

impl OfferTable {
    pub fn len(&self) -> usize {
        self.offers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offers.is_empty()
    }

    /// Row-wise union, order preserved.
    pub fn extend(&mut self, other: &OfferTable) {
        self.offers.extend(other.offers.iter().cloned());
    }
}

/// Parse the full token stream of one leg-date into an offer table.
pub fn parse_results(raw: &[String], date: NaiveDate, markers: &SectionMarkers) -> OfferTable {
    parse_results_at(raw, date, markers, chrono::Local::now().date_naive())
}

/// Deterministic variant with an injected search date.
pub fn parse_results_at(
    raw: &[String],
    date: NaiveDate,
    markers: &SectionMarkers,
    search_date: NaiveDate,
) -> OfferTable {
    let offers = split_offer_groups(raw, markers)
        .iter()
        .map(|group| Offer::from_group_at(date, group, search_date))
        .collect();
    OfferTable { offers }
}
