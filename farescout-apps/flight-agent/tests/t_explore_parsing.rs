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

//! Explore (city/country destination) document parsing fixtures.
//!
//! Run with:
//!     cargo test --test t_explore_parsing

use farescout_flight_agent::ExploreTable;

/// Minimal result card matching the explore page structure.
fn card(city: &str, price: &str, stops: &str, duration: &str, mode_spans: usize) -> String {
    let spans: String = (0..mode_spans).map(|_| "<span></span>").collect();
    format!(
        r#"<div class="tsAU4e">
            <div class="o9JBjb sSHqwe">{spans}</div>
            <h3 class="W6bZuc YMlIz">{city}</h3>
            <div class="MJg7fb QB2Jof"><span>{price}</span></div>
            <span class="nx0jzf">{stops}</span>
            <span class="Xq1DAb">{duration}</span>
        </div>"#
    )
}

fn page(cards: &[String]) -> String {
    format!("<html><body><main>{}</main></body></html>", cards.join("\n"))
}

#[test]
fn test_city_rows_parse_in_document_order() {
    let html = page(&[
        card("Lisbon", "€89", "Nonstop", "2 hr 50 min", 2),
        card("Vienna", "€120", "1 stop", "4 hr 5 min", 2),
        card("Istanbul", "€1,240", "2 stops", "6 hr", 3),
    ]);
    let table = ExploreTable::from_html(&html);
    assert_eq!(table.len(), 3);
    assert_eq!(table.rows[0].city.as_deref(), Some("Lisbon"));
    assert_eq!(table.rows[0].price, 89);
    assert_eq!(table.rows[0].stops.as_deref(), Some("Nonstop"));
    assert_eq!(table.rows[0].duration_minutes, Some(170));
    // Thousands separators are stripped.
    assert_eq!(table.rows[2].price, 1240);
    assert_eq!(table.rows[2].duration_minutes, Some(360));
}

#[test]
fn test_ground_transport_cards_are_skipped() {
    let html = page(&[
        card("Brussels", "€45", "Nonstop", "1 hr 10 min", 5),
        card("Porto", "€60", "Nonstop", "2 hr", 1),
    ]);
    let table = ExploreTable::from_html(&html);
    assert_eq!(table.len(), 1);
    assert_eq!(table.rows[0].city.as_deref(), Some("Porto"));
}

#[test]
fn test_priceless_cards_are_skipped() {
    let html = page(&[
        card("Madrid", "", "Nonstop", "2 hr", 1),
        card("Rome", "€75", "Nonstop", "2 hr 20 min", 1),
    ]);
    let table = ExploreTable::from_html(&html);
    assert_eq!(table.len(), 1);
    assert_eq!(table.rows[0].city.as_deref(), Some("Rome"));
}

#[test]
fn test_empty_document_yields_empty_table() {
    let table = ExploreTable::from_html("<html><body><p>No results</p></body></html>");
    assert!(table.is_empty());
}

#[test]
fn test_tables_union_row_wise() {
    let mut first = ExploreTable::from_html(&page(&[card("Lisbon", "€89", "Nonstop", "2 hr", 1)]));
    let second = ExploreTable::from_html(&page(&[card("Porto", "€60", "Nonstop", "1 hr", 1)]));
    first.extend(&second);
    assert_eq!(first.len(), 2);
    assert_eq!(first.rows[1].city.as_deref(), Some("Porto"));
}
