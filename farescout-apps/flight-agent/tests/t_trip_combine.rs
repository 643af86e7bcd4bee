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

//! Trip combination properties.
//!
//! Combination composes two specs of matching topology into a larger one
//! without mutating either operand. Queries combine too, carrying the
//! row-wise union of their results when both have been fetched.
//!
//! Run with:
//!     cargo test --test t_trip_combine

use chrono::NaiveDate;
use farescout_flight_agent::{
    Offer, OfferTable, QueryResults, StructuralError, TokenGroup, Topology, TripQuery, TripSpec,
};

fn d(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").expect("test date")
}

fn one_way(org: &str, dest: &str, date: &str) -> TripSpec {
    TripSpec::one_way(vec![org.into()], vec![dest.into()], d(date)).expect("one-way spec")
}

fn offers(n: usize) -> QueryResults {
    let group = TokenGroup(vec!["10:00 AM".into(), "11:30 AM".into(), "€100".into()]);
    let mut table = OfferTable::default();
    for _ in 0..n {
        table.offers.push(Offer::from_group_at(
            d("2026-09-10"),
            &group,
            d("2026-08-23"),
        ));
    }
    QueryResults::Offers(table)
}

#[test]
fn test_reversed_one_ways_build_the_round_trip() {
    let out = one_way("JFK", "LHR", "2026-09-10");
    let back = one_way("LHR", "JFK", "2026-09-20");
    let combined = out.combine(&back).expect("combine");
    let expected =
        TripSpec::round_trip("JFK".into(), "LHR".into(), d("2026-09-10"), d("2026-09-20"))
            .expect("round trip");
    assert_eq!(combined, expected);
    // Operands survive untouched.
    assert_eq!(out, one_way("JFK", "LHR", "2026-09-10"));
}

#[test]
fn test_combination_is_ordered() {
    let out = one_way("JFK", "LHR", "2026-09-10");
    let back = one_way("LHR", "JFK", "2026-09-20");
    // Reversing the operands reverses the trip direction.
    let forward = out.combine(&back).expect("combine");
    let backward = back.combine(&out);
    assert_eq!(forward.topology(), Topology::RoundTrip);
    assert!(
        matches!(backward, Err(StructuralError::DatesOutOfOrder { .. })),
        "swapped operands violate date ordering"
    );
}

#[test]
fn test_chains_fold_and_keep_date_ordering() {
    let first = one_way("JFK", "IST", "2026-09-10")
        .combine(&one_way("CDG", "MAD", "2026-09-15"))
        .expect("chain");
    let second = one_way("VIE", "OSL", "2026-09-20")
        .combine(&one_way("ARN", "HEL", "2026-09-25"))
        .expect("chain");
    let folded = first.combine(&second).expect("fold");
    assert_eq!(folded.topology(), Topology::ChainTrip);
    assert_eq!(folded.legs().len(), 4);

    // A date collision across the seam is rejected.
    let overlapping = second.combine(&first);
    assert!(matches!(
        overlapping,
        Err(StructuralError::DatesOutOfOrder { .. })
    ));
}

#[test]
fn test_query_combination_unions_results() {
    let mut a = TripQuery::new(one_way("JFK", "LHR", "2026-09-10")).expect("query");
    let mut b = TripQuery::new(one_way("LHR", "JFK", "2026-09-20")).expect("query");
    a.attach_results(offers(2)).expect("attach");
    b.attach_results(offers(3)).expect("attach");

    let combined = a.combine(&b).expect("combine");
    assert_eq!(combined.spec().topology(), Topology::RoundTrip);
    assert_eq!(combined.results().expect("results").len(), 5);
}

#[test]
fn test_query_combination_rejects_mixed_result_states() {
    let mut a = TripQuery::new(one_way("JFK", "LHR", "2026-09-10")).expect("query");
    let b = TripQuery::new(one_way("LHR", "JFK", "2026-09-20")).expect("query");
    a.attach_results(offers(1)).expect("attach");

    let err = a.combine(&b);
    assert!(err.is_err(), "one queried, one fresh must not combine");

    // Two fresh queries combine into a fresh query.
    let fresh_a = TripQuery::new(one_way("JFK", "LHR", "2026-09-10")).expect("query");
    let fresh_b = TripQuery::new(one_way("LHR", "JFK", "2026-09-20")).expect("query");
    let combined = fresh_a.combine(&fresh_b).expect("combine");
    assert!(combined.results().is_none());
}

#[test]
fn test_combined_query_reencodes_urls() {
    let a = TripQuery::new(one_way("JFK", "LHR", "2026-09-10")).expect("query");
    let b = TripQuery::new(one_way("LHR", "JFK", "2026-09-20")).expect("query");
    let combined = a.combine(&b).expect("combine");
    // Round-trip: one plain URL per leg, outbound first.
    assert_eq!(combined.urls().len(), 2);
    assert!(combined.urls()[0].contains("2026-09-10"));
    assert!(combined.urls()[1].contains("2026-09-20"));
}
