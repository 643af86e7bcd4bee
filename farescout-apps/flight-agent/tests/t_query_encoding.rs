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

//! Request encoding tests: plain templated URLs and the base64 protobuf
//! `tfs` payload.
//!
//! Run with:
//!     cargo test --test t_query_encoding

use base64::Engine;
use chrono::NaiveDate;
use farescout_flight_agent::{
    build_urls, plain_search_url, uses_payload, Passenger, Seat, TfsLeg, TfsQuery, Trip, TripSpec,
};

fn d(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").expect("test date")
}

fn leg(origins: &[&str], dests: &[&str], date: &str) -> TfsLeg {
    TfsLeg {
        date: d(date),
        origins: origins.iter().map(|s| s.to_string()).collect(),
        dests: dests.iter().map(|s| s.to_string()).collect(),
    }
}

#[test]
fn test_plain_url_template() {
    let url = plain_search_url("JFK", "LHR", d("2026-09-10"));
    assert_eq!(
        url,
        "https://www.google.com/travel/flights?hl=en&curr=EUR&q=Flights%20to%20LHR%20from%20JFK%20on%202026-09-10%20oneway"
    );
}

#[test]
fn test_round_trip_emits_one_plain_url_per_leg() {
    let spec = TripSpec::round_trip("JFK".into(), "LHR".into(), d("2026-09-10"), d("2026-09-20"))
        .expect("spec");
    assert!(!uses_payload(&spec));
    let urls = build_urls(&spec).expect("urls");
    assert_eq!(urls.len(), 2);
    assert!(urls[0].contains("to%20LHR%20from%20JFK%20on%202026-09-10"));
    assert!(urls[1].contains("to%20JFK%20from%20LHR%20on%202026-09-20"));
}

#[test]
fn test_multi_endpoint_one_way_collapses_to_payload() {
    let spec = TripSpec::one_way(
        vec!["JFK".into(), "EWR".into()],
        vec!["LHR".into()],
        d("2026-09-10"),
    )
    .expect("spec");
    assert!(uses_payload(&spec));
    let urls = build_urls(&spec).expect("urls");
    assert_eq!(urls.len(), 1);
    assert!(urls[0].contains("tfs="));
}

#[test]
fn test_basic_encoding_starts_with_leg_data_tag() {
    let query = TfsQuery::builder(vec![leg(&["LAX"], &["ORD"], "2026-08-01")])
        .build()
        .expect("build");
    let tfs = query.encode().expect("encode");
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(&tfs)
        .expect("decode base64");
    assert!(!bytes.is_empty(), "should produce bytes");
    assert!(bytes[0] == 0x1a, "should start with leg data tag");
    println!("Basic encoding: {} bytes - OK", bytes.len());
}

#[test]
fn test_all_cabins_encode() {
    for cabin in [
        Seat::Economy,
        Seat::PremiumEconomy,
        Seat::Business,
        Seat::First,
    ] {
        let query = TfsQuery::builder(vec![leg(&["LAX"], &["ORD"], "2026-08-01")])
            .cabin(cabin)
            .build()
            .expect("build");
        let tfs = query.encode().expect("encode");
        let decoded = TfsQuery::decode(&tfs).expect("decode");
        assert_eq!(decoded.cabin, cabin);
        println!("{:?} -> {} chars", cabin, tfs.len());
    }
}

#[test]
fn test_multi_leg_explore_payload_roundtrip() {
    let query = TfsQuery::builder(vec![
        leg(&["JFK", "EWR"], &["London"], "2026-09-10"),
        leg(&["London"], &["Tokyo"], "2026-09-20"),
    ])
    .trip_type(Trip::MultiCity)
    .passengers(vec![(Passenger::Adult, 2), (Passenger::Child, 1)])
    .max_stops(Some(2))
    .build()
    .expect("build");

    let decoded = TfsQuery::decode(&query.encode().expect("encode")).expect("decode");
    assert_eq!(decoded.legs, query.legs);
    assert_eq!(decoded.trip_type, Trip::MultiCity);
    assert_eq!(decoded.passengers, query.passengers);
    assert_eq!(decoded.max_stops, Some(2));
}

#[test]
fn test_zero_max_stops_means_no_filter() {
    let query = TfsQuery::builder(vec![leg(&["LAX"], &["ORD"], "2026-08-01")])
        .max_stops(Some(0))
        .build()
        .expect("build");
    let decoded = TfsQuery::decode(&query.encode().expect("encode")).expect("decode");
    assert_eq!(decoded.max_stops, None, "zero must drop the filter field");
}

#[test]
fn test_passenger_validation() {
    // No adults.
    let err = TfsQuery::builder(vec![leg(&["LAX"], &["ORD"], "2026-08-01")])
        .passengers(vec![(Passenger::Child, 2)])
        .build();
    assert!(err.is_err(), "at least one adult required");

    // More lap infants than adults.
    let err = TfsQuery::builder(vec![leg(&["LAX"], &["ORD"], "2026-08-01")])
        .passengers(vec![(Passenger::Adult, 1), (Passenger::InfantOnLap, 2)])
        .build();
    assert!(err.is_err(), "lap infants capped at adult count");

    // One infant per adult is fine.
    let ok = TfsQuery::builder(vec![leg(&["LAX"], &["ORD"], "2026-08-01")])
        .passengers(vec![(Passenger::Adult, 2), (Passenger::InfantOnLap, 2)])
        .build();
    assert!(ok.is_ok());
}

#[test]
fn test_empty_legs_are_rejected() {
    assert!(TfsQuery::builder(vec![]).build().is_err());
    let err = TfsQuery::builder(vec![TfsLeg {
        date: d("2026-08-01"),
        origins: vec![],
        dests: vec!["ORD".into()],
    }])
    .build();
    assert!(err.is_err(), "empty origin list rejected");
}
