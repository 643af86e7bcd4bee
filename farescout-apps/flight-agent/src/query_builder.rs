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

//! # Request Encoder
//!
//! Side-effect free URL construction for flight searches: one URL per leg,
//! either from the plain query-string template or, for explore-style
//! queries, with the base64 protobuf `tfs` parameter.

use anyhow::{ensure, Context, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::NaiveDate;
use prost::Message;

use crate::query_proto::{Info, LegData, Location, LocationKind, Passenger, Seat, Trip};
use crate::trip_spec::{is_airport_code, TripSpec};

pub const FLIGHTS_BASE_URL: &str = "https://www.google.com/travel/flights";

/// Max stops attached to explore-style payloads unless the caller overrides.
pub const DEFAULT_EXPLORE_MAX_STOPS: i32 = 1;

/// Plain templated URL for a single leg.
pub fn plain_search_url(origin: &str, dest: &str, date: NaiveDate) -> String {
    format!(
        "{FLIGHTS_BASE_URL}?hl=en&curr=EUR&q=Flights%20to%20{dest}%20from%20{org}%20on%20{date}%20oneway",
        dest = urlencoding::encode(dest),
        org = urlencoding::encode(origin),
        date = date.format("%Y-%m-%d"),
    )
}

/// Whether a spec needs the binary payload: multi-location endpoints or any
/// non-airport code. Only one-way specs ever qualify; the other topologies
/// reject such codes at construction.
pub fn uses_payload(spec: &TripSpec) -> bool {
    match spec {
        TripSpec::OneWay { origins, dests, .. } => {
            origins.len() > 1
                || dests.len() > 1
                || origins
                    .iter()
                    .chain(dests.iter())
                    .any(|c| !is_airport_code(c))
        }
        _ => false,
    }
}

/// Knobs applied to payload-encoded (explore-style) queries. Plain per-leg
/// URLs carry none of these.
#[derive(Debug, Clone)]
pub struct PayloadOptions {
    pub cabin: Seat,
    pub passengers: Vec<(Passenger, u32)>,
    pub max_stops: Option<i32>,
}

impl Default for PayloadOptions {
    fn default() -> Self {
        Self {
            cabin: Seat::Economy,
            passengers: vec![(Passenger::Adult, 1)],
            max_stops: Some(DEFAULT_EXPLORE_MAX_STOPS),
        }
    }
}

/// Emit the request URLs for a spec, one per leg. Explore-style one-ways
/// collapse to a single `tfs=` URL.
pub fn build_urls(spec: &TripSpec) -> Result<Vec<String>> {
    build_urls_with(spec, &PayloadOptions::default())
}

/// [`build_urls`] with explicit payload knobs.
pub fn build_urls_with(spec: &TripSpec, options: &PayloadOptions) -> Result<Vec<String>> {
    if uses_payload(spec) {
        let leg = &spec.legs()[0];
        let query = TfsQuery::builder(vec![TfsLeg {
            date: leg.date,
            origins: leg.origins.clone(),
            dests: leg.dests.clone(),
        }])
        .cabin(options.cabin)
        .passengers(options.passengers.clone())
        .max_stops(options.max_stops)
        .build()?;
        Ok(vec![query.search_url()?])
    } else {
        Ok(spec
            .legs()
            .iter()
            .map(|leg| plain_search_url(&leg.origins[0], &leg.dests[0], leg.date))
            .collect())
    }
}

/// One leg of a binary-encoded search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TfsLeg {
    pub date: NaiveDate,
    pub origins: Vec<String>,
    pub dests: Vec<String>,
}

/// Parameters of a `tfs=` search: legs plus cabin, trip type, passenger
/// composition and an optional max-stop filter applied to every leg.
#[derive(Debug, Clone, PartialEq)]
pub struct TfsQuery {
    pub legs: Vec<TfsLeg>,
    pub trip_type: Trip,
    pub cabin: Seat,
    pub passengers: Vec<(Passenger, u32)>,
    pub max_stops: Option<i32>,
}

impl TfsQuery {
    pub fn builder(legs: Vec<TfsLeg>) -> TfsQueryBuilder {
        TfsQueryBuilder {
            legs,
            trip_type: Trip::OneWay,
            cabin: Seat::Economy,
            passengers: vec![(Passenger::Adult, 1)],
            max_stops: None,
        }
    }

    fn validate(&self) -> Result<()> {
        ensure!(!self.legs.is_empty(), "At least one leg is required");
        for leg in &self.legs {
            ensure!(!leg.origins.is_empty(), "Origin is required");
            ensure!(!leg.dests.is_empty(), "Destination is required");
        }

        let adults: u32 = self
            .passengers
            .iter()
            .filter(|(t, _)| *t == Passenger::Adult)
            .map(|(_, count)| count)
            .sum();
        let infants_on_lap: u32 = self
            .passengers
            .iter()
            .filter(|(t, _)| *t == Passenger::InfantOnLap)
            .map(|(_, count)| count)
            .sum();

        ensure!(adults > 0, "At least one adult is required");
        ensure!(
            infants_on_lap <= adults,
            "Cannot have more infants on lap ({}) than adults ({})",
            infants_on_lap,
            adults
        );
        Ok(())
    }

    /// Encode to the base64 `tfs` parameter value.
    pub fn encode(&self) -> Result<String> {
        self.validate()?;

        let data: Vec<LegData> = self
            .legs
            .iter()
            .map(|leg| LegData {
                date: leg.date.format("%Y-%m-%d").to_string(),
                max_stops: self.max_stops.filter(|&v| v != 0),
                from_location: leg.origins.iter().map(|c| typed_location(c)).collect(),
                to_location: leg.dests.iter().map(|c| typed_location(c)).collect(),
            })
            .collect();

        let passengers: Vec<i32> = self
            .passengers
            .iter()
            .flat_map(|(ptype, count)| std::iter::repeat(*ptype as i32).take(*count as usize))
            .collect();

        let info = Info {
            data,
            passengers,
            seat: Some(self.cabin as i32),
            trip: Some(self.trip_type as i32),
        };

        let mut bytes = Vec::new();
        info.encode(&mut bytes)
            .map_err(|e| anyhow::anyhow!("Failed to encode protobuf: {}", e))?;
        Ok(STANDARD.encode(&bytes))
    }

    /// Decode a base64 `tfs` parameter back into query parameters. Used for
    /// round-trip verification; unknown passenger/cabin codes fall back to
    /// their unspecified variants.
    pub fn decode(b64: &str) -> Result<Self> {
        let bytes = STANDARD.decode(b64).context("Invalid base64 payload")?;
        let info = Info::decode(bytes.as_slice()).context("Invalid protobuf payload")?;

        let mut legs = Vec::with_capacity(info.data.len());
        let mut max_stops = None;
        for leg in &info.data {
            let date = NaiveDate::parse_from_str(&leg.date, "%Y-%m-%d")
                .context(format!("Invalid leg date: {}", leg.date))?;
            max_stops = leg.max_stops.or(max_stops);
            legs.push(TfsLeg {
                date,
                origins: leg.from_location.iter().map(|l| l.code.clone()).collect(),
                dests: leg.to_location.iter().map(|l| l.code.clone()).collect(),
            });
        }

        let mut passengers: Vec<(Passenger, u32)> = Vec::new();
        for code in &info.passengers {
            let ptype = Passenger::try_from(*code).unwrap_or(Passenger::UnspecifiedPassenger);
            match passengers.last_mut() {
                Some((t, count)) if *t == ptype => *count += 1,
                _ => passengers.push((ptype, 1)),
            }
        }

        Ok(TfsQuery {
            legs,
            trip_type: info
                .trip
                .and_then(|t| Trip::try_from(t).ok())
                .unwrap_or(Trip::UnspecifiedTrip),
            cabin: info
                .seat
                .and_then(|s| Seat::try_from(s).ok())
                .unwrap_or(Seat::UnspecifiedSeat),
            passengers,
            max_stops,
        })
    }

    /// Full search URL carrying the encoded payload.
    pub fn search_url(&self) -> Result<String> {
        let tfs = self.encode()?;
        Ok(format!("{FLIGHTS_BASE_URL}?hl=en&curr=EUR&tfs={tfs}"))
    }
}

fn typed_location(code: &str) -> Location {
    Location {
        kind: LocationKind::of(code) as i32,
        code: code.to_string(),
    }
}

#[derive(Clone)]
pub struct TfsQueryBuilder {
    legs: Vec<TfsLeg>,
    trip_type: Trip,
    cabin: Seat,
    passengers: Vec<(Passenger, u32)>,
    max_stops: Option<i32>,
}

impl TfsQueryBuilder {
    pub fn cabin(mut self, cabin: Seat) -> Self {
        self.cabin = cabin;
        self
    }

    pub fn trip_type(mut self, trip_type: Trip) -> Self {
        self.trip_type = trip_type;
        self
    }

    pub fn passengers(mut self, passengers: Vec<(Passenger, u32)>) -> Self {
        self.passengers = passengers;
        self
    }

    pub fn max_stops(mut self, max_stops: Option<i32>) -> Self {
        self.max_stops = max_stops;
        self
    }

    pub fn build(self) -> Result<TfsQuery> {
        let query = TfsQuery {
            legs: self.legs,
            trip_type: self.trip_type,
            cabin: self.cabin,
            passengers: self.passengers,
            max_stops: self.max_stops,
        };
        query.validate()?;
        Ok(query)
    }
}
