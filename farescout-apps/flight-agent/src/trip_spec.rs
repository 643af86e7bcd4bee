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

//! # Trip Model
//!
//! Trip topology classification and validated construction. A positional
//! argument sequence is assigned to exactly one of four topologies by shape;
//! each topology also has a direct constructor enforcing the same invariants.

use std::fmt;

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

static IATA_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Z]{3}$").unwrap());

/// Whether a location code is a plain 3-letter airport code.
pub fn is_airport_code(code: &str) -> bool {
    IATA_RE.is_match(code)
}

/// Structural problems in a trip description. Fatal to the construction or
/// combination call that raised them; sibling queries are unaffected.
#[derive(Debug, Error)]
pub enum StructuralError {
    #[error("unrecognized trip shape with {0} argument(s), see docs")]
    UnrecognizedShape(usize),
    #[error("argument {index} is not {expected}")]
    UnexpectedArgument { index: usize, expected: &'static str },
    #[error("dates are not in order ({prev} >= {next}); provide them in increasing YYYY-MM-DD order")]
    DatesOutOfOrder { prev: NaiveDate, next: NaiveDate },
    #[error("non-airport code {code:?}: only one-way searches support city or country locations")]
    ExploreUnsupported { code: String },
    #[error("empty location code list")]
    EmptyEndpoint,
    #[error("a {0} trip needs at least {1} legs")]
    TooFewLegs(Topology, usize),
    #[error("cannot combine a {left} trip with a {right} trip")]
    TopologyMismatch { left: Topology, right: Topology },
    #[error("both queries must either be unused or carry results")]
    ResultStateMismatch,
    #[error("query already carries results and can no longer change")]
    AlreadyQueried,
}

/// Trip topology tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Topology {
    OneWay,
    RoundTrip,
    ChainTrip,
    PerfectChain,
}

impl fmt::Display for Topology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Topology::OneWay => "one-way",
            Topology::RoundTrip => "round-trip",
            Topology::ChainTrip => "chain-trip",
            Topology::PerfectChain => "perfect-chain",
        };
        f.write_str(label)
    }
}

/// One positional argument of a trip description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TripArg {
    /// A single location code ("JFK", "par").
    Code(String),
    /// Several alternative locations for one endpoint ("JFK"/"EWR", cities).
    Codes(Vec<String>),
    /// A travel date.
    Date(NaiveDate),
}

impl TripArg {
    /// Interpret a raw string: `YYYY-MM-DD` becomes a date, anything else a
    /// location code.
    pub fn parse(raw: &str) -> Self {
        match NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
            Ok(d) => TripArg::Date(d),
            Err(_) => TripArg::Code(raw.to_string()),
        }
    }
}

impl From<&str> for TripArg {
    fn from(raw: &str) -> Self {
        TripArg::parse(raw)
    }
}

/// One leg of a chain trip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainLeg {
    pub origin: String,
    pub dest: String,
    pub date: NaiveDate,
}

/// Materialized view of one directional search unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Leg {
    pub origins: Vec<String>,
    pub dests: Vec<String>,
    pub date: NaiveDate,
}

/// A requested itinerary, one variant per topology.
///
/// A perfect chain stores only the origin sequence plus the final
/// destination; the per-leg destinations are implicit (each leg arrives at
/// the next leg's origin) and materialized by [`TripSpec::legs`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TripSpec {
    OneWay {
        origins: Vec<String>,
        dests: Vec<String>,
        date: NaiveDate,
        /// Any destination is a city or country rather than an airport.
        explore: bool,
    },
    RoundTrip {
        origin: String,
        dest: String,
        depart: NaiveDate,
        ret: NaiveDate,
    },
    ChainTrip {
        legs: Vec<ChainLeg>,
    },
    PerfectChain {
        cities: Vec<(String, NaiveDate)>,
        final_dest: String,
    },
}

impl TripSpec {
    /// One-way trip. Endpoints may list several locations and may be cities
    /// or countries; this is the only topology that supports explore mode.
    pub fn one_way(
        origins: Vec<String>,
        dests: Vec<String>,
        date: NaiveDate,
    ) -> Result<Self, StructuralError> {
        if origins.is_empty() || dests.is_empty() {
            return Err(StructuralError::EmptyEndpoint);
        }
        if origins.iter().chain(dests.iter()).any(|c| c.is_empty()) {
            return Err(StructuralError::EmptyEndpoint);
        }
        let explore = dests.iter().any(|c| !is_airport_code(c));
        Ok(TripSpec::OneWay {
            origins,
            dests,
            date,
            explore,
        })
    }

    /// Round trip: two legs with swapped endpoints, return strictly after
    /// departure. Airport codes only.
    pub fn round_trip(
        origin: String,
        dest: String,
        depart: NaiveDate,
        ret: NaiveDate,
    ) -> Result<Self, StructuralError> {
        expect_airport_str(&origin)?;
        expect_airport_str(&dest)?;
        ensure_increasing([depart, ret].into_iter())?;
        Ok(TripSpec::RoundTrip {
            origin,
            dest,
            depart,
            ret,
        })
    }

    /// Chain trip: explicit (origin, destination, date) legs with strictly
    /// increasing dates. Airport codes only.
    pub fn chain(legs: Vec<ChainLeg>) -> Result<Self, StructuralError> {
        if legs.is_empty() {
            return Err(StructuralError::TooFewLegs(Topology::ChainTrip, 1));
        }
        for leg in &legs {
            expect_airport_str(&leg.origin)?;
            expect_airport_str(&leg.dest)?;
        }
        ensure_increasing(legs.iter().map(|l| l.date))?;
        Ok(TripSpec::ChainTrip { legs })
    }

    /// Perfect chain: city `i` departs leg `i` and every leg arrives at the
    /// next leg's origin, closing at `final_dest`. Airport codes only.
    pub fn perfect_chain(
        cities: Vec<(String, NaiveDate)>,
        final_dest: String,
    ) -> Result<Self, StructuralError> {
        if cities.len() < 2 {
            return Err(StructuralError::TooFewLegs(Topology::PerfectChain, 2));
        }
        for (code, _) in &cities {
            expect_airport_str(code)?;
        }
        expect_airport_str(&final_dest)?;
        ensure_increasing(cities.iter().map(|(_, d)| *d))?;
        Ok(TripSpec::PerfectChain { cities, final_dest })
    }

    /// Assign a positional argument sequence to exactly one topology by
    /// shape. Shapes:
    ///
    /// - `org, dest, date` — one-way (endpoints may be lists)
    /// - `org, dest, date_leave, date_return` — round-trip
    /// - `org, dest, date, org, dest, date, ...` — chain-trip
    /// - `org, date, org, date, ..., dest` — perfect-chain
    pub fn classify(args: &[TripArg]) -> Result<Self, StructuralError> {
        // One-way takes precedence over a single-leg chain.
        if args.len() == 3 {
            let origins = place_list(&args[0], 0)?;
            let dests = place_list(&args[1], 1)?;
            let date = expect_date(&args[2], 2)?;
            return Self::one_way(origins, dests, date);
        }

        if args.len() == 4 {
            let origin = expect_airport(&args[0], 0)?;
            let dest = expect_airport(&args[1], 1)?;
            let depart = expect_date(&args[2], 2)?;
            let ret = expect_date(&args[3], 3)?;
            return Self::round_trip(origin, dest, depart, ret);
        }

        // Chain-trip is triples; the trailing date disambiguates it from the
        // perfect-chain shape (a 9-argument call could otherwise be both).
        if args.len() >= 3
            && args.len() % 3 == 0
            && matches!(args.last(), Some(TripArg::Date(_)))
        {
            let mut legs = Vec::with_capacity(args.len() / 3);
            for (i, triple) in args.chunks_exact(3).enumerate() {
                legs.push(ChainLeg {
                    origin: expect_airport(&triple[0], 3 * i)?,
                    dest: expect_airport(&triple[1], 3 * i + 1)?,
                    date: expect_date(&triple[2], 3 * i + 2)?,
                });
            }
            return Self::chain(legs);
        }

        if args.len() >= 5
            && args.len() % 2 == 1
            && matches!(args.last(), Some(TripArg::Code(_)))
        {
            let mut cities = Vec::with_capacity(args.len() / 2);
            for (i, pair) in args[..args.len() - 1].chunks_exact(2).enumerate() {
                cities.push((
                    expect_airport(&pair[0], 2 * i)?,
                    expect_date(&pair[1], 2 * i + 1)?,
                ));
            }
            let final_dest = expect_airport(args.last().unwrap(), args.len() - 1)?;
            return Self::perfect_chain(cities, final_dest);
        }

        Err(StructuralError::UnrecognizedShape(args.len()))
    }

    pub fn topology(&self) -> Topology {
        match self {
            TripSpec::OneWay { .. } => Topology::OneWay,
            TripSpec::RoundTrip { .. } => Topology::RoundTrip,
            TripSpec::ChainTrip { .. } => Topology::ChainTrip,
            TripSpec::PerfectChain { .. } => Topology::PerfectChain,
        }
    }

    /// Whether results come back as aggregated city rows rather than
    /// individual flight offers.
    pub fn is_explore(&self) -> bool {
        matches!(self, TripSpec::OneWay { explore: true, .. })
    }

    /// Materialize the legs in travel order. For a perfect chain the
    /// destinations are derived from the origin sequence.
    pub fn legs(&self) -> Vec<Leg> {
        match self {
            TripSpec::OneWay {
                origins,
                dests,
                date,
                ..
            } => vec![Leg {
                origins: origins.clone(),
                dests: dests.clone(),
                date: *date,
            }],
            TripSpec::RoundTrip {
                origin,
                dest,
                depart,
                ret,
            } => vec![
                Leg {
                    origins: vec![origin.clone()],
                    dests: vec![dest.clone()],
                    date: *depart,
                },
                Leg {
                    origins: vec![dest.clone()],
                    dests: vec![origin.clone()],
                    date: *ret,
                },
            ],
            TripSpec::ChainTrip { legs } => legs
                .iter()
                .map(|l| Leg {
                    origins: vec![l.origin.clone()],
                    dests: vec![l.dest.clone()],
                    date: l.date,
                })
                .collect(),
            TripSpec::PerfectChain { cities, final_dest } => cities
                .iter()
                .enumerate()
                .map(|(i, (origin, date))| Leg {
                    origins: vec![origin.clone()],
                    dests: vec![cities
                        .get(i + 1)
                        .map(|(next, _)| next.clone())
                        .unwrap_or_else(|| final_dest.clone())],
                    date: *date,
                })
                .collect(),
        }
    }
}

impl fmt::Display for TripSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for leg in self.legs() {
            writeln!(
                f,
                "{}: {} --> {}",
                leg.date,
                leg.origins.join("/"),
                leg.dests.join("/")
            )?;
        }
        Ok(())
    }
}

fn ensure_increasing(dates: impl Iterator<Item = NaiveDate>) -> Result<(), StructuralError> {
    let mut prev: Option<NaiveDate> = None;
    for date in dates {
        if let Some(p) = prev {
            if p >= date {
                return Err(StructuralError::DatesOutOfOrder { prev: p, next: date });
            }
        }
        prev = Some(date);
    }
    Ok(())
}

fn expect_airport_str(code: &str) -> Result<(), StructuralError> {
    if is_airport_code(code) {
        Ok(())
    } else {
        Err(StructuralError::ExploreUnsupported {
            code: code.to_string(),
        })
    }
}

fn expect_airport(arg: &TripArg, index: usize) -> Result<String, StructuralError> {
    match arg {
        TripArg::Code(c) => {
            expect_airport_str(c)?;
            Ok(c.clone())
        }
        TripArg::Codes(_) => Err(StructuralError::UnexpectedArgument {
            index,
            expected: "a single airport code",
        }),
        TripArg::Date(_) => Err(StructuralError::UnexpectedArgument {
            index,
            expected: "an airport code",
        }),
    }
}

fn expect_date(arg: &TripArg, index: usize) -> Result<NaiveDate, StructuralError> {
    match arg {
        TripArg::Date(d) => Ok(*d),
        _ => Err(StructuralError::UnexpectedArgument {
            index,
            expected: "a YYYY-MM-DD date",
        }),
    }
}

fn place_list(arg: &TripArg, index: usize) -> Result<Vec<String>, StructuralError> {
    match arg {
        TripArg::Code(c) if c.chars().count() == 3 => Ok(vec![c.clone()]),
        TripArg::Code(_) => Err(StructuralError::UnexpectedArgument {
            index,
            expected: "a 3-letter code or a list of locations",
        }),
        TripArg::Codes(cs) if !cs.is_empty() => Ok(cs.clone()),
        TripArg::Codes(_) => Err(StructuralError::EmptyEndpoint),
        TripArg::Date(_) => Err(StructuralError::UnexpectedArgument {
            index,
            expected: "a location code",
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn args(raw: &[&str]) -> Vec<TripArg> {
        raw.iter().map(|s| TripArg::parse(s)).collect()
    }

    #[test]
    fn three_args_classify_as_one_way() {
        let spec = TripSpec::classify(&args(&["JFK", "LHR", "2026-09-10"])).unwrap();
        assert_eq!(spec.topology(), Topology::OneWay);
        assert!(!spec.is_explore());
        assert_eq!(spec.legs().len(), 1);
    }

    #[test]
    fn city_destination_sets_explore() {
        let spec = TripSpec::classify(&[
            TripArg::Code("JFK".into()),
            TripArg::Codes(vec!["London".into()]),
            TripArg::Date(d("2026-09-10")),
        ])
        .unwrap();
        assert!(spec.is_explore());
    }

    #[test]
    fn round_trip_derives_swapped_return_leg() {
        let spec =
            TripSpec::classify(&args(&["JFK", "LHR", "2026-09-10", "2026-09-20"])).unwrap();
        assert_eq!(spec.topology(), Topology::RoundTrip);
        let legs = spec.legs();
        assert_eq!(legs[0].origins, vec!["JFK"]);
        assert_eq!(legs[1].origins, vec!["LHR"]);
        assert_eq!(legs[1].dests, vec!["JFK"]);
    }

    #[test]
    fn round_trip_rejects_non_increasing_dates() {
        let err = TripSpec::classify(&args(&["JFK", "LHR", "2026-09-20", "2026-09-10"]));
        assert!(matches!(err, Err(StructuralError::DatesOutOfOrder { .. })));
    }

    #[test]
    fn chain_shape_needs_trailing_date() {
        let spec = TripSpec::classify(&args(&[
            "JFK", "LHR", "2026-09-10", "LHR", "CDG", "2026-09-15",
        ]))
        .unwrap();
        assert_eq!(spec.topology(), Topology::ChainTrip);
        assert_eq!(spec.legs().len(), 2);
    }

    #[test]
    fn perfect_chain_materializes_implicit_destinations() {
        let spec = TripSpec::classify(&args(&[
            "JFK", "2026-09-10", "IST", "2026-09-15", "CDG", "2026-09-20", "JFK",
        ]))
        .unwrap();
        assert_eq!(spec.topology(), Topology::PerfectChain);
        let legs = spec.legs();
        assert_eq!(legs.len(), 3);
        assert_eq!(legs[0].dests, vec!["IST"]);
        assert_eq!(legs[1].dests, vec!["CDG"]);
        assert_eq!(legs[2].dests, vec!["JFK"]);
    }

    #[test]
    fn explore_codes_rejected_outside_one_way() {
        let err = TripSpec::classify(&args(&["London", "LHR", "2026-09-10", "2026-09-20"]));
        assert!(matches!(err, Err(StructuralError::ExploreUnsupported { .. })));
    }

    #[test]
    fn garbage_shape_is_rejected() {
        let err = TripSpec::classify(&args(&["JFK", "LHR"]));
        assert!(matches!(err, Err(StructuralError::UnrecognizedShape(2))));
    }
}
