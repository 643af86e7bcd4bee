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

//! # Trip Queries and Combination
//!
//! [`TripQuery`] binds a classified [`TripSpec`] to its encoded request URLs
//! and, after fetching, to its results. Combination composes two specs of
//! matching topology into a larger one; operands are never mutated.

use std::fmt;

use anyhow::Result;

use crate::explore_parser::ExploreTable;
use crate::query_builder::{build_urls, build_urls_with, PayloadOptions};
use crate::results_parser::OfferTable;
use crate::trip_spec::{ChainLeg, StructuralError, TripArg, TripSpec};

/// Results attached to one query: per-offer rows, or aggregated city rows
/// for explore-mode searches.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryResults {
    Offers(OfferTable),
    Explore(ExploreTable),
}

impl QueryResults {
    pub fn len(&self) -> usize {
        match self {
            QueryResults::Offers(t) => t.len(),
            QueryResults::Explore(t) => t.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Row-wise union, order preserved, no deduplication. Offer and explore
    /// tables do not mix.
    fn union(&self, other: &Self) -> Result<Self, StructuralError> {
        match (self, other) {
            (QueryResults::Offers(a), QueryResults::Offers(b)) => {
                let mut table = a.clone();
                table.extend(b);
                Ok(QueryResults::Offers(table))
            }
            (QueryResults::Explore(a), QueryResults::Explore(b)) => {
                let mut table = a.clone();
                table.extend(b);
                Ok(QueryResults::Explore(table))
            }
            _ => Err(StructuralError::ResultStateMismatch),
        }
    }
}

impl TripSpec {
    /// Compose two specs of matching topology into a larger one:
    ///
    /// - one-way + one-way: exact reversal makes a round-trip; telescoping
    ///   endpoints make a perfect-chain; anything else chains.
    /// - round-trip + round-trip: same starting origin makes a
    ///   perfect-chain, else a chain; the first return must precede the
    ///   second outbound.
    /// - chain + chain and perfect + perfect fold into a longer structure
    ///   of the same kind under the date-ordering invariant.
    pub fn combine(&self, other: &TripSpec) -> Result<TripSpec, StructuralError> {
        match (self, other) {
            (
                TripSpec::OneWay {
                    origins: o1,
                    dests: d1,
                    date: dt1,
                    ..
                },
                TripSpec::OneWay {
                    origins: o2,
                    dests: d2,
                    date: dt2,
                    ..
                },
            ) => {
                if o1 == d2 && d1 == o2 {
                    return TripSpec::round_trip(o1[0].clone(), d1[0].clone(), *dt1, *dt2);
                }
                let single = o1.len() == 1 && d1.len() == 1 && o2.len() == 1 && d2.len() == 1;
                if single && d1[0] == o2[0] {
                    return TripSpec::perfect_chain(
                        vec![(o1[0].clone(), *dt1), (o2[0].clone(), *dt2)],
                        d2[0].clone(),
                    );
                }
                TripSpec::chain(vec![
                    ChainLeg {
                        origin: o1[0].clone(),
                        dest: d1[0].clone(),
                        date: *dt1,
                    },
                    ChainLeg {
                        origin: o2[0].clone(),
                        dest: d2[0].clone(),
                        date: *dt2,
                    },
                ])
            }

            (
                TripSpec::RoundTrip {
                    origin: a1,
                    dest: b1,
                    depart: d1,
                    ret: r1,
                },
                TripSpec::RoundTrip {
                    origin: a2,
                    dest: b2,
                    depart: d2,
                    ret: r2,
                },
            ) => {
                if r1 >= d2 {
                    return Err(StructuralError::DatesOutOfOrder {
                        prev: *r1,
                        next: *d2,
                    });
                }
                if a1 == a2 {
                    return TripSpec::perfect_chain(
                        vec![
                            (a1.clone(), *d1),
                            (b1.clone(), *r1),
                            (a2.clone(), *d2),
                            (b2.clone(), *r2),
                        ],
                        a2.clone(),
                    );
                }
                let legs = [self, other]
                    .iter()
                    .flat_map(|spec| spec.legs())
                    .map(|leg| ChainLeg {
                        origin: leg.origins[0].clone(),
                        dest: leg.dests[0].clone(),
                        date: leg.date,
                    })
                    .collect();
                TripSpec::chain(legs)
            }

            (TripSpec::ChainTrip { legs: l1 }, TripSpec::ChainTrip { legs: l2 }) => {
                let mut legs = l1.clone();
                legs.extend(l2.iter().cloned());
                TripSpec::chain(legs)
            }

            (
                TripSpec::PerfectChain {
                    cities: c1,
                    final_dest: _,
                },
                TripSpec::PerfectChain {
                    cities: c2,
                    final_dest: f2,
                },
            ) => {
                if c1[0].0 == c2[0].0 {
                    let mut cities = c1.clone();
                    cities.extend(c2.iter().cloned());
                    return TripSpec::perfect_chain(cities, f2.clone());
                }
                let legs = [self, other]
                    .iter()
                    .flat_map(|spec| spec.legs())
                    .map(|leg| ChainLeg {
                        origin: leg.origins[0].clone(),
                        dest: leg.dests[0].clone(),
                        date: leg.date,
                    })
                    .collect();
                TripSpec::chain(legs)
            }

            _ => Err(StructuralError::TopologyMismatch {
                left: self.topology(),
                right: other.topology(),
            }),
        }
    }
}

/// A classified trip bound to its request URLs, one per leg (explore-style
/// one-ways collapse to a single payload URL). Results attach once; after
/// that the query is frozen.
#[derive(Debug, Clone)]
pub struct TripQuery {
    spec: TripSpec,
    urls: Vec<String>,
    results: Option<QueryResults>,
}

impl TripQuery {
    /// Bind a spec to its request URLs. Encoding runs eagerly so malformed
    /// queries surface at construction.
    pub fn new(spec: TripSpec) -> Result<Self> {
        let urls = build_urls(&spec)?;
        Ok(Self {
            spec,
            urls,
            results: None,
        })
    }

    /// [`TripQuery::new`] with explicit payload knobs (cabin, passengers,
    /// max stops). Plain per-leg URLs are unaffected.
    pub fn with_options(spec: TripSpec, options: &PayloadOptions) -> Result<Self> {
        let urls = build_urls_with(&spec, options)?;
        Ok(Self {
            spec,
            urls,
            results: None,
        })
    }

    /// Classify positional arguments and bind the result.
    pub fn classify(args: &[TripArg]) -> Result<Self> {
        Ok(Self::new(TripSpec::classify(args)?)?)
    }

    pub fn spec(&self) -> &TripSpec {
        &self.spec
    }

    pub fn urls(&self) -> &[String] {
        &self.urls
    }

    pub fn results(&self) -> Option<&QueryResults> {
        self.results.as_ref()
    }

    /// Attach results, freezing the query. A second attachment is rejected.
    pub fn attach_results(&mut self, results: QueryResults) -> Result<(), StructuralError> {
        if self.results.is_some() {
            return Err(StructuralError::AlreadyQueried);
        }
        self.results = Some(results);
        Ok(())
    }

    /// Combine with another query of matching topology. Both operands must
    /// either be unused or carry results; in the latter case the combined
    /// query carries their row-wise union.
    pub fn combine(&self, other: &TripQuery) -> Result<TripQuery> {
        if self.results.is_some() != other.results.is_some() {
            return Err(StructuralError::ResultStateMismatch.into());
        }
        let spec = self.spec.combine(&other.spec)?;
        let mut combined = TripQuery::new(spec)?;
        if let (Some(a), Some(b)) = (&self.results, &other.results) {
            combined.results = Some(a.union(b)?);
        }
        Ok(combined)
    }
}

impl fmt::Display for TripQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.results {
            None => writeln!(f, "TripQuery( {{Query Not Yet Used}}")?,
            Some(results) => writeln!(f, "TripQuery( {} RESULTS FOR:", results.len())?,
        }
        write!(f, "{}", self.spec)?;
        write!(f, ")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trip_spec::Topology;
    use chrono::NaiveDate;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn one_way(org: &str, dest: &str, date: &str) -> TripSpec {
        TripSpec::one_way(vec![org.into()], vec![dest.into()], d(date)).unwrap()
    }

    #[test]
    fn reversed_one_ways_merge_into_round_trip() {
        let out = one_way("JFK", "LHR", "2026-09-10");
        let back = one_way("LHR", "JFK", "2026-09-20");
        let combined = out.combine(&back).unwrap();
        assert_eq!(
            combined,
            TripSpec::round_trip("JFK".into(), "LHR".into(), d("2026-09-10"), d("2026-09-20"))
                .unwrap()
        );
    }

    #[test]
    fn telescoping_one_ways_form_perfect_chain() {
        let first = one_way("JFK", "IST", "2026-09-10");
        let second = one_way("IST", "CDG", "2026-09-15");
        let combined = first.combine(&second).unwrap();
        assert_eq!(combined.topology(), Topology::PerfectChain);
        let legs = combined.legs();
        assert_eq!(legs[0].dests, vec!["IST"]);
        assert_eq!(legs[1].dests, vec!["CDG"]);
    }

    #[test]
    fn unrelated_one_ways_chain() {
        let first = one_way("JFK", "IST", "2026-09-10");
        let second = one_way("CDG", "MAD", "2026-09-15");
        let combined = first.combine(&second).unwrap();
        assert_eq!(combined.topology(), Topology::ChainTrip);
    }

    #[test]
    fn round_trips_with_shared_origin_form_perfect_chain() {
        let first = TripSpec::round_trip(
            "JFK".into(),
            "IST".into(),
            d("2026-09-01"),
            d("2026-09-05"),
        )
        .unwrap();
        let second = TripSpec::round_trip(
            "JFK".into(),
            "CDG".into(),
            d("2026-09-10"),
            d("2026-09-15"),
        )
        .unwrap();
        let combined = first.combine(&second).unwrap();
        assert_eq!(combined.topology(), Topology::PerfectChain);
        assert_eq!(combined.legs().len(), 4);
    }

    #[test]
    fn round_trip_combination_requires_date_gap() {
        let first = TripSpec::round_trip(
            "JFK".into(),
            "IST".into(),
            d("2026-09-01"),
            d("2026-09-12"),
        )
        .unwrap();
        let second = TripSpec::round_trip(
            "JFK".into(),
            "CDG".into(),
            d("2026-09-10"),
            d("2026-09-15"),
        )
        .unwrap();
        let err = first.combine(&second);
        assert!(matches!(err, Err(StructuralError::DatesOutOfOrder { .. })));
    }

    #[test]
    fn mixed_topologies_are_rejected() {
        let first = one_way("JFK", "IST", "2026-09-10");
        let second = TripSpec::round_trip(
            "JFK".into(),
            "CDG".into(),
            d("2026-09-12"),
            d("2026-09-15"),
        )
        .unwrap();
        let err = first.combine(&second);
        assert!(matches!(err, Err(StructuralError::TopologyMismatch { .. })));
    }

    #[test]
    fn attach_results_freezes_query() {
        let mut query = TripQuery::new(one_way("JFK", "LHR", "2026-09-10")).unwrap();
        query
            .attach_results(QueryResults::Offers(OfferTable::default()))
            .unwrap();
        let err = query.attach_results(QueryResults::Offers(OfferTable::default()));
        assert!(matches!(err, Err(StructuralError::AlreadyQueried)));
    }
}
