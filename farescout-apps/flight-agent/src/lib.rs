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

// Library for farescout-flight-agent
// Airfare discovery: trip classification, query encoding, results parsing

mod explore_parser;
mod query_builder;
mod query_proto;
mod results_parser;
mod search;
mod trip_combine;
mod trip_spec;

// Re-export the trip model
pub use trip_spec::{
    is_airport_code, ChainLeg, Leg, StructuralError, Topology, TripArg, TripSpec,
};

// Re-export query encoding
pub use query_builder::{
    build_urls, build_urls_with, plain_search_url, uses_payload, PayloadOptions, TfsLeg, TfsQuery,
    TfsQueryBuilder, DEFAULT_EXPLORE_MAX_STOPS, FLIGHTS_BASE_URL,
};
pub use query_proto::{LocationKind, Passenger, Seat, Trip};

// Re-export results parsing
pub use results_parser::{
    parse_results, parse_results_at, split_offer_groups, Offer, OfferTable, SectionMarkers,
    TokenGroup,
};

pub use explore_parser::{ExploreRow, ExploreTable};

// Re-export queries and the search client
pub use search::{
    visible_text_lines, BatchConfig, BatchReport, FlightSearchClient, HttpRenderer, RenderError,
    Renderer,
};
pub use trip_combine::{QueryResults, TripQuery};
