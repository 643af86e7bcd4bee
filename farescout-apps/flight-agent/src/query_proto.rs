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

//! # Query Payload Messages
//!
//! Protobuf messages backing the binary `tfs` URL parameter. The schema is
//! externally owned and undocumented; field numbers here reproduce what the
//! service accepts and are not bit-exact guarantees.

/// One endpoint of a leg, tagged with its location kind.
#[derive(Clone, PartialEq, prost::Message)]
pub struct Location {
    #[prost(enumeration = "LocationKind", tag = "1")]
    pub kind: i32,
    #[prost(string, tag = "2")]
    pub code: String,
}

/// One leg descriptor: date plus typed origin/destination lists.
#[derive(Clone, PartialEq, prost::Message)]
pub struct LegData {
    #[prost(string, tag = "2")]
    pub date: String,
    #[prost(int32, optional, tag = "5")]
    pub max_stops: Option<i32>,
    #[prost(message, repeated, tag = "13")]
    pub from_location: Vec<Location>,
    #[prost(message, repeated, tag = "14")]
    pub to_location: Vec<Location>,
}

/// Top-level search filter: legs, passenger composition, cabin, trip type.
#[derive(Clone, PartialEq, prost::Message)]
pub struct Info {
    #[prost(message, repeated, tag = "3")]
    pub data: Vec<LegData>,
    #[prost(enumeration = "Passenger", repeated, tag = "8")]
    pub passengers: Vec<i32>,
    #[prost(enumeration = "Seat", optional, tag = "9")]
    pub seat: Option<i32>,
    #[prost(enumeration = "Trip", optional, tag = "19")]
    pub trip: Option<i32>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, prost::Enumeration)]
#[repr(i32)]
pub enum Seat {
    UnspecifiedSeat = 0,
    Economy = 1,
    PremiumEconomy = 2,
    Business = 3,
    First = 4,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, prost::Enumeration)]
#[repr(i32)]
pub enum Trip {
    UnspecifiedTrip = 0,
    RoundTrip = 1,
    OneWay = 2,
    MultiCity = 3,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, prost::Enumeration)]
#[repr(i32)]
pub enum Passenger {
    UnspecifiedPassenger = 0,
    Adult = 1,
    Child = 2,
    InfantInSeat = 3,
    InfantOnLap = 4,
}

/// Location kind discriminant. The mapping from code shape to kind is
/// implementation-defined but internally consistent: 3 uppercase letters are
/// airports, 2 are countries, anything else is a city name.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, prost::Enumeration)]
#[repr(i32)]
pub enum LocationKind {
    UnspecifiedLocation = 0,
    Airport = 1,
    City = 2,
    Country = 3,
}

impl LocationKind {
    pub fn of(code: &str) -> Self {
        let upper = code.chars().all(|c| c.is_ascii_uppercase());
        match (code.chars().count(), upper) {
            (3, true) => LocationKind::Airport,
            (2, true) => LocationKind::Country,
            _ => LocationKind::City,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn location_kinds_by_code_shape() {
        assert_eq!(LocationKind::of("JFK"), LocationKind::Airport);
        assert_eq!(LocationKind::of("FR"), LocationKind::Country);
        assert_eq!(LocationKind::of("London"), LocationKind::City);
        assert_eq!(LocationKind::of("par"), LocationKind::City);
    }
}
