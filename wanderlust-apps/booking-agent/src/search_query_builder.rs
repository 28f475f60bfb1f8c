//!  Wanderlust Booking Agent
//!
//!  Copyright (C) 2026  Mamy Ratsimbazafy
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

//! # Search Query Builder
//!
//! Side-effect free construction of listing search filters from raw query parameters.
//! Dimensions combine with AND, multiple values inside one dimension combine with OR.

use std::cmp::Ordering;
use std::collections::BTreeSet;

use anyhow::{Result, ensure};
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::catalog::Listing;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "server", derive(schemars::JsonSchema))]
pub enum SortOption {
    #[default]
    #[serde(rename = "")]
    None,
    #[serde(rename = "starRating")]
    StarRating,
    #[serde(rename = "pricePerNightAsc")]
    PriceAsc,
    #[serde(rename = "pricePerNightDesc")]
    PriceDesc,
}

impl SortOption {
    /// Unrecognized values fall back to natural storage order
    pub fn from_str_name(s: &str) -> Self {
        match s.trim() {
            "starRating" => SortOption::StarRating,
            "pricePerNightAsc" => SortOption::PriceAsc,
            "pricePerNightDesc" => SortOption::PriceDesc,
            _ => SortOption::None,
        }
    }

    pub fn as_str_name(&self) -> &'static str {
        match self {
            SortOption::None => "",
            SortOption::StarRating => "starRating",
            SortOption::PriceAsc => "pricePerNightAsc",
            SortOption::PriceDesc => "pricePerNightDesc",
        }
    }

    /// Stable in-place ordering. Ascending price compares each listing's lowest
    /// price and descending compares its highest, as a document store orders
    /// on a nested array field.
    pub fn apply<L: Listing>(&self, listings: &mut [&L]) {
        match self {
            SortOption::None => {}
            SortOption::StarRating => listings.sort_by(|a, b| b.star_rating().cmp(&a.star_rating())),
            SortOption::PriceAsc => listings.sort_by(|a, b| cmp_prices(a.min_price(), b.min_price())),
            SortOption::PriceDesc => {
                listings.sort_by(|a, b| cmp_prices(b.max_price(), a.max_price()))
            }
        }
    }
}

// Listings without any price order before priced ones, as missing fields do.
fn cmp_prices(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.total_cmp(&b),
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_price: Option<f64>,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub star_ratings: BTreeSet<u8>,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub facilities: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub hotel_types: BTreeSet<String>,
    #[serde(default)]
    pub sort_option: SortOption,
}

impl SearchFilter {
    pub fn builder() -> SearchFilterBuilder {
        SearchFilterBuilder::default()
    }

    /// Destination-only filter, as issued by the booking assistant
    pub fn for_destination(destination: &str) -> Self {
        Self::builder().destination(destination).build()
    }

    /// Build a filter from raw `key=value` pairs.
    ///
    /// `stars`, `types` and `facilities` may repeat, with or without a `[]`
    /// suffix. Empty values, unparsable numbers and unknown keys impose no
    /// constraint. `page` is read separately by [`crate::PageRequest`].
    pub fn from_query_pairs<'a, I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut builder = Self::builder();
        for (key, value) in pairs {
            let value = value.trim();
            if value.is_empty() {
                continue;
            }
            match key.trim_end_matches("[]") {
                "destination" => builder = builder.destination(value),
                "minPrice" => builder = builder.min_price(value.parse().ok()),
                "maxPrice" => builder = builder.max_price(value.parse().ok()),
                "stars" => {
                    if let Ok(star) = value.parse::<u8>() {
                        builder = builder.star(star);
                    }
                }
                "types" => builder = builder.hotel_type(value),
                "facilities" => builder = builder.facility(value),
                "sortOption" => builder = builder.sort_option(SortOption::from_str_name(value)),
                _ => {}
            }
        }
        builder.build()
    }

    /// Inverse of [`SearchFilter::from_query_pairs`], used by HTTP clients
    pub fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(d) = &self.destination {
            pairs.push(("destination", d.clone()));
        }
        if let Some(p) = self.min_price {
            pairs.push(("minPrice", p.to_string()));
        }
        if let Some(p) = self.max_price {
            pairs.push(("maxPrice", p.to_string()));
        }
        pairs.extend(self.star_ratings.iter().map(|s| ("stars", s.to_string())));
        pairs.extend(self.hotel_types.iter().map(|t| ("types", t.clone())));
        pairs.extend(self.facilities.iter().map(|f| ("facilities", f.clone())));
        if self.sort_option != SortOption::None {
            pairs.push(("sortOption", self.sort_option.as_str_name().to_string()));
        }
        pairs
    }

    /// Sanity checks for user-facing entry points (CLI flags).
    /// The HTTP search endpoint never rejects a filter.
    pub fn validate(&self) -> Result<()> {
        if let Some(p) = self.min_price {
            ensure!(p >= 0.0, "Price must not be negative");
        }
        if let Some(p) = self.max_price {
            ensure!(p >= 0.0, "Price must not be negative");
        }
        if let (Some(min), Some(max)) = (self.min_price, self.max_price) {
            ensure!(
                min <= max,
                "Minimum price cannot be greater than maximum price"
            );
        }
        ensure!(
            self.star_ratings.iter().all(|s| (1..=5).contains(s)),
            "Star rating must be between 1 and 5"
        );
        Ok(())
    }

    /// Render the filter as a document-store query.
    ///
    /// `price_field` names the nested price array, `roomTypes.price` for hotels
    /// and `foodItems.price` for restaurants.
    pub fn to_document(&self, price_field: &str) -> serde_json::Value {
        let mut doc = serde_json::Map::new();
        doc.insert("isBlocked".into(), json!(false));
        if let Some(d) = &self.destination {
            let re = json!({ "$regex": regex::escape(d), "$options": "i" });
            doc.insert(
                "$or".into(),
                json!([{ "name": re }, { "city": re }, { "country": re }]),
            );
        }
        if !self.star_ratings.is_empty() {
            doc.insert("starRating".into(), json!({ "$in": self.star_ratings }));
        }
        if !self.hotel_types.is_empty() {
            doc.insert("type".into(), json!({ "$in": self.hotel_types }));
        }
        if !self.facilities.is_empty() {
            doc.insert("facilities".into(), json!({ "$in": self.facilities }));
        }
        let mut range = serde_json::Map::new();
        if let Some(p) = self.min_price {
            range.insert("$gte".into(), json!(p));
        }
        if let Some(p) = self.max_price {
            range.insert("$lte".into(), json!(p));
        }
        if !range.is_empty() {
            doc.insert(price_field.into(), serde_json::Value::Object(range));
        }
        serde_json::Value::Object(doc)
    }

    /// Sort order matching [`SearchFilter::to_document`]
    pub fn sort_document(&self, price_field: &str) -> Option<serde_json::Value> {
        match self.sort_option {
            SortOption::None => None,
            SortOption::StarRating => Some(json!({ "starRating": -1 })),
            SortOption::PriceAsc => Some(json!({ price_field: 1 })),
            SortOption::PriceDesc => Some(json!({ price_field: -1 })),
        }
    }

    /// Compile the filter into a predicate over listings.
    /// The `isBlocked = false` predicate is always part of it.
    pub fn matcher(&self) -> Result<ListingMatcher<'_>, regex::Error> {
        let destination = self
            .destination
            .as_deref()
            .map(|d| {
                RegexBuilder::new(&regex::escape(d))
                    .case_insensitive(true)
                    .build()
            })
            .transpose()?;
        Ok(ListingMatcher {
            filter: self,
            destination,
        })
    }
}

pub struct ListingMatcher<'a> {
    filter: &'a SearchFilter,
    destination: Option<Regex>,
}

impl ListingMatcher<'_> {
    pub fn matches<L: Listing>(&self, listing: &L) -> bool {
        !listing.is_blocked()
            && self.matches_destination(listing)
            && self.matches_price(listing)
            && self.matches_sets(listing)
    }

    fn matches_destination<L: Listing>(&self, listing: &L) -> bool {
        self.destination.as_ref().is_none_or(|re| {
            re.is_match(listing.name()) || re.is_match(listing.city()) || re.is_match(listing.country())
        })
    }

    fn matches_price<L: Listing>(&self, listing: &L) -> bool {
        let filter = self.filter;
        if filter.min_price.is_none() && filter.max_price.is_none() {
            return true;
        }
        let Some(price) = listing.min_price() else {
            return false;
        };
        filter.min_price.is_none_or(|min| price >= min)
            && filter.max_price.is_none_or(|max| price <= max)
    }

    fn matches_sets<L: Listing>(&self, listing: &L) -> bool {
        let filter = self.filter;
        (filter.star_ratings.is_empty() || filter.star_ratings.contains(&listing.star_rating()))
            && (filter.hotel_types.is_empty() || filter.hotel_types.contains(listing.kind()))
            && (filter.facilities.is_empty()
                || listing
                    .facilities()
                    .iter()
                    .any(|f| filter.facilities.contains(f)))
    }
}

#[derive(Clone, Default)]
pub struct SearchFilterBuilder {
    destination: Option<String>,
    min_price: Option<f64>,
    max_price: Option<f64>,
    star_ratings: BTreeSet<u8>,
    facilities: BTreeSet<String>,
    hotel_types: BTreeSet<String>,
    sort_option: SortOption,
}

impl SearchFilterBuilder {
    pub fn destination(mut self, destination: &str) -> Self {
        let destination = destination.trim();
        self.destination = (!destination.is_empty()).then(|| destination.to_string());
        self
    }

    pub fn min_price(mut self, price: Option<f64>) -> Self {
        self.min_price = price.filter(|p| p.is_finite());
        self
    }

    pub fn max_price(mut self, price: Option<f64>) -> Self {
        self.max_price = price.filter(|p| p.is_finite());
        self
    }

    pub fn star(mut self, star: u8) -> Self {
        self.star_ratings.insert(star);
        self
    }

    pub fn stars(mut self, stars: impl IntoIterator<Item = u8>) -> Self {
        self.star_ratings.extend(stars);
        self
    }

    pub fn facility(mut self, facility: &str) -> Self {
        self.facilities.insert(facility.to_string());
        self
    }

    pub fn facilities<S: Into<String>>(mut self, facilities: impl IntoIterator<Item = S>) -> Self {
        self.facilities.extend(facilities.into_iter().map(Into::into));
        self
    }

    pub fn hotel_type(mut self, kind: &str) -> Self {
        self.hotel_types.insert(kind.to_string());
        self
    }

    pub fn hotel_types<S: Into<String>>(mut self, kinds: impl IntoIterator<Item = S>) -> Self {
        self.hotel_types.extend(kinds.into_iter().map(Into::into));
        self
    }

    pub fn sort_option(mut self, sort: SortOption) -> Self {
        self.sort_option = sort;
        self
    }

    pub fn build(self) -> SearchFilter {
        SearchFilter {
            destination: self.destination,
            min_price: self.min_price,
            max_price: self.max_price,
            star_ratings: self.star_ratings,
            facilities: self.facilities,
            hotel_types: self.hotel_types,
            sort_option: self.sort_option,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_pairs_collect_repeated_values() {
        let filter = SearchFilter::from_query_pairs([
            ("destination", " goa "),
            ("stars", "4"),
            ("stars[]", "5"),
            ("stars", "five"),
            ("types", "Resort"),
            ("facilities", "Spa"),
            ("facilities", "Free WiFi"),
            ("maxPrice", "3000"),
            ("minPrice", ""),
            ("sortOption", "pricePerNightDesc"),
            ("page", "2"),
        ]);
        assert_eq!(filter.destination.as_deref(), Some("goa"));
        assert_eq!(filter.star_ratings, BTreeSet::from([4, 5]));
        assert_eq!(filter.hotel_types.len(), 1);
        assert_eq!(filter.facilities.len(), 2);
        assert_eq!(filter.min_price, None);
        assert_eq!(filter.max_price, Some(3000.0));
        assert_eq!(filter.sort_option, SortOption::PriceDesc);
    }

    #[test]
    fn unknown_sort_falls_back_to_storage_order() {
        assert_eq!(SortOption::from_str_name("name"), SortOption::None);
        assert_eq!(SortOption::from_str_name(""), SortOption::None);
        assert_eq!(
            SortOption::from_str_name("starRating"),
            SortOption::StarRating
        );
    }

    #[test]
    fn query_pairs_survive_a_client_hop() {
        let filter = SearchFilter::builder()
            .destination("Kochi")
            .stars([3, 4])
            .facility("Parking")
            .max_price(Some(2500.0))
            .sort_option(SortOption::StarRating)
            .build();
        let pairs = filter.to_query_pairs();
        let decoded =
            SearchFilter::from_query_pairs(pairs.iter().map(|(k, v)| (*k, v.as_str())));
        assert_eq!(decoded, filter);
    }

    #[test]
    fn validate_rejects_inverted_price_range() {
        let filter = SearchFilter::builder()
            .min_price(Some(500.0))
            .max_price(Some(100.0))
            .build();
        assert!(filter.validate().is_err());
        assert!(SearchFilter::default().validate().is_ok());
    }

    #[test]
    fn document_always_excludes_blocked_listings() {
        let doc = SearchFilter::default().to_document("roomTypes.price");
        assert_eq!(doc, json!({ "isBlocked": false }));

        let doc = SearchFilter::builder()
            .destination("Goa")
            .star(5)
            .min_price(Some(100.0))
            .build()
            .to_document("foodItems.price");
        assert_eq!(doc["isBlocked"], json!(false));
        assert_eq!(doc["starRating"], json!({ "$in": [5] }));
        assert_eq!(doc["foodItems.price"], json!({ "$gte": 100.0 }));
        assert_eq!(doc["$or"].as_array().map(Vec::len), Some(3));
    }

    #[test]
    fn destination_is_matched_literally() {
        let filter = SearchFilter::for_destination("a.b(");
        assert!(filter.matcher().is_ok());
    }
}
