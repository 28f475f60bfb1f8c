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

//! # Listing Catalog
//!
//! Hotel and restaurant listings, and the [`Catalog`] seam every search goes through.

use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;

use crate::pagination::{PageRequest, PageResult};
use crate::search_query_builder::SearchFilter;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("invalid destination pattern: {0}")]
    Pattern(#[from] regex::Error),
    #[error("catalog request failed: {0}")]
    Transport(#[from] wreq::Error),
    #[error("catalog server answered with status {0}")]
    Status(u16),
    #[error("could not read catalog file: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed catalog data: {0}")]
    Decode(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "server", derive(schemars::JsonSchema))]
#[serde(rename_all = "camelCase")]
pub struct RoomType {
    #[serde(rename = "type")]
    pub kind: String,
    pub price: f64,
    #[serde(default)]
    pub quantity: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "server", derive(schemars::JsonSchema))]
#[serde(rename_all = "camelCase")]
pub struct FoodItem {
    pub item: String,
    pub price: f64,
    #[serde(default)]
    pub quantity: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "server", derive(schemars::JsonSchema))]
#[serde(rename_all = "camelCase")]
pub struct OpeningHours {
    pub day: String,
    pub start_time: String,
    pub end_time: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "server", derive(schemars::JsonSchema))]
#[serde(rename_all = "camelCase")]
pub struct Hotel {
    #[serde(alias = "_id")]
    pub id: String,
    pub name: String,
    pub city: String,
    pub country: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    pub star_rating: u8,
    #[serde(default)]
    pub facilities: Vec<String>,
    #[serde(default)]
    pub image_urls: Vec<String>,
    #[serde(default)]
    pub room_types: Vec<RoomType>,
    #[serde(default)]
    pub is_blocked: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "server", derive(schemars::JsonSchema))]
#[serde(rename_all = "camelCase")]
pub struct Restaurant {
    #[serde(alias = "_id")]
    pub id: String,
    pub name: String,
    pub city: String,
    pub country: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    pub star_rating: u8,
    #[serde(default)]
    pub facilities: Vec<String>,
    #[serde(default)]
    pub image_urls: Vec<String>,
    #[serde(default)]
    pub food_items: Vec<FoodItem>,
    #[serde(default)]
    pub opening_hours: Vec<OpeningHours>,
    #[serde(default)]
    pub is_blocked: bool,
}

impl Hotel {
    pub fn room(&self, kind: &str) -> Option<&RoomType> {
        self.room_types.iter().find(|r| r.kind == kind)
    }
}

impl Restaurant {
    pub fn food_item(&self, item: &str) -> Option<&FoodItem> {
        self.food_items.iter().find(|f| f.item == item)
    }
}

/// What the search filter needs to know about a listing
pub trait Listing {
    fn id(&self) -> &str;
    fn name(&self) -> &str;
    fn city(&self) -> &str;
    fn country(&self) -> &str;
    fn kind(&self) -> &str;
    fn star_rating(&self) -> u8;
    fn facilities(&self) -> &[String];
    fn is_blocked(&self) -> bool;
    /// Entries of the nested price array
    fn prices(&self) -> impl Iterator<Item = f64> + '_;

    fn min_price(&self) -> Option<f64> {
        self.prices().reduce(f64::min)
    }

    fn max_price(&self) -> Option<f64> {
        self.prices().reduce(f64::max)
    }
}

macro_rules! impl_listing {
    ($ty:ty, $prices:ident) => {
        impl Listing for $ty {
            fn id(&self) -> &str {
                &self.id
            }
            fn name(&self) -> &str {
                &self.name
            }
            fn city(&self) -> &str {
                &self.city
            }
            fn country(&self) -> &str {
                &self.country
            }
            fn kind(&self) -> &str {
                &self.kind
            }
            fn star_rating(&self) -> u8 {
                self.star_rating
            }
            fn facilities(&self) -> &[String] {
                &self.facilities
            }
            fn is_blocked(&self) -> bool {
                self.is_blocked
            }
            fn prices(&self) -> impl Iterator<Item = f64> + '_ {
                self.$prices.iter().map(|p| p.price)
            }
        }
    };
}

impl_listing!(Hotel, room_types);
impl_listing!(Restaurant, food_items);

/// Read side of the listing collection.
///
/// Searches never return blocked listings and detail lookups treat a
/// blocked listing as absent.
#[async_trait]
pub trait Catalog: Send + Sync {
    async fn search_hotels(
        &self,
        filter: &SearchFilter,
        page: PageRequest,
    ) -> Result<PageResult<Hotel>, CatalogError>;

    async fn search_restaurants(
        &self,
        filter: &SearchFilter,
        page: PageRequest,
    ) -> Result<PageResult<Restaurant>, CatalogError>;

    async fn hotel(&self, id: &str) -> Result<Option<Hotel>, CatalogError>;

    async fn restaurant(&self, id: &str) -> Result<Option<Restaurant>, CatalogError>;
}

/// On-disk layout of a catalog file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogSnapshot {
    #[serde(default)]
    pub hotels: Vec<Hotel>,
    #[serde(default)]
    pub restaurants: Vec<Restaurant>,
}

#[derive(Debug, Default)]
pub struct InMemoryCatalog {
    hotels: RwLock<Vec<Hotel>>,
    restaurants: RwLock<Vec<Restaurant>>,
}

impl InMemoryCatalog {
    pub fn new(snapshot: CatalogSnapshot) -> Self {
        Self {
            hotels: RwLock::new(snapshot.hotels),
            restaurants: RwLock::new(snapshot.restaurants),
        }
    }

    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        Ok(Self::new(serde_json::from_str(json)?))
    }

    pub async fn load(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let raw = tokio::fs::read_to_string(path.as_ref()).await?;
        let catalog = Self::from_json(&raw)?;
        tracing::info!(
            "Loaded {} hotels and {} restaurants from {}",
            catalog.hotels.read().await.len(),
            catalog.restaurants.read().await.len(),
            path.as_ref().display()
        );
        Ok(catalog)
    }

    pub async fn add_hotel(&self, hotel: Hotel) {
        self.hotels.write().await.push(hotel);
    }

    pub async fn add_restaurant(&self, restaurant: Restaurant) {
        self.restaurants.write().await.push(restaurant);
    }

    /// Returns `false` when no hotel has this id
    pub async fn set_hotel_blocked(&self, id: &str, blocked: bool) -> bool {
        set_blocked(&mut self.hotels.write().await[..], id, blocked, |h| &mut h.is_blocked)
    }

    /// Returns `false` when no restaurant has this id
    pub async fn set_restaurant_blocked(&self, id: &str, blocked: bool) -> bool {
        set_blocked(&mut self.restaurants.write().await[..], id, blocked, |r| {
            &mut r.is_blocked
        })
    }
}

fn set_blocked<L: Listing>(
    listings: &mut [L],
    id: &str,
    blocked: bool,
    flag: impl Fn(&mut L) -> &mut bool,
) -> bool {
    match listings.iter_mut().find(|l| l.id() == id) {
        Some(listing) => {
            *flag(listing) = blocked;
            tracing::info!("Listing {} is now {}", id, if blocked { "blocked" } else { "unblocked" });
            true
        }
        None => false,
    }
}

fn window<L: Listing + Clone>(
    listings: &[L],
    filter: &SearchFilter,
    page: PageRequest,
) -> Result<Vec<L>, regex::Error> {
    let matcher = filter.matcher()?;
    let mut found: Vec<&L> = listings.iter().filter(|l| matcher.matches(*l)).collect();
    filter.sort_option.apply(&mut found);
    Ok(found
        .into_iter()
        .skip(page.skip())
        .take(page.limit())
        .cloned()
        .collect())
}

fn count<L: Listing>(listings: &[L], filter: &SearchFilter) -> Result<usize, regex::Error> {
    let matcher = filter.matcher()?;
    Ok(listings.iter().filter(|l| matcher.matches(*l)).count())
}

fn visible<L: Listing + Clone>(listings: &[L], id: &str) -> Option<L> {
    listings
        .iter()
        .find(|l| l.id() == id && !l.is_blocked())
        .cloned()
}

#[async_trait]
impl Catalog for InMemoryCatalog {
    // Window and count take the lock separately.
    async fn search_hotels(
        &self,
        filter: &SearchFilter,
        page: PageRequest,
    ) -> Result<PageResult<Hotel>, CatalogError> {
        tracing::debug!("hotel filter {}", filter.to_document("roomTypes.price"));
        let data = window(&self.hotels.read().await[..], filter, page)?;
        let total = count(&self.hotels.read().await[..], filter)?;
        Ok(PageResult::new(data, total, page))
    }

    async fn search_restaurants(
        &self,
        filter: &SearchFilter,
        page: PageRequest,
    ) -> Result<PageResult<Restaurant>, CatalogError> {
        tracing::debug!("restaurant filter {}", filter.to_document("foodItems.price"));
        let data = window(&self.restaurants.read().await[..], filter, page)?;
        let total = count(&self.restaurants.read().await[..], filter)?;
        Ok(PageResult::new(data, total, page))
    }

    async fn hotel(&self, id: &str) -> Result<Option<Hotel>, CatalogError> {
        Ok(visible(&self.hotels.read().await[..], id))
    }

    async fn restaurant(&self, id: &str) -> Result<Option<Restaurant>, CatalogError> {
        Ok(visible(&self.restaurants.read().await[..], id))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::search_query_builder::SortOption;

    pub(crate) fn hotel(id: &str, city: &str, stars: u8, prices: &[f64]) -> Hotel {
        Hotel {
            id: id.to_string(),
            name: format!("Hotel {id}"),
            city: city.to_string(),
            country: "India".to_string(),
            description: String::new(),
            kind: "Budget".to_string(),
            star_rating: stars,
            facilities: vec!["Free WiFi".to_string()],
            image_urls: Vec::new(),
            room_types: prices
                .iter()
                .zip(["Single", "Double", "Triple", "King", "Queen"])
                .map(|(price, kind)| RoomType {
                    kind: kind.to_string(),
                    price: *price,
                    quantity: 4,
                })
                .collect(),
            is_blocked: false,
        }
    }

    fn catalog(hotels: Vec<Hotel>) -> InMemoryCatalog {
        InMemoryCatalog::new(CatalogSnapshot {
            hotels,
            restaurants: Vec::new(),
        })
    }

    #[test]
    fn price_extremes_come_from_nested_array() {
        let h = hotel("a", "Goa", 3, &[1200.0, 800.0, 1500.0]);
        assert_eq!(h.min_price(), Some(800.0));
        assert_eq!(h.max_price(), Some(1500.0));
        assert_eq!(hotel("b", "Goa", 3, &[]).min_price(), None);
    }

    #[test]
    fn underscore_id_is_accepted() {
        let json = r#"{"_id":"h1","name":"Sea View","city":"Goa","country":"India","type":"Resort","starRating":4}"#;
        let h: Hotel = serde_json::from_str(json).unwrap();
        assert_eq!(h.id, "h1");
        assert_eq!(h.kind, "Resort");
        assert!(!h.is_blocked);
    }

    #[tokio::test]
    async fn blocked_hotels_are_hidden() {
        let mut blocked = hotel("b", "Goa", 5, &[100.0]);
        blocked.is_blocked = true;
        let catalog = catalog(vec![hotel("a", "Goa", 3, &[100.0]), blocked]);

        let page = catalog
            .search_hotels(&SearchFilter::default(), PageRequest::first())
            .await
            .unwrap();
        assert_eq!(page.pagination.total, 1);
        assert_eq!(page.data[0].id, "a");
        assert!(catalog.hotel("b").await.unwrap().is_none());

        assert!(catalog.set_hotel_blocked("b", false).await);
        assert!(catalog.hotel("b").await.unwrap().is_some());
        assert!(!catalog.set_hotel_blocked("missing", true).await);
    }

    #[tokio::test]
    async fn star_sort_is_stable() {
        let catalog = catalog(vec![
            hotel("a", "Goa", 3, &[100.0]),
            hotel("b", "Goa", 5, &[100.0]),
            hotel("c", "Goa", 3, &[100.0]),
            hotel("d", "Goa", 5, &[100.0]),
        ]);
        let filter = SearchFilter::builder()
            .sort_option(SortOption::StarRating)
            .build();
        let page = catalog
            .search_hotels(&filter, PageRequest::first())
            .await
            .unwrap();
        let ids: Vec<_> = page.data.iter().map(|h| h.id.as_str()).collect();
        assert_eq!(ids, ["b", "d", "a", "c"]);
    }
}
