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

//! Booking totals, derived from a draft and the selected listing at render time

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::catalog::{Hotel, Restaurant};

/// Whole nights between check-in and check-out, never negative
pub fn nights_per_stay(check_in: NaiveDate, check_out: NaiveDate) -> u32 {
    let days = (check_out - check_in).num_days();
    u32::try_from(days.max(0)).unwrap_or(u32::MAX)
}

/// `nights * rooms * price`
pub fn hotel_total(nights: u32, room_count: u32, room_price: f64) -> f64 {
    f64::from(nights) * f64::from(room_count) * room_price
}

/// `floor(price * guests)`
pub fn restaurant_total(food_price: f64, guest_count: u32) -> f64 {
    (food_price * f64::from(guest_count)).floor()
}

/// Price of the hotel's room matching `room_type`, 0 when there is none
pub fn room_price(hotel: &Hotel, room_type: &str) -> f64 {
    hotel.room(room_type).map_or(0.0, |r| r.price)
}

/// Price and available quantity of the matching food item, 0 when there is none
pub fn food_price_and_count(restaurant: &Restaurant, item: &str) -> (f64, u32) {
    restaurant
        .food_item(item)
        .map_or((0.0, 0), |f| (f.price, f.quantity))
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "server", derive(schemars::JsonSchema))]
#[serde(rename_all = "camelCase")]
pub struct HotelQuote {
    pub room_price: f64,
    pub nights_per_stay: u32,
    pub total_cost: f64,
}

impl HotelQuote {
    pub fn compute(
        hotel: &Hotel,
        room_type: &str,
        room_count: u32,
        check_in: NaiveDate,
        check_out: NaiveDate,
    ) -> Self {
        let room_price = room_price(hotel, room_type);
        let nights_per_stay = nights_per_stay(check_in, check_out);
        Self {
            room_price,
            nights_per_stay,
            total_cost: hotel_total(nights_per_stay, room_count, room_price),
        }
    }

    /// Total as shown on the guest form: a stay shorter than one night is
    /// priced as the rooms alone.
    pub fn form_total(&self, room_count: u32) -> f64 {
        if self.nights_per_stay < 1 {
            self.room_price * f64::from(room_count)
        } else {
            self.total_cost
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestaurantQuote {
    pub food_price: f64,
    pub food_count: u32,
    pub total_cost: f64,
}

impl RestaurantQuote {
    pub fn compute(restaurant: &Restaurant, food_item: &str, guest_count: u32) -> Self {
        let (food_price, food_count) = food_price_and_count(restaurant, food_item);
        Self {
            food_price,
            food_count,
            total_cost: restaurant_total(food_price, guest_count),
        }
    }
}
