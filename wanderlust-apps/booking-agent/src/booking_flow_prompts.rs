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

//! Read-only rendering of conversation steps.
//! Totals are recomputed from the draft on every render.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::booking_flow::{
    BOT_NAME, FlowContext, FlowState, REQUIREMENT_UNAVAILABLE, StepId, date_bounds, options,
};
use crate::booking_price::{
    food_price_and_count, hotel_total, nights_per_stay, restaurant_total, room_price,
};

const PAYMENT_REDIRECT: &str = "After clicking on \"Confirm Booking\", The bot will redirect you to the payment gateway page. Happy booking...";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "server", derive(schemars::JsonSchema))]
#[serde(rename_all = "lowercase")]
pub enum InputKind {
    Text,
    Options,
    Date,
    /// The step advances on its own
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "server", derive(schemars::JsonSchema))]
pub struct DateRange {
    pub min: NaiveDate,
    pub max: NaiveDate,
    pub selected: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "server", derive(schemars::JsonSchema))]
#[serde(rename_all = "camelCase")]
pub struct Prompt {
    pub step: StepId,
    pub message: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
    pub input: InputKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_range: Option<DateRange>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notice: Option<String>,
}

/// Whole amounts print without decimals
pub fn format_amount(amount: f64) -> String {
    if amount.fract() == 0.0 {
        format!("{amount:.0}")
    } else {
        format!("{amount:.2}")
    }
}

fn count_or_blank(count: Option<u32>) -> String {
    count.map_or_else(String::new, |c| c.to_string())
}

pub fn render(ctx: &FlowContext, state: &FlowState, step: StepId) -> Prompt {
    let draft = &state.draft;
    let mut details = Vec::new();

    let message = match step {
        StepId::Start => format!("Hi there!, I'm {BOT_NAME}, Please enter your sweet name 😊"),
        StepId::SelectBooking => format!(
            "Hello {}. You can start booking now, Select one...",
            draft.user_name
        ),
        StepId::SearchHotel => "Enter hotel name or place...".to_string(),
        StepId::SearchRestaurant => "Enter restaurant name or place...".to_string(),
        StepId::SearchTransit => {
            "Sorry for the trouble. Transit booking under construction".to_string()
        }
        StepId::ListHotels => {
            if state.hotel_results.is_empty() {
                details.push(format!("No hotels found for \"{}\"", state.search_text));
            }
            "Find your hotel from the list".to_string()
        }
        StepId::ListRestaurants => {
            if state.restaurant_results.is_empty() {
                details.push(format!("No restaurants found for \"{}\"", state.search_text));
            }
            "Find your restaurant from the list".to_string()
        }
        StepId::HotelDetails => {
            if let Some(hotel) = &state.picked_hotel {
                details.push(format!("Hotel Name: {}", hotel.name));
                details.push(format!("Place: {}, {}", hotel.city, hotel.country));
                details.push(format!("Facilities: {}", hotel.facilities.join(",")));
                details.push(format!("Rating: {}", hotel.star_rating));
                details.push(format!("Type: {}", hotel.kind));
                details.push(format!("Description: {}", hotel.description));
                details.extend(hotel.image_urls.iter().map(|url| format!("Image: {url}")));
            }
            "Now check details".to_string()
        }
        StepId::RestaurantDetails => {
            if let Some(restaurant) = &state.picked_restaurant {
                details.push(format!("Restaurant Name: {}", restaurant.name));
                details.push(format!("Place: {}, {}", restaurant.city, restaurant.country));
                details.push("Food Items:".to_string());
                details.extend(restaurant.food_items.iter().map(|f| {
                    format!("  {} | ₹{} | {}", f.item, format_amount(f.price), f.quantity)
                }));
                details.push(format!("Facilities: {}", restaurant.facilities.join(",")));
                details.push(format!("Rating: {}", restaurant.star_rating));
                details.push(format!("Type: {}", restaurant.kind));
                details.push("Opening Hours:".to_string());
                details.extend(
                    restaurant
                        .opening_hours
                        .iter()
                        .map(|h| format!("  {} | {} - {}", h.day, h.start_time, h.end_time)),
                );
                details.push(format!("Description: {}", restaurant.description));
                details.extend(restaurant.image_urls.iter().map(|url| format!("Image: {url}")));
            }
            "Now check details".to_string()
        }
        StepId::ConfirmDestinationH => format!(
            "You've selected {}.",
            state.picked_hotel.as_ref().map_or("", |h| h.name.as_str())
        ),
        StepId::ConfirmDestinationR => format!(
            "You've selected {}.",
            state.picked_restaurant.as_ref().map_or("", |r| r.name.as_str())
        ),
        StepId::AdultCount => "Enter number of adults(15+)".to_string(),
        StepId::ChildCount => "Enter number of children".to_string(),
        StepId::GuestCount => "Enter number of guests".to_string(),
        StepId::ConfirmGuests => format!(
            "{} adults & {} children",
            count_or_blank(draft.adult_count),
            count_or_blank(draft.child_count)
        ),
        StepId::ConfirmGuestCount => format!("{} Guests", count_or_blank(draft.guest_count)),
        StepId::RoomDetails => "Next, Select Room".to_string(),
        StepId::FoodDetails => "Next, Select Food".to_string(),
        StepId::ConfirmRoomType => format!(
            "You've selected {}-bed room.",
            draft.room_type.as_deref().unwrap_or_default()
        ),
        StepId::ConfirmFoodItem => format!(
            "You've selected {} for {}",
            draft.food_item.as_deref().unwrap_or_default(),
            count_or_blank(draft.guest_count)
        ),
        StepId::TotalRooms => "Enter number of rooms".to_string(),
        StepId::ConfirmTotalRooms => format!(
            "You've selected {} {}-bed rooms.",
            count_or_blank(draft.room_count),
            draft.room_type.as_deref().unwrap_or_default()
        ),
        StepId::CheckIn => "Please select the check-in date".to_string(),
        StepId::ConfirmCheckInDate => format!("You've selected {}.", draft.check_in),
        StepId::CheckOut => "Now, Select check-out date".to_string(),
        StepId::ConfirmCheckOutDate => format!("You've selected {}.", draft.check_out),
        StepId::DateOfBooking => "Please select the booking date".to_string(),
        StepId::ConfirmBookingDate => format!("You've selected {}.", draft.date_of_booking),
        StepId::VerifyBookingDetailsH => {
            details = hotel_summary(state);
            "Now verify details".to_string()
        }
        StepId::VerifyBookingDetailsR => {
            details = restaurant_summary(state);
            "Now verify details".to_string()
        }
        StepId::Unavailable => REQUIREMENT_UNAVAILABLE.to_string(),
        StepId::End => {
            if let Some(session) = &state.last_session {
                details.push(format!("Checkout session: {}", session.session_id));
                if let Some(url) = &session.url {
                    details.push(format!("Complete your payment at {url}"));
                }
            }
            format!("Thank you {}! Visit Again", draft.user_name)
        }
    };

    let input = if step.auto_next().is_some() {
        InputKind::None
    } else if step.is_date_picker() {
        InputKind::Date
    } else if step.is_free_text() {
        InputKind::Text
    } else {
        InputKind::Options
    };

    let date_range = step.is_date_picker().then(|| {
        let (min, max) = date_bounds(ctx, draft, step);
        let selected = match step {
            StepId::CheckIn => draft.check_in,
            StepId::CheckOut => draft.check_out,
            _ => draft.date_of_booking,
        };
        DateRange { min, max, selected }
    });

    Prompt {
        step,
        message,
        details,
        options: options(state, step),
        input,
        date_range,
        notice: state.notice.clone(),
    }
}

fn hotel_summary(state: &FlowState) -> Vec<String> {
    let draft = &state.draft;
    let room_type = draft.room_type.as_deref().unwrap_or_default();
    let room_count = draft.room_count.unwrap_or(0);
    let (name, city, country, price) = match &state.picked_hotel {
        Some(h) => (h.name.as_str(), h.city.as_str(), h.country.as_str(), room_price(h, room_type)),
        None => ("", "", "", 0.0),
    };
    let total = hotel_total(nights_per_stay(draft.check_in, draft.check_out), room_count, price);
    vec![
        format!("User Name: {}", draft.user_name),
        format!("Hotel: {name}"),
        format!("Place: {city}, {country}"),
        format!("Rooms: {room_type} Bed, ₹{}, {room_count} Nos", format_amount(price)),
        format!(
            "Guests: {} Adults & {} Children",
            count_or_blank(draft.adult_count),
            count_or_blank(draft.child_count)
        ),
        format!("Check-in: {} 02:00:00 PM", draft.check_in),
        format!("Check-out: {} 12:00:00 PM", draft.check_out),
        format!("Total Cost: ₹{}/-", format_amount(total)),
        PAYMENT_REDIRECT.to_string(),
    ]
}

fn restaurant_summary(state: &FlowState) -> Vec<String> {
    let draft = &state.draft;
    let food_item = draft.food_item.as_deref().unwrap_or_default();
    let guests = draft.guest_count.unwrap_or(0);
    let (name, city, country, price) = match &state.picked_restaurant {
        Some(r) => (
            r.name.as_str(),
            r.city.as_str(),
            r.country.as_str(),
            food_price_and_count(r, food_item).0,
        ),
        None => ("", "", "", 0.0),
    };
    vec![
        format!("User Name: {}", draft.user_name),
        format!("Restaurant: {name}"),
        format!("Place: {city}, {country}"),
        format!("Food: {food_item}"),
        format!("Guests: {guests} Guests"),
        format!("Date of Booking: {} 12:00:00 PM", draft.date_of_booking),
        format!("Total Cost: ₹{}/-", format_amount(restaurant_total(price, guests))),
        PAYMENT_REDIRECT.to_string(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::tests::hotel;

    fn ctx() -> FlowContext {
        FlowContext::new(NaiveDate::from_ymd_opt(2026, 3, 1).unwrap())
    }

    #[test]
    fn amounts_drop_trailing_zeroes() {
        assert_eq!(format_amount(600.0), "600");
        assert_eq!(format_amount(12.5), "12.50");
    }

    #[test]
    fn verify_total_follows_the_draft() {
        let ctx = ctx();
        let mut state = FlowState::new(&ctx);
        state.picked_hotel = Some(hotel("h1", "Goa", 4, &[100.0, 180.0]));
        state.draft.room_type = Some("Single".into());
        state.draft.room_count = Some(3);
        state.draft.check_in = NaiveDate::from_ymd_opt(2026, 3, 10).unwrap();
        state.draft.check_out = NaiveDate::from_ymd_opt(2026, 3, 12).unwrap();

        let prompt = render(&ctx, &state, StepId::VerifyBookingDetailsH);
        assert!(prompt.details.contains(&"Total Cost: ₹600/-".to_string()));

        state.draft.room_type = Some("Double".into());
        let prompt = render(&ctx, &state, StepId::VerifyBookingDetailsH);
        assert!(prompt.details.contains(&"Total Cost: ₹1080/-".to_string()));
    }

    #[test]
    fn date_steps_expose_their_bounds() {
        let ctx = ctx();
        let state = FlowState::new(&ctx);
        let prompt = render(&ctx, &state, StepId::CheckOut);
        assert_eq!(prompt.input, InputKind::Date);
        let range = prompt.date_range.unwrap();
        assert_eq!(range.min, state.draft.check_in + chrono::Days::new(1));
        assert_eq!(range.selected, state.draft.check_out);
    }

    #[test]
    fn unavailable_needs_no_input() {
        let ctx = ctx();
        let prompt = render(&ctx, &FlowState::new(&ctx), StepId::Unavailable);
        assert_eq!(prompt.input, InputKind::None);
        assert_eq!(prompt.message, "Requirement unavailable");
    }
}
