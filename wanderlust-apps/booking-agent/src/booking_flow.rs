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

//! # Booking Conversation Flow
//!
//! The scripted booking assistant as a pure state machine. [`transition`] maps
//! `(state, step, input)` to the next step, or to an [`Effect`] the caller must
//! run and feed back through [`resume`]. Nothing here performs I/O.

use chrono::{Days, Months, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::booking_price::{food_price_and_count, nights_per_stay, room_price};
use crate::catalog::{Hotel, Restaurant};
use crate::checkout::{CheckoutSession, HotelPayment, PaymentData, RestaurantPayment};
use crate::pagination::PageRequest;

pub const BOT_NAME: &str = "WanderLustBookingAssistant1.0";

pub const CANCEL_BOOKING: &str = "Cancel Booking";
pub const CONTINUE: &str = "Continue";
pub const QUIT: &str = "Quit";
pub const MORE: &str = "More";
pub const CONFIRM_DESTINATION: &str = "Confirm Destination";
pub const CONFIRM_CHECK_IN: &str = "Confirm Check-in Date";
pub const CONFIRM_CHECK_OUT: &str = "Confirm Check-out Date";
pub const CONFIRM_BOOKING_DATE: &str = "Confirm booking Date";
pub const VERIFY_AVAILABILITY: &str = "Verify and Check Availability";
pub const CONFIRM_BOOKING: &str = "Confirm Booking";

pub const BOOKING_KINDS: [&str; 3] = ["Hotel", "Restaurant", "Transit"];
pub const ROOM_TYPES: [&str; 5] = ["Single", "Double", "Triple", "King", "Queen"];

pub const BOOKING_SAVED: &str = "Booking Saved!";
pub const REQUIREMENT_UNAVAILABLE: &str = "Requirement unavailable";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "server", derive(schemars::JsonSchema))]
#[serde(rename_all = "camelCase")]
pub enum StepId {
    Start,
    SelectBooking,
    SearchHotel,
    SearchRestaurant,
    SearchTransit,
    ListHotels,
    ListRestaurants,
    HotelDetails,
    RestaurantDetails,
    ConfirmDestinationH,
    ConfirmDestinationR,
    AdultCount,
    ChildCount,
    GuestCount,
    ConfirmGuests,
    ConfirmGuestCount,
    RoomDetails,
    FoodDetails,
    ConfirmRoomType,
    ConfirmFoodItem,
    TotalRooms,
    ConfirmTotalRooms,
    CheckIn,
    ConfirmCheckInDate,
    CheckOut,
    ConfirmCheckOutDate,
    DateOfBooking,
    ConfirmBookingDate,
    VerifyBookingDetailsH,
    VerifyBookingDetailsR,
    Unavailable,
    End,
}

impl StepId {
    /// Every step except the entry and the two terminals accepts "Cancel Booking"
    pub fn accepts_cancel(&self) -> bool {
        !matches!(self, StepId::Start | StepId::Unavailable | StepId::End)
    }

    pub fn is_numeric_entry(&self) -> bool {
        matches!(
            self,
            StepId::AdultCount | StepId::ChildCount | StepId::GuestCount | StepId::TotalRooms
        )
    }

    pub fn is_date_picker(&self) -> bool {
        matches!(self, StepId::CheckIn | StepId::CheckOut | StepId::DateOfBooking)
    }

    pub fn is_free_text(&self) -> bool {
        self.is_numeric_entry()
            || matches!(
                self,
                StepId::Start | StepId::SearchHotel | StepId::SearchRestaurant
            )
    }

    /// Steps that advance without waiting for input
    pub fn auto_next(&self) -> Option<StepId> {
        match self {
            StepId::Unavailable => Some(StepId::End),
            _ => None,
        }
    }

    fn on_restaurant_path(&self) -> bool {
        matches!(
            self,
            StepId::SearchRestaurant
                | StepId::ListRestaurants
                | StepId::RestaurantDetails
                | StepId::ConfirmDestinationR
                | StepId::GuestCount
                | StepId::ConfirmGuestCount
                | StepId::FoodDetails
                | StepId::ConfirmFoodItem
                | StepId::DateOfBooking
                | StepId::ConfirmBookingDate
                | StepId::VerifyBookingDetailsR
        )
    }
}

/// Session inputs the flow reads but never owns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlowContext {
    pub today: NaiveDate,
}

impl FlowContext {
    pub fn new(today: NaiveDate) -> Self {
        Self { today }
    }

    pub fn today_local() -> Self {
        Self::new(chrono::Local::now().date_naive())
    }

    pub fn tomorrow(&self) -> NaiveDate {
        self.today + Days::new(1)
    }

    /// Latest date any picker accepts
    pub fn max_date(&self) -> NaiveDate {
        self.today
            .checked_add_months(Months::new(12))
            .unwrap_or(self.today + Days::new(365))
    }
}

/// Booking parameters collected across steps.
///
/// Prices and night counts are not stored here; they are derived from the
/// draft and the selected listing when a payment is built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "server", derive(schemars::JsonSchema))]
#[serde(rename_all = "camelCase")]
pub struct BookingDraft {
    pub user_name: String,
    pub hotel_id: Option<String>,
    pub restaurant_id: Option<String>,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub date_of_booking: NaiveDate,
    pub adult_count: Option<u32>,
    pub child_count: Option<u32>,
    pub guest_count: Option<u32>,
    pub room_type: Option<String>,
    pub room_count: Option<u32>,
    pub food_item: Option<String>,
}

impl BookingDraft {
    pub fn new(user_name: impl Into<String>, ctx: &FlowContext) -> Self {
        let tomorrow = ctx.tomorrow();
        Self {
            user_name: user_name.into(),
            hotel_id: None,
            restaurant_id: None,
            check_in: tomorrow,
            check_out: tomorrow + Days::new(1),
            date_of_booking: tomorrow,
            adult_count: None,
            child_count: None,
            guest_count: None,
            room_type: None,
            room_count: None,
            food_item: None,
        }
    }

    /// `None` until every hotel field is collected
    pub fn hotel_payment(&self, hotel: &Hotel) -> Option<HotelPayment> {
        let room_type = self.room_type.clone()?;
        Some(HotelPayment {
            user_name: self.user_name.clone(),
            hotel_id: self.hotel_id.clone()?,
            check_in: self.check_in,
            check_out: self.check_out,
            adult_count: self.adult_count?,
            child_count: self.child_count?,
            room_price: room_price(hotel, &room_type),
            room_type,
            room_count: self.room_count?,
            nights_per_stay: nights_per_stay(self.check_in, self.check_out),
        })
    }

    /// `None` until every restaurant field is collected
    pub fn restaurant_payment(&self, restaurant: &Restaurant) -> Option<RestaurantPayment> {
        let food_item = self.food_item.clone()?;
        let (food_price, food_count) = food_price_and_count(restaurant, &food_item);
        Some(RestaurantPayment {
            user_name: self.user_name.clone(),
            restaurant_id: self.restaurant_id.clone()?,
            date_of_booking: self.date_of_booking,
            guest_count: self.guest_count?,
            food_item,
            food_price,
            food_count,
        })
    }
}

/// Everything a conversation carries between inputs
#[derive(Debug, Clone, PartialEq)]
pub struct FlowState {
    pub draft: BookingDraft,
    pub page: PageRequest,
    pub search_text: String,
    pub hotel_results: Vec<Hotel>,
    pub restaurant_results: Vec<Restaurant>,
    pub picked_hotel: Option<Hotel>,
    pub picked_restaurant: Option<Restaurant>,
    pub last_session: Option<CheckoutSession>,
    /// One-shot message attached to the next rendered prompt
    pub notice: Option<String>,
}

impl FlowState {
    pub fn new(ctx: &FlowContext) -> Self {
        Self {
            draft: BookingDraft::new("", ctx),
            page: PageRequest::first(),
            search_text: String::new(),
            hotel_results: Vec::new(),
            restaurant_results: Vec::new(),
            picked_hotel: None,
            picked_restaurant: None,
            last_session: None,
            notice: None,
        }
    }

    /// Drops booking fields and selections. The display name survives.
    fn discard_draft(&mut self, ctx: &FlowContext) {
        self.draft = BookingDraft::new(std::mem::take(&mut self.draft.user_name), ctx);
        self.search_text.clear();
        self.hotel_results.clear();
        self.restaurant_results.clear();
        self.picked_hotel = None;
        self.picked_restaurant = None;
    }

    fn stay(mut self, notice: impl Into<String>) -> (Transition, Self) {
        self.notice = Some(notice.into());
        (Transition::Stay, self)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    SearchHotels { text: String, page: PageRequest },
    SearchRestaurants { text: String, page: PageRequest },
    Checkout(PaymentData),
}

/// Result of an [`Effect`], as observed by the flow
#[derive(Debug, Clone, PartialEq)]
pub enum EffectOutcome {
    Hotels(Vec<Hotel>),
    Restaurants(Vec<Restaurant>),
    /// Unknown destination and transport errors look the same
    SearchFailed,
    CheckoutSaved(CheckoutSession),
    CheckoutFailed,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    Goto(StepId),
    /// Input rejected or consumed in place; re-render the same step
    Stay,
    Perform(Effect),
    Quit,
}

/// Options offered at `step`. Rendering and input matching share this list.
pub fn options(state: &FlowState, step: StepId) -> Vec<String> {
    fn owned(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }
    let with_cancel = |mut items: Vec<String>| {
        items.push(CANCEL_BOOKING.to_string());
        items
    };
    match step {
        StepId::Start
        | StepId::SearchHotel
        | StepId::SearchRestaurant
        | StepId::AdultCount
        | StepId::ChildCount
        | StepId::GuestCount
        | StepId::TotalRooms
        | StepId::Unavailable => Vec::new(),
        StepId::SelectBooking => owned(&BOOKING_KINDS),
        StepId::SearchTransit => owned(&["start"]),
        StepId::ListHotels => {
            let mut items: Vec<String> = state.hotel_results.iter().map(|h| h.name.clone()).collect();
            items.push(MORE.to_string());
            with_cancel(items)
        }
        StepId::ListRestaurants => {
            let mut items: Vec<String> = state
                .restaurant_results
                .iter()
                .map(|r| r.name.clone())
                .collect();
            items.push(MORE.to_string());
            with_cancel(items)
        }
        StepId::HotelDetails | StepId::RestaurantDetails => {
            with_cancel(owned(&[CONFIRM_DESTINATION]))
        }
        StepId::ConfirmDestinationH
        | StepId::ConfirmDestinationR
        | StepId::ConfirmGuests
        | StepId::ConfirmGuestCount
        | StepId::ConfirmRoomType
        | StepId::ConfirmFoodItem
        | StepId::ConfirmTotalRooms
        | StepId::ConfirmCheckInDate
        | StepId::ConfirmCheckOutDate
        | StepId::ConfirmBookingDate => with_cancel(owned(&[CONTINUE])),
        StepId::RoomDetails => with_cancel(owned(&ROOM_TYPES)),
        StepId::FoodDetails => with_cancel(
            state
                .picked_restaurant
                .iter()
                .flat_map(|r| r.food_items.iter().map(|f| f.item.clone()))
                .collect(),
        ),
        StepId::CheckIn => with_cancel(owned(&[CONFIRM_CHECK_IN])),
        StepId::CheckOut => with_cancel(owned(&[CONFIRM_CHECK_OUT])),
        StepId::DateOfBooking => with_cancel(owned(&[CONFIRM_BOOKING_DATE])),
        StepId::VerifyBookingDetailsH => with_cancel(owned(&[VERIFY_AVAILABILITY])),
        StepId::VerifyBookingDetailsR => with_cancel(owned(&[CONFIRM_BOOKING])),
        StepId::End => owned(&[QUIT, CONTINUE]),
    }
}

/// Integer prefix of `input`, read the way a lenient form field would.
/// Negative and digit-less input yields `None`.
pub fn parse_count(input: &str) -> Option<u32> {
    let s = input.trim_start();
    let s = s.strip_prefix('+').unwrap_or(s);
    let end = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
    s[..end].parse().ok()
}

fn parse_date(input: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(input, "%Y-%m-%d").ok()
}

/// Advance the conversation by one user input
pub fn transition(
    ctx: &FlowContext,
    mut state: FlowState,
    step: StepId,
    input: &str,
) -> (Transition, FlowState) {
    let input = input.trim();
    state.notice = None;

    if step.accepts_cancel() && input == CANCEL_BOOKING {
        state.discard_draft(ctx);
        return (Transition::Goto(StepId::End), state);
    }

    if step.is_numeric_entry() {
        let Some(count) = parse_count(input) else {
            state.discard_draft(ctx);
            return (Transition::Goto(StepId::End), state);
        };
        let draft = &mut state.draft;
        let next = match step {
            StepId::AdultCount => {
                draft.adult_count = Some(count);
                StepId::ChildCount
            }
            StepId::ChildCount => {
                draft.child_count = Some(count);
                StepId::ConfirmGuests
            }
            StepId::GuestCount => {
                draft.guest_count = Some(count);
                StepId::ConfirmGuestCount
            }
            _ => {
                draft.room_count = Some(count);
                StepId::ConfirmTotalRooms
            }
        };
        return (Transition::Goto(next), state);
    }

    if let Some(next) = confirm_target(step) {
        return if input == CONTINUE {
            (Transition::Goto(next), state)
        } else {
            state.stay(format!("Please choose \"{CONTINUE}\" or \"{CANCEL_BOOKING}\""))
        };
    }

    match step {
        StepId::Start => {
            if input.is_empty() {
                return state.stay("Please enter your name");
            }
            state.draft.user_name = input.to_string();
            (Transition::Goto(StepId::SelectBooking), state)
        }
        StepId::SelectBooking => match input {
            "Hotel" => (Transition::Goto(StepId::SearchHotel), state),
            "Restaurant" => (Transition::Goto(StepId::SearchRestaurant), state),
            "Transit" => (Transition::Goto(StepId::SearchTransit), state),
            _ => state.stay("Select one of the listed options"),
        },
        StepId::SearchHotel | StepId::SearchRestaurant => {
            if input.is_empty() {
                return state.stay("Enter a name or a place to search");
            }
            state.search_text = input.to_string();
            let effect = search_effect(step, &state);
            (Transition::Perform(effect), state)
        }
        StepId::SearchTransit => match input {
            "start" => (Transition::Goto(StepId::Start), state),
            _ => state.stay("Select one of the listed options"),
        },
        StepId::ListHotels | StepId::ListRestaurants => pick_listing(state, step, input),
        StepId::HotelDetails => {
            if input != CONFIRM_DESTINATION {
                return state.stay("Select one of the listed options");
            }
            state.draft.hotel_id = state.picked_hotel.as_ref().map(|h| h.id.clone());
            (Transition::Goto(StepId::ConfirmDestinationH), state)
        }
        StepId::RestaurantDetails => {
            if input != CONFIRM_DESTINATION {
                return state.stay("Select one of the listed options");
            }
            state.draft.restaurant_id = state.picked_restaurant.as_ref().map(|r| r.id.clone());
            (Transition::Goto(StepId::ConfirmDestinationR), state)
        }
        StepId::RoomDetails => {
            if !ROOM_TYPES.contains(&input) {
                return state.stay("Select one of the listed room types");
            }
            state.draft.room_type = Some(input.to_string());
            (Transition::Goto(StepId::ConfirmRoomType), state)
        }
        StepId::FoodDetails => {
            let offered = state
                .picked_restaurant
                .as_ref()
                .is_some_and(|r| r.food_item(input).is_some());
            if !offered {
                return state.stay("Select one of the listed food items");
            }
            state.draft.food_item = Some(input.to_string());
            (Transition::Goto(StepId::ConfirmFoodItem), state)
        }
        StepId::CheckIn | StepId::CheckOut | StepId::DateOfBooking => {
            pick_date(ctx, state, step, input)
        }
        StepId::VerifyBookingDetailsH => {
            if input != VERIFY_AVAILABILITY {
                return state.stay("Select one of the listed options");
            }
            let payment = state
                .picked_hotel
                .as_ref()
                .and_then(|h| state.draft.hotel_payment(h));
            checkout_or_unavailable(state, payment.map(PaymentData::Hotel))
        }
        StepId::VerifyBookingDetailsR => {
            if input != CONFIRM_BOOKING {
                return state.stay("Select one of the listed options");
            }
            let payment = state
                .picked_restaurant
                .as_ref()
                .and_then(|r| state.draft.restaurant_payment(r));
            checkout_or_unavailable(state, payment.map(PaymentData::Restaurant))
        }
        StepId::Unavailable => (Transition::Goto(StepId::End), state),
        StepId::End => {
            state.page = PageRequest::first();
            match input {
                CONTINUE => {
                    state.discard_draft(ctx);
                    state.last_session = None;
                    (Transition::Goto(StepId::Start), state)
                }
                QUIT => (Transition::Quit, state),
                _ => state.stay(format!("Choose \"{CONTINUE}\" or \"{QUIT}\"")),
            }
        }
        // numeric entry and confirmation steps returned above
        _ => (Transition::Stay, state),
    }
}

/// Feed the outcome of the effect emitted at `step` back into the flow
pub fn resume(mut state: FlowState, step: StepId, outcome: EffectOutcome) -> (StepId, FlowState) {
    match outcome {
        EffectOutcome::Hotels(hotels) => {
            state.hotel_results = hotels;
            (StepId::ListHotels, state)
        }
        EffectOutcome::Restaurants(restaurants) => {
            state.restaurant_results = restaurants;
            (StepId::ListRestaurants, state)
        }
        EffectOutcome::SearchFailed if step.on_restaurant_path() => {
            state.restaurant_results.clear();
            (StepId::ListRestaurants, state)
        }
        EffectOutcome::SearchFailed => {
            state.hotel_results.clear();
            (StepId::ListHotels, state)
        }
        EffectOutcome::CheckoutSaved(session) => {
            state.last_session = Some(session);
            state.notice = Some(BOOKING_SAVED.to_string());
            (StepId::End, state)
        }
        EffectOutcome::CheckoutFailed => {
            state.notice = Some(REQUIREMENT_UNAVAILABLE.to_string());
            (StepId::Unavailable, state)
        }
    }
}

fn confirm_target(step: StepId) -> Option<StepId> {
    let next = match step {
        StepId::ConfirmDestinationH => StepId::AdultCount,
        StepId::ConfirmDestinationR => StepId::GuestCount,
        StepId::ConfirmGuests => StepId::RoomDetails,
        StepId::ConfirmGuestCount => StepId::FoodDetails,
        StepId::ConfirmRoomType => StepId::TotalRooms,
        StepId::ConfirmFoodItem => StepId::DateOfBooking,
        StepId::ConfirmTotalRooms => StepId::CheckIn,
        StepId::ConfirmCheckInDate => StepId::CheckOut,
        StepId::ConfirmCheckOutDate => StepId::VerifyBookingDetailsH,
        StepId::ConfirmBookingDate => StepId::VerifyBookingDetailsR,
        _ => return None,
    };
    Some(next)
}

fn search_effect(step: StepId, state: &FlowState) -> Effect {
    let text = state.search_text.clone();
    let page = state.page;
    if step.on_restaurant_path() {
        Effect::SearchRestaurants { text, page }
    } else {
        Effect::SearchHotels { text, page }
    }
}

// "More" loads the next page in place of the current list. Any other choice
// opens the details of the first listing shown.
fn pick_listing(mut state: FlowState, step: StepId, input: &str) -> (Transition, FlowState) {
    if input == MORE {
        state.page = state.page.next();
        let effect = search_effect(step, &state);
        return (Transition::Perform(effect), state);
    }
    if step == StepId::ListHotels {
        match state.hotel_results.first().cloned() {
            Some(hotel) => {
                state.picked_hotel = Some(hotel);
                (Transition::Goto(StepId::HotelDetails), state)
            }
            None => state.stay("No hotels to choose from. Try \"More\" or cancel"),
        }
    } else {
        match state.restaurant_results.first().cloned() {
            Some(restaurant) => {
                state.picked_restaurant = Some(restaurant);
                (Transition::Goto(StepId::RestaurantDetails), state)
            }
            None => state.stay("No restaurants to choose from. Try \"More\" or cancel"),
        }
    }
}

/// Inclusive bounds for the picker at `step`
pub fn date_bounds(ctx: &FlowContext, draft: &BookingDraft, step: StepId) -> (NaiveDate, NaiveDate) {
    match step {
        StepId::CheckOut => (draft.check_in + Days::new(1), ctx.max_date()),
        _ => (ctx.tomorrow(), ctx.max_date()),
    }
}

fn pick_date(
    ctx: &FlowContext,
    mut state: FlowState,
    step: StepId,
    input: &str,
) -> (Transition, FlowState) {
    let (confirm, next) = match step {
        StepId::CheckIn => (CONFIRM_CHECK_IN, StepId::ConfirmCheckInDate),
        StepId::CheckOut => (CONFIRM_CHECK_OUT, StepId::ConfirmCheckOutDate),
        _ => (CONFIRM_BOOKING_DATE, StepId::ConfirmBookingDate),
    };
    if input == confirm {
        return (Transition::Goto(next), state);
    }
    let Some(date) = parse_date(input) else {
        return state.stay("Enter a date as YYYY-MM-DD or confirm the selected one");
    };
    let (min, max) = date_bounds(ctx, &state.draft, step);
    if date < min || date > max {
        return state.stay(format!("Pick a date between {min} and {max}"));
    }
    let draft = &mut state.draft;
    match step {
        StepId::CheckIn => {
            draft.check_in = date;
            draft.check_out = date + Days::new(1);
        }
        StepId::CheckOut => draft.check_out = date,
        _ => draft.date_of_booking = date,
    }
    (Transition::Stay, state)
}

fn checkout_or_unavailable(
    mut state: FlowState,
    payment: Option<PaymentData>,
) -> (Transition, FlowState) {
    match payment {
        Some(payment) => (Transition::Perform(Effect::Checkout(payment)), state),
        None => {
            state.notice = Some(REQUIREMENT_UNAVAILABLE.to_string());
            (Transition::Goto(StepId::Unavailable), state)
        }
    }
}
