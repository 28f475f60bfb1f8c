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

// Library for wanderlust-booking-agent
// Hotel and restaurant search, booking assistant and checkout handoff

mod booking_flow;
mod booking_flow_prompts;
mod booking_price;
mod catalog;
mod catalog_client;
mod checkout;
mod conversation;
mod pagination;
mod search_query_builder;
mod validation;

#[cfg(feature = "server")]
mod api_docs;
#[cfg(feature = "server")]
mod api_error;
#[cfg(feature = "server")]
mod api_routes;
#[cfg(feature = "server")]
mod api_state;
#[cfg(feature = "server")]
mod config;
#[cfg(feature = "server")]
mod live_chat;

// Query building and pagination
pub use pagination::{PAGE_SIZE, PageRequest, PageResult, Pagination};
pub use search_query_builder::{ListingMatcher, SearchFilter, SearchFilterBuilder, SortOption};

// Listings
pub use catalog::{
    Catalog, CatalogError, CatalogSnapshot, FoodItem, Hotel, InMemoryCatalog, Listing,
    OpeningHours, Restaurant, RoomType,
};
pub use catalog_client::HttpCatalog;

// Booking assistant
pub use booking_flow::*;
pub use booking_flow_prompts::{DateRange, InputKind, Prompt, format_amount, render};
pub use conversation::{BookingConversation, ConversationError};

// Pricing and checkout
pub use booking_price::{
    HotelQuote, RestaurantQuote, food_price_and_count, hotel_total, nights_per_stay,
    restaurant_total, room_price,
};
pub use checkout::{
    CheckoutError, CheckoutGateway, CheckoutSession, HotelPayment, HttpCheckoutGateway,
    LocalCheckoutGateway, PaymentData, RestaurantPayment,
};

pub use validation::{FieldError, RegistrationRequest, UserProfile};

// Server
#[cfg(feature = "server")]
pub use api_docs::api_schemas;
#[cfg(feature = "server")]
pub use api_error::ApiError;
#[cfg(feature = "server")]
pub use api_routes::{
    BlockStatus, ChatInput, ConversationReply, ConversationStarted, QuoteRequest, RateLimit,
    ValidationErrors, app, rate_limit, router, shutdown_signal,
};
#[cfg(feature = "server")]
pub use api_state::{AppState, SessionHandle, SharedState};
#[cfg(feature = "server")]
pub use config::AppConfig;
#[cfg(feature = "server")]
pub use live_chat::ChatFrame;
