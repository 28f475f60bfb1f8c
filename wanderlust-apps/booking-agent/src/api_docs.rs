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

//! JSON schemas of the public payloads, served at `GET /api/docs`

use axum::Json;
use schemars::{JsonSchema, schema_for};
use serde_json::{Map, Value};

use crate::api_routes::{
    BlockStatus, ChatInput, ConversationReply, ConversationStarted, QuoteRequest, ValidationErrors,
};
use crate::booking_price::HotelQuote;
use crate::catalog::{Hotel, Restaurant};
use crate::checkout::{CheckoutSession, PaymentData};
use crate::live_chat::ChatFrame;
use crate::pagination::PageResult;
use crate::validation::{RegistrationRequest, UserProfile};

fn schema<T: JsonSchema>() -> Value {
    schema_for!(T).into()
}

pub fn api_schemas() -> Value {
    let entries = [
        ("HotelSearchResponse", schema::<PageResult<Hotel>>()),
        ("RestaurantSearchResponse", schema::<PageResult<Restaurant>>()),
        ("Hotel", schema::<Hotel>()),
        ("Restaurant", schema::<Restaurant>()),
        ("QuoteRequest", schema::<QuoteRequest>()),
        ("QuoteResponse", schema::<HotelQuote>()),
        ("PaymentData", schema::<PaymentData>()),
        ("CheckoutSession", schema::<CheckoutSession>()),
        ("ConversationStarted", schema::<ConversationStarted>()),
        ("ChatInput", schema::<ChatInput>()),
        ("ConversationReply", schema::<ConversationReply>()),
        ("RegistrationRequest", schema::<RegistrationRequest>()),
        ("UserProfile", schema::<UserProfile>()),
        ("ValidationErrors", schema::<ValidationErrors>()),
        ("BlockStatus", schema::<BlockStatus>()),
        ("ChatFrame", schema::<ChatFrame>()),
    ];
    let schemas: Map<String, Value> = entries
        .into_iter()
        .map(|(name, schema)| (name.to_string(), schema))
        .collect();
    Value::Object(schemas)
}

pub async fn docs() -> Json<Value> {
    Json(api_schemas())
}
