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

//! # Checkout Handoff
//!
//! A confirmed draft leaves the booking flow as one [`PaymentData`] request to
//! an external payment-session collaborator. Nothing is retried.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::Mutex;

use crate::booking_price::{hotel_total, restaurant_total};

#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("checkout request failed: {0}")]
    Transport(#[from] wreq::Error),
    #[error("checkout collaborator answered with status {0}")]
    Status(u16),
    #[error("checkout rejected: {0}")]
    Rejected(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "server", derive(schemars::JsonSchema))]
#[serde(rename_all = "camelCase")]
pub struct HotelPayment {
    pub user_name: String,
    pub hotel_id: String,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub adult_count: u32,
    pub child_count: u32,
    pub room_type: String,
    pub room_count: u32,
    pub room_price: f64,
    pub nights_per_stay: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "server", derive(schemars::JsonSchema))]
#[serde(rename_all = "camelCase")]
pub struct RestaurantPayment {
    pub user_name: String,
    pub restaurant_id: String,
    pub date_of_booking: NaiveDate,
    pub guest_count: u32,
    pub food_item: String,
    pub food_price: f64,
    pub food_count: u32,
}

/// Serialized draft handed to the payment collaborator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "server", derive(schemars::JsonSchema))]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum PaymentData {
    Hotel(HotelPayment),
    Restaurant(RestaurantPayment),
}

impl PaymentData {
    pub fn total_cost(&self) -> f64 {
        match self {
            PaymentData::Hotel(h) => hotel_total(h.nights_per_stay, h.room_count, h.room_price),
            PaymentData::Restaurant(r) => restaurant_total(r.food_price, r.guest_count),
        }
    }

    pub fn user_name(&self) -> &str {
        match self {
            PaymentData::Hotel(h) => &h.user_name,
            PaymentData::Restaurant(r) => &r.user_name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "server", derive(schemars::JsonSchema))]
#[serde(rename_all = "camelCase")]
pub struct CheckoutSession {
    pub session_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

#[async_trait]
pub trait CheckoutGateway: Send + Sync {
    async fn create_session(&self, payment: &PaymentData) -> Result<CheckoutSession, CheckoutError>;
}

/// POSTs the payment data as JSON and reads a [`CheckoutSession`] back
pub struct HttpCheckoutGateway {
    client: Arc<wreq::Client>,
    url: String,
}

impl HttpCheckoutGateway {
    pub fn new(url: impl Into<String>, timeout_secs: u64) -> Result<Self, CheckoutError> {
        let client = wreq::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(timeout_secs))
            .build()?;
        Ok(Self {
            client: Arc::new(client),
            url: url.into(),
        })
    }
}

#[async_trait]
impl CheckoutGateway for HttpCheckoutGateway {
    async fn create_session(&self, payment: &PaymentData) -> Result<CheckoutSession, CheckoutError> {
        let start = std::time::Instant::now();
        let response = self.client.post(self.url.as_str()).json(payment).send().await?;
        let status = response.status();
        tracing::debug!(
            "[create_session] HTTP Status: {} in {:?}",
            status.as_u16(),
            start.elapsed()
        );
        if !status.is_success() {
            return Err(CheckoutError::Status(status.as_u16()));
        }
        Ok(response.json::<CheckoutSession>().await?)
    }
}

/// Accepted payments kept by [`LocalCheckoutGateway`] by default
pub const LOCAL_HISTORY: usize = 256;

/// Mints session ids in-process. Keeps the most recent accepted payments
/// and a count of all of them.
#[derive(Debug)]
pub struct LocalCheckoutGateway {
    submitted: Mutex<VecDeque<PaymentData>>,
    history: usize,
    accepted: AtomicU64,
    reject_all: bool,
}

impl Default for LocalCheckoutGateway {
    fn default() -> Self {
        Self::with_history(LOCAL_HISTORY)
    }
}

impl LocalCheckoutGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_history(history: usize) -> Self {
        Self {
            submitted: Mutex::default(),
            history,
            accepted: AtomicU64::new(0),
            reject_all: false,
        }
    }

    /// A gateway whose every request fails
    pub fn unavailable() -> Self {
        Self {
            reject_all: true,
            ..Self::default()
        }
    }

    /// Most recent accepted payments, oldest first
    pub async fn submitted(&self) -> Vec<PaymentData> {
        self.submitted.lock().await.iter().cloned().collect()
    }

    /// Every payment accepted since startup, including those no longer kept
    pub fn accepted(&self) -> u64 {
        self.accepted.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl CheckoutGateway for LocalCheckoutGateway {
    async fn create_session(&self, payment: &PaymentData) -> Result<CheckoutSession, CheckoutError> {
        if self.reject_all {
            return Err(CheckoutError::Rejected("payment collaborator unavailable".into()));
        }
        let session_id = format!("cs_local_{:016x}", rand::thread_rng().next_u64());
        {
            let mut submitted = self.submitted.lock().await;
            if self.history > 0 {
                if submitted.len() >= self.history {
                    submitted.pop_front();
                }
                submitted.push_back(payment.clone());
            }
        }
        self.accepted.fetch_add(1, Ordering::Relaxed);
        tracing::info!(
            "Checkout session {} for {} ({:.2})",
            session_id,
            payment.user_name(),
            payment.total_cost()
        );
        Ok(CheckoutSession {
            session_id,
            url: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn restaurant_payment() -> PaymentData {
        PaymentData::Restaurant(RestaurantPayment {
            user_name: "Asha".into(),
            restaurant_id: "r1".into(),
            date_of_booking: NaiveDate::from_ymd_opt(2026, 5, 1).unwrap(),
            guest_count: 4,
            food_item: "Thali".into(),
            food_price: 50.0,
            food_count: 10,
        })
    }

    #[test]
    fn payment_data_is_tagged_by_kind() {
        let json = serde_json::to_value(restaurant_payment()).unwrap();
        assert_eq!(json["kind"], "restaurant");
        assert_eq!(json["restaurantId"], "r1");
        assert_eq!(json["dateOfBooking"], "2026-05-01");
        assert_eq!(restaurant_payment().total_cost(), 200.0);
    }

    #[tokio::test]
    async fn local_gateway_records_payments() {
        let gateway = LocalCheckoutGateway::new();
        let a = gateway.create_session(&restaurant_payment()).await.unwrap();
        let b = gateway.create_session(&restaurant_payment()).await.unwrap();
        assert_ne!(a.session_id, b.session_id);
        assert_eq!(gateway.submitted().await.len(), 2);
        assert_eq!(gateway.accepted(), 2);
    }

    #[tokio::test]
    async fn local_gateway_keeps_only_recent_payments() {
        let gateway = LocalCheckoutGateway::with_history(2);
        for guests in 1..=5 {
            let mut payment = restaurant_payment();
            if let PaymentData::Restaurant(p) = &mut payment {
                p.guest_count = guests;
            }
            gateway.create_session(&payment).await.unwrap();
        }
        assert_eq!(gateway.accepted(), 5);
        let kept: Vec<u32> = gateway
            .submitted()
            .await
            .iter()
            .filter_map(|p| match p {
                PaymentData::Restaurant(p) => Some(p.guest_count),
                PaymentData::Hotel(_) => None,
            })
            .collect();
        assert_eq!(kept, vec![4, 5]);
    }

    #[tokio::test]
    async fn unavailable_gateway_keeps_nothing() {
        let gateway = LocalCheckoutGateway::unavailable();
        assert!(gateway.create_session(&restaurant_payment()).await.is_err());
        assert!(gateway.submitted().await.is_empty());
        assert_eq!(gateway.accepted(), 0);
    }
}
