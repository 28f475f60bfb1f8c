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

//! Shared server state

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use rand::RngCore;
use tokio::sync::{Mutex, RwLock};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use wanderlust_chat_rooms::ChatRooms;

use crate::booking_flow::FlowContext;
use crate::booking_flow_prompts::Prompt;
use crate::catalog::InMemoryCatalog;
use crate::checkout::{CheckoutGateway, HttpCheckoutGateway, LocalCheckoutGateway};
use crate::config::{AppConfig, DEFAULT_MAX_SESSIONS, DEFAULT_SESSION_IDLE_SECS};
use crate::conversation::BookingConversation;
use crate::live_chat::ChatFrame;
use crate::validation::UserProfile;

pub type SharedState = Arc<AppState>;

pub type SessionHandle = Arc<Mutex<BookingConversation>>;

struct Session {
    conversation: SessionHandle,
    last_active: Instant,
}

pub struct AppState {
    pub catalog: Arc<InMemoryCatalog>,
    pub checkout: Arc<dyn CheckoutGateway>,
    sessions: RwLock<HashMap<String, Session>>,
    session_idle: Duration,
    max_sessions: usize,
    pub users: RwLock<HashMap<String, UserProfile>>,
    pub chat_rooms: ChatRooms<ChatFrame>,
    pub shutdown: CancellationToken,
    /// Pinned calendar day for conversations; the local date when unset
    today: Option<NaiveDate>,
}

impl AppState {
    pub fn new(catalog: Arc<InMemoryCatalog>, checkout: Arc<dyn CheckoutGateway>) -> Self {
        Self {
            catalog,
            checkout,
            sessions: RwLock::default(),
            session_idle: Duration::from_secs(DEFAULT_SESSION_IDLE_SECS),
            max_sessions: DEFAULT_MAX_SESSIONS,
            users: RwLock::default(),
            chat_rooms: ChatRooms::new(),
            shutdown: CancellationToken::new(),
            today: None,
        }
    }

    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    /// Sessions idle longer than `idle` are swept; at most `max_sessions` are kept
    pub fn with_session_limits(mut self, idle: Duration, max_sessions: usize) -> Self {
        self.session_idle = idle;
        self.max_sessions = max_sessions.max(1);
        self
    }

    pub async fn from_config(config: &AppConfig) -> Result<Self> {
        let catalog = InMemoryCatalog::load(&config.catalog_path)
            .await
            .context("Failed to load catalog")?;
        let checkout: Arc<dyn CheckoutGateway> = match &config.checkout_url {
            Some(url) => {
                tracing::info!("Forwarding checkouts to {}", url);
                Arc::new(
                    HttpCheckoutGateway::new(url.as_str(), config.checkout_timeout_secs)
                        .context("Failed to create checkout client")?,
                )
            }
            None => {
                tracing::info!("No checkout URL configured, minting sessions locally");
                Arc::new(LocalCheckoutGateway::new())
            }
        };
        Ok(Self::new(Arc::new(catalog), checkout).with_session_limits(
            Duration::from_secs(config.session_idle_secs),
            config.max_sessions,
        ))
    }

    pub fn flow_context(&self) -> FlowContext {
        self.today
            .map_or_else(FlowContext::today_local, FlowContext::new)
    }

    /// Start a conversation and return its id with the opening prompt
    pub async fn open_conversation(&self) -> (String, Prompt) {
        let conversation = BookingConversation::new(
            self.catalog.clone(),
            self.checkout.clone(),
            self.flow_context(),
        );
        let opening = conversation.current();
        let id = {
            let mut rng = rand::thread_rng();
            format!("{:016x}{:016x}", rng.next_u64(), rng.next_u64())
        };
        let session = Session {
            conversation: Arc::new(Mutex::new(conversation)),
            last_active: Instant::now(),
        };
        let mut sessions = self.sessions.write().await;
        if sessions.len() >= self.max_sessions {
            let oldest = sessions
                .iter()
                .min_by_key(|(_, s)| s.last_active)
                .map(|(id, _)| id.clone());
            if let Some(oldest) = oldest {
                sessions.remove(&oldest);
                tracing::info!("Session store full, evicted conversation {}", oldest);
            }
        }
        sessions.insert(id.clone(), session);
        tracing::debug!("Opened conversation {}", id);
        (id, opening)
    }

    /// Look up a conversation and mark it active
    pub async fn conversation(&self, id: &str) -> Option<SessionHandle> {
        let mut sessions = self.sessions.write().await;
        let session = sessions.get_mut(id)?;
        session.last_active = Instant::now();
        Some(session.conversation.clone())
    }

    pub async fn close_conversation(&self, id: &str) -> bool {
        self.sessions.write().await.remove(id).is_some()
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Drop sessions idle for longer than the configured timeout.
    /// Returns how many were dropped.
    pub async fn evict_idle_sessions(&self) -> usize {
        let now = Instant::now();
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, s| now.duration_since(s.last_active) <= self.session_idle);
        before - sessions.len()
    }

    /// Sweep idle sessions every `period` until shutdown
    pub async fn sweep_sessions(self: Arc<Self>, period: Duration) {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => break,
                _ = interval.tick() => {
                    let evicted = self.evict_idle_sessions().await;
                    if evicted > 0 {
                        tracing::info!("Evicted {} idle conversations", evicted);
                    }
                }
            }
        }
        tracing::debug!("Session sweeper stopped");
    }
}
