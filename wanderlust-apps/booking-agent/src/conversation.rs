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

//! # Booking Conversation Driver
//!
//! Owns one conversation: feeds user input through the pure flow and runs the
//! search and checkout effects it asks for, against a [`Catalog`] and a
//! [`CheckoutGateway`].

use std::sync::Arc;

use thiserror::Error;

use crate::booking_flow::{
    Effect, EffectOutcome, FlowContext, FlowState, StepId, Transition, resume, transition,
};
use crate::booking_flow_prompts::{Prompt, render};
use crate::catalog::Catalog;
use crate::checkout::CheckoutGateway;
use crate::search_query_builder::SearchFilter;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConversationError {
    #[error("the conversation is closed")]
    Closed,
}

pub struct BookingConversation {
    catalog: Arc<dyn Catalog>,
    checkout: Arc<dyn CheckoutGateway>,
    ctx: FlowContext,
    state: FlowState,
    step: StepId,
    closed: bool,
}

impl BookingConversation {
    pub fn new(
        catalog: Arc<dyn Catalog>,
        checkout: Arc<dyn CheckoutGateway>,
        ctx: FlowContext,
    ) -> Self {
        Self {
            catalog,
            checkout,
            state: FlowState::new(&ctx),
            ctx,
            step: StepId::Start,
            closed: false,
        }
    }

    pub fn step(&self) -> StepId {
        self.step
    }

    pub fn state(&self) -> &FlowState {
        &self.state
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// The prompt for the current step
    pub fn current(&self) -> Prompt {
        render(&self.ctx, &self.state, self.step)
    }

    /// Apply one user input. Returns the prompts to show, in order: the step
    /// reached, followed by any step it advances through on its own. Quitting
    /// returns no prompts and closes the conversation.
    pub async fn submit(&mut self, input: &str) -> Result<Vec<Prompt>, ConversationError> {
        if self.closed {
            return Err(ConversationError::Closed);
        }
        let state = std::mem::replace(&mut self.state, FlowState::new(&self.ctx));
        let (transition, state) = transition(&self.ctx, state, self.step, input);
        self.state = state;

        match transition {
            Transition::Goto(next) => self.step = next,
            Transition::Stay => {}
            Transition::Perform(effect) => {
                let outcome = self.perform(effect).await;
                let state = std::mem::replace(&mut self.state, FlowState::new(&self.ctx));
                let (next, state) = resume(state, self.step, outcome);
                self.state = state;
                self.step = next;
            }
            Transition::Quit => {
                tracing::debug!("Conversation with {} closed", self.state.draft.user_name);
                self.closed = true;
                return Ok(Vec::new());
            }
        }

        let mut prompts = vec![self.current()];
        while let Some(next) = self.step.auto_next() {
            self.state.notice = None;
            self.step = next;
            prompts.push(self.current());
        }
        Ok(prompts)
    }

    async fn perform(&self, effect: Effect) -> EffectOutcome {
        match effect {
            Effect::SearchHotels { text, page } => {
                let filter = SearchFilter::for_destination(&text);
                match self.catalog.search_hotels(&filter, page).await {
                    Ok(result) => EffectOutcome::Hotels(result.data),
                    Err(e) => {
                        tracing::warn!("Hotel search for {:?} failed: {}", text, e);
                        EffectOutcome::SearchFailed
                    }
                }
            }
            Effect::SearchRestaurants { text, page } => {
                let filter = SearchFilter::for_destination(&text);
                match self.catalog.search_restaurants(&filter, page).await {
                    Ok(result) => EffectOutcome::Restaurants(result.data),
                    Err(e) => {
                        tracing::warn!("Restaurant search for {:?} failed: {}", text, e);
                        EffectOutcome::SearchFailed
                    }
                }
            }
            Effect::Checkout(payment) => match self.checkout.create_session(&payment).await {
                Ok(session) => {
                    tracing::info!("Booking saved, checkout session {}", session.session_id);
                    EffectOutcome::CheckoutSaved(session)
                }
                Err(e) => {
                    tracing::warn!("Checkout failed: {}", e);
                    EffectOutcome::CheckoutFailed
                }
            },
        }
    }
}
