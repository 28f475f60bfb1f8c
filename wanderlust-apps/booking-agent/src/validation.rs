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

//! Registration payload checks, reported per field

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap());

pub const MIN_MOBILE_LEN: usize = 8;
pub const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Clone, Default, Deserialize)]
#[cfg_attr(feature = "server", derive(schemars::JsonSchema))]
#[serde(rename_all = "camelCase", default)]
pub struct RegistrationRequest {
    pub email: String,
    pub mobile: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "server", derive(schemars::JsonSchema))]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

/// A registered account as returned to clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "server", derive(schemars::JsonSchema))]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub email: String,
    pub mobile: String,
    pub first_name: String,
    pub last_name: String,
    pub is_blocked: bool,
    pub role: Vec<String>,
}

impl RegistrationRequest {
    /// Every failing field is reported, in declaration order
    pub fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut errors = Vec::new();
        if !EMAIL_RE.is_match(self.email.trim()) {
            errors.push(FieldError::new("email", "Invalid email"));
        }
        if self.mobile.chars().count() < MIN_MOBILE_LEN {
            errors.push(FieldError::new(
                "mobile",
                format!("Mobile number must contain at least {MIN_MOBILE_LEN} characters"),
            ));
        }
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            errors.push(FieldError::new(
                "password",
                format!("Password must contain at least {MIN_PASSWORD_LEN} characters"),
            ));
        }
        if self.first_name.trim().is_empty() {
            errors.push(FieldError::new("firstName", "First name is required"));
        }
        if self.last_name.trim().is_empty() {
            errors.push(FieldError::new("lastName", "Last name is required"));
        }
        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }

    pub fn into_profile(self) -> UserProfile {
        UserProfile {
            email: self.email.trim().to_lowercase(),
            mobile: self.mobile,
            first_name: self.first_name,
            last_name: self.last_name,
            is_blocked: false,
            role: vec!["user".to_string()],
        }
    }
}
