use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{optional_text, require_text, validate_price, CoreError, CoreResult};

pub const DEFAULT_CATEGORY: &str = "general";
pub const DEFAULT_RESPONSE_TIME_HOURS: i32 = 24;

/// Public business profile owned 1:1 by a provider user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderProfile {
    pub id: i64,
    pub user_id: i64,
    pub business_name: String,
    pub category: String,
    pub bio: String,
    pub location_city: String,
    pub location_region: String,
    pub hourly_rate: Option<Decimal>,
    pub daily_rate: Option<Decimal>,
    pub verified: bool,
    pub response_time_hours: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewProviderProfile {
    pub business_name: String,
    pub category: String,
    pub bio: String,
    pub location_city: String,
    pub location_region: String,
}

impl NewProviderProfile {
    pub fn new(
        business_name: Option<String>,
        category: Option<String>,
        location_city: Option<String>,
        location_region: Option<String>,
    ) -> CoreResult<Self> {
        let business_name = require_text("businessName", business_name.as_deref().unwrap_or(""))?;
        Ok(Self {
            business_name,
            category: optional_text(category)
                .map(|c| c.to_ascii_lowercase())
                .unwrap_or_else(|| DEFAULT_CATEGORY.to_string()),
            bio: String::new(),
            location_city: optional_text(location_city).unwrap_or_default(),
            location_region: optional_text(location_region).unwrap_or_default(),
        })
    }
}

/// Partial update from the provider's settings page. `None` keeps the stored value.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderProfileUpdate {
    pub business_name: Option<String>,
    pub category: Option<String>,
    pub bio: Option<String>,
    pub location_city: Option<String>,
    pub location_region: Option<String>,
    pub hourly_rate: Option<Decimal>,
    pub daily_rate: Option<Decimal>,
    pub response_time_hours: Option<i32>,
}

impl ProviderProfileUpdate {
    pub fn validate(&self) -> CoreResult<()> {
        if let Some(name) = &self.business_name {
            require_text("businessName", name)?;
        }
        for (field, rate) in [("hourlyRate", self.hourly_rate), ("dailyRate", self.daily_rate)] {
            if let Some(rate) = rate {
                validate_price(field, rate)?;
            }
        }
        if matches!(self.response_time_hours, Some(h) if h < 0) {
            return Err(CoreError::validation("responseTimeHours cannot be negative"));
        }
        Ok(())
    }

    pub fn apply(&self, profile: &mut ProviderProfile) {
        if let Some(v) = &self.business_name {
            profile.business_name = v.trim().to_string();
        }
        if let Some(v) = &self.category {
            profile.category = v.trim().to_ascii_lowercase();
        }
        if let Some(v) = &self.bio {
            profile.bio = v.clone();
        }
        if let Some(v) = &self.location_city {
            profile.location_city = v.trim().to_string();
        }
        if let Some(v) = &self.location_region {
            profile.location_region = v.trim().to_string();
        }
        if self.hourly_rate.is_some() {
            profile.hourly_rate = self.hourly_rate;
        }
        if self.daily_rate.is_some() {
            profile.daily_rate = self.daily_rate;
        }
        if let Some(h) = self.response_time_hours {
            profile.response_time_hours = h;
        }
    }
}

/// Browse filters. Matching is case-insensitive; `query` looks at business name and bio.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProviderSearch {
    pub category: Option<String>,
    pub city: Option<String>,
    #[serde(rename = "q")]
    pub query: Option<String>,
}

impl ProviderSearch {
    pub fn normalized(self) -> Self {
        Self {
            category: optional_text(self.category).map(|c| c.to_ascii_lowercase()),
            city: optional_text(self.city),
            query: optional_text(self.query),
        }
    }

    pub fn matches(&self, profile: &ProviderProfile) -> bool {
        let contains = |haystack: &str, needle: &str| {
            haystack.to_lowercase().contains(&needle.to_lowercase())
        };
        if let Some(category) = &self.category {
            if !profile.category.eq_ignore_ascii_case(category) {
                return false;
            }
        }
        if let Some(city) = &self.city {
            if !profile.location_city.eq_ignore_ascii_case(city) {
                return false;
            }
        }
        if let Some(q) = &self.query {
            if !contains(&profile.business_name, q) && !contains(&profile.bio, q) {
                return false;
            }
        }
        true
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    pub id: i64,
    pub provider_id: i64,
    pub name: String,
    pub description: String,
    pub price: Option<Decimal>,
    pub category: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewService {
    pub provider_id: i64,
    pub name: String,
    pub description: String,
    pub price: Option<Decimal>,
    pub category: String,
}

impl NewService {
    /// `fallback_category` is used when the service does not name its own,
    /// normally the provider's category.
    pub fn new(
        provider_id: i64,
        name: Option<String>,
        description: Option<String>,
        price: Option<Decimal>,
        category: Option<String>,
        fallback_category: &str,
    ) -> CoreResult<Self> {
        let name = require_text("name", name.as_deref().unwrap_or(""))?;
        let price = price.map(|p| validate_price("price", p)).transpose()?;
        Ok(Self {
            provider_id,
            name,
            description: optional_text(description).unwrap_or_default(),
            price,
            category: optional_text(category)
                .map(|c| c.to_ascii_lowercase())
                .unwrap_or_else(|| fallback_category.to_string()),
        })
    }
}
