use chrono::{DateTime, NaiveTime, Utc, Weekday};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{AppError, AppResult};

pub const WEEK: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Office {
    pub id: String,
    pub name: String,
    pub code: String,
    pub address_line_1: String,
    pub address_line_2: Option<String>,
    pub city: String,
    pub state: Option<String>,
    pub postal_code: String,
    pub country: String,
    pub timezone: String, // IANA name, e.g. America/New_York
    pub phone_number: Option<String>,
    pub email: Option<String>,
    pub notes: Option<String>,
    pub is_active: bool,
    pub order: i32,
    pub hours: Vec<OfficeHours>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct OfficeHours {
    pub day_of_week: Weekday,
    pub is_open: bool,
    pub opening_time: Option<NaiveTime>,
    pub closing_time: Option<NaiveTime>,
}

impl OfficeHours {
    pub fn open(day_of_week: Weekday, opening_time: NaiveTime, closing_time: NaiveTime) -> Self {
        OfficeHours {
            day_of_week,
            is_open: true,
            opening_time: Some(opening_time),
            closing_time: Some(closing_time),
        }
    }

    pub fn closed(day_of_week: Weekday) -> Self {
        OfficeHours {
            day_of_week,
            is_open: false,
            opening_time: None,
            closing_time: None,
        }
    }
}

impl Office {
    pub fn new(name: &str, code: &str, city: &str, postal_code: &str, timezone: &str) -> Self {
        Office {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            code: code.to_string(),
            address_line_1: String::new(),
            address_line_2: None,
            city: city.to_string(),
            state: None,
            postal_code: postal_code.to_string(),
            country: "USA".to_string(),
            timezone: timezone.to_string(),
            phone_number: None,
            email: None,
            notes: None,
            is_active: true,
            order: 0,
            hours: Vec::new(),
            created_at: Some(Utc::now()),
        }
    }

    pub fn hours_for(&self, day: Weekday) -> Option<&OfficeHours> {
        self.hours.iter().find(|h| h.day_of_week == day)
    }

    pub fn is_open_any_day(&self) -> bool {
        self.hours.iter().any(|h| h.is_open)
    }

    pub fn validate_hours(&self) -> AppResult<()> {
        for day in WEEK {
            let entries = self.hours.iter().filter(|h| h.day_of_week == day).count();
            if entries > 1 {
                return Err(AppError::ValidationError(format!(
                    "{} has more than one hours entry",
                    day
                )));
            }
        }

        for hours in self.hours.iter().filter(|h| h.is_open) {
            match (hours.opening_time, hours.closing_time) {
                (Some(open), Some(close)) if open < close => {}
                (Some(_), Some(_)) => {
                    return Err(AppError::ValidationError(format!(
                        "{}: opening time must be before closing time",
                        hours.day_of_week
                    )))
                }
                _ => {
                    return Err(AppError::ValidationError(format!(
                        "{}: open days need opening and closing times",
                        hours.day_of_week
                    )))
                }
            }
        }
        Ok(())
    }
}
