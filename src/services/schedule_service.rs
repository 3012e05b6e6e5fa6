use std::sync::Arc;

use chrono::{NaiveTime, Weekday};

use crate::{
    errors::{AppError, AppResult},
    models::domain::{office::WEEK, Office},
    repositories::OfficeRepository,
    services::certification_service::CertificationService,
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DaySchedule {
    pub day: Weekday,
    pub is_open: bool,
    pub opening_time: Option<NaiveTime>,
    pub closing_time: Option<NaiveTime>,
}

#[derive(Clone, Debug)]
pub struct OfficeSchedule {
    pub office: Office,
    /// Monday through Sunday. Days without an hours entry are closed.
    pub week: Vec<DaySchedule>,
}

impl OfficeSchedule {
    pub fn from_office(office: Office) -> Self {
        let week = WEEK
            .iter()
            .map(|&day| match office.hours_for(day) {
                Some(hours) if hours.is_open => DaySchedule {
                    day,
                    is_open: true,
                    opening_time: hours.opening_time,
                    closing_time: hours.closing_time,
                },
                _ => DaySchedule {
                    day,
                    is_open: false,
                    opening_time: None,
                    closing_time: None,
                },
            })
            .collect();
        Self { office, week }
    }
}

/// Every read of office schedules goes through here and checks
/// certification first. There is no bypass for any role.
pub struct ScheduleService {
    certification: Arc<CertificationService>,
    offices: Arc<dyn OfficeRepository>,
}

impl ScheduleService {
    pub fn new(certification: Arc<CertificationService>, offices: Arc<dyn OfficeRepository>) -> Self {
        Self {
            certification,
            offices,
        }
    }

    async fn authorize(&self, user_id: &str) -> AppResult<()> {
        if !self.certification.can_view_schedule(user_id).await? {
            log::info!("Schedule access denied for uncertified user {}", user_id);
            return Err(AppError::NotCertified);
        }
        Ok(())
    }

    pub async fn list_schedules(&self, user_id: &str) -> AppResult<Vec<OfficeSchedule>> {
        self.authorize(user_id).await?;

        let offices = self.offices.list_active().await?;
        Ok(offices.into_iter().map(OfficeSchedule::from_office).collect())
    }

    pub async fn office_schedule(&self, user_id: &str, office_id: &str) -> AppResult<OfficeSchedule> {
        self.authorize(user_id).await?;

        let office = self
            .offices
            .find_by_id(office_id)
            .await?
            .filter(|o| o.is_active)
            .ok_or_else(|| AppError::NotFound(format!("Office with id '{}' not found", office_id)))?;
        Ok(OfficeSchedule::from_office(office))
    }
}
