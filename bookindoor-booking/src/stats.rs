use bookindoor_catalog::VenueRepository;
use bookindoor_core::clock::Clock;
use bookindoor_core::identity::{Identity, Role};
use bookindoor_core::repository::AdminRepository;
use bookindoor_core::{CoreError, CoreResult};
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use uuid::Uuid;

use crate::models::Booking;
use crate::repository::BookingRepository;

const WEEK_DAYS: i64 = 7;
const MONTH_DAYS: i64 = 30;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WindowSummary {
    pub income_cents: i64,
    pub total_bookings: u64,
    pub sports: BTreeMap<String, u64>,
}

impl WindowSummary {
    /// Saturates rather than wrapping.
    fn add(&mut self, booking: &Booking) {
        self.income_cents = self.income_cents.saturating_add(booking.amount_cents);
        self.total_bookings += 1;
        *self.sports.entry(booking.sport_name.clone()).or_insert(0) += 1;
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WindowedSummary {
    pub week: WindowSummary,
    pub month: WindowSummary,
    pub all_time: WindowSummary,
}

/// Aggregates paid, non-cancelled bookings into week / month / all-time windows.
/// Income is the amount stored on each booking, never a recomputed price.
pub fn summarize<'a, I>(bookings: I, now: DateTime<Utc>) -> WindowedSummary
where
    I: IntoIterator<Item = &'a Booking>,
{
    let week_start = now - Duration::days(WEEK_DAYS);
    let month_start = now - Duration::days(MONTH_DAYS);

    let mut summary = WindowedSummary::default();
    for booking in bookings.into_iter().filter(|b| b.is_revenue()) {
        summary.all_time.add(booking);
        if booking.created_at >= month_start {
            summary.month.add(booking);
        }
        if booking.created_at >= week_start {
            summary.week.add(booking);
        }
    }
    summary
}

#[derive(Debug, Clone, Serialize)]
pub struct VenueSummary {
    pub venue_id: Uuid,
    pub venue_name: String,
    #[serde(flatten)]
    pub summary: WindowedSummary,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlatformTotals {
    pub total_admins: u64,
    pub total_venues: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatsReport {
    pub venue_id: Option<Uuid>,
    #[serde(flatten)]
    pub summary: WindowedSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub venues: Option<Vec<VenueSummary>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub totals: Option<PlatformTotals>,
}

/// Role-gated read over paid bookings. Never touches the write path.
pub struct StatsService {
    bookings: Arc<dyn BookingRepository>,
    venues: Arc<dyn VenueRepository>,
    admins: Arc<dyn AdminRepository>,
    clock: Arc<dyn Clock>,
}

impl StatsService {
    pub fn new(
        bookings: Arc<dyn BookingRepository>,
        venues: Arc<dyn VenueRepository>,
        admins: Arc<dyn AdminRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            bookings,
            venues,
            admins,
            clock,
        }
    }

    pub async fn report(&self, identity: &Identity, venue: Option<Uuid>) -> CoreResult<StatsReport> {
        let now = self.clock.now();

        match identity.role {
            Role::User => Err(CoreError::forbidden("Stats are available to venue admins only")),
            Role::Admin => self.admin_report(identity, venue, now).await,
            Role::SuperAdmin => self.platform_report(venue, now).await,
        }
    }

    async fn admin_report(
        &self,
        identity: &Identity,
        venue: Option<Uuid>,
        now: DateTime<Utc>,
    ) -> CoreResult<StatsReport> {
        let owned: Vec<Uuid> = self
            .venues
            .list_by_owner(identity.id)
            .await?
            .into_iter()
            .map(|v| v.id)
            .collect();

        let scope = match venue {
            Some(id) => {
                self.ensure_venue_exists(id).await?;
                if !owned.contains(&id) {
                    return Err(CoreError::forbidden("Venue belongs to another admin"));
                }
                vec![id]
            }
            None => owned,
        };

        let bookings = self.bookings.list_paid(Some(scope.as_slice())).await?;
        Ok(StatsReport {
            venue_id: venue,
            summary: summarize(&bookings, now),
            venues: None,
            totals: None,
        })
    }

    async fn platform_report(&self, venue: Option<Uuid>, now: DateTime<Utc>) -> CoreResult<StatsReport> {
        if let Some(id) = venue {
            self.ensure_venue_exists(id).await?;
            let bookings = self.bookings.list_paid(Some(&[id][..])).await?;
            return Ok(StatsReport {
                venue_id: Some(id),
                summary: summarize(&bookings, now),
                venues: None,
                totals: None,
            });
        }

        let bookings = self.bookings.list_paid(None).await?;
        let venues = self.venues.list_venues().await?;

        let mut by_venue: HashMap<Uuid, Vec<&Booking>> = HashMap::new();
        for booking in &bookings {
            by_venue.entry(booking.venue_id).or_default().push(booking);
        }

        let breakdown = venues
            .iter()
            .map(|v| VenueSummary {
                venue_id: v.id,
                venue_name: v.name.clone(),
                summary: summarize(by_venue.get(&v.id).into_iter().flatten().copied(), now),
            })
            .collect();

        Ok(StatsReport {
            venue_id: None,
            summary: summarize(&bookings, now),
            venues: Some(breakdown),
            totals: Some(PlatformTotals {
                total_admins: self.admins.count_admins().await?,
                total_venues: self.venues.count_venues().await?,
            }),
        })
    }

    async fn ensure_venue_exists(&self, id: Uuid) -> CoreResult<()> {
        match self.venues.get_venue(id).await? {
            Some(_) => Ok(()),
            None => Err(CoreError::not_found(format!("Venue {}", id))),
        }
    }
}
