use bookindoor_booking::{
    AvailabilityChecker, BookingRepository, BookingWriter, CheckoutSettings, PaymentPreparer,
    PaymentReconciler, StatsService,
};
use bookindoor_catalog::{AdminManager, PricingPolicy, VenueManager, VenueRepository};
use bookindoor_core::clock::Clock;
use bookindoor_core::identity::TokenVerifier;
use bookindoor_core::notify::BookingNotifier;
use bookindoor_core::payment::MerchantCredentials;
use bookindoor_core::repository::AdminRepository;
use std::sync::Arc;

/// Storage and outbound adapters the services are built on.
pub struct Backends {
    pub venues: Arc<dyn VenueRepository>,
    pub bookings: Arc<dyn BookingRepository>,
    pub admins: Arc<dyn AdminRepository>,
    pub notifier: Arc<dyn BookingNotifier>,
    pub tokens: Arc<dyn TokenVerifier>,
    pub clock: Arc<dyn Clock>,
}

#[derive(Clone)]
pub struct PaymentSettings {
    pub credentials: MerchantCredentials,
    pub checkout: CheckoutSettings,
}

#[derive(Clone)]
pub struct AppState {
    pub venues: Arc<VenueManager>,
    pub admins: Arc<AdminManager>,
    pub availability: Arc<AvailabilityChecker>,
    pub writer: Arc<BookingWriter>,
    pub payments: Arc<PaymentPreparer>,
    pub reconciler: Arc<PaymentReconciler>,
    pub stats: Arc<StatsService>,
    pub tokens: Arc<dyn TokenVerifier>,
    pub pricing: PricingPolicy,
}

impl AppState {
    pub fn new(backends: Backends, payment: PaymentSettings, pricing: PricingPolicy) -> Self {
        let Backends {
            venues,
            bookings,
            admins,
            notifier,
            tokens,
            clock,
        } = backends;

        let availability = Arc::new(AvailabilityChecker::new(venues.clone(), bookings.clone()));

        Self {
            venues: Arc::new(VenueManager::new(venues.clone(), admins.clone(), clock.clone())),
            admins: Arc::new(AdminManager::new(admins.clone(), venues.clone(), clock.clone())),
            writer: Arc::new(BookingWriter::new(
                availability.clone(),
                bookings.clone(),
                pricing,
                clock.clone(),
            )),
            payments: Arc::new(PaymentPreparer::new(
                bookings.clone(),
                payment.credentials.clone(),
                payment.checkout,
                pricing,
            )),
            reconciler: Arc::new(PaymentReconciler::new(
                bookings.clone(),
                venues.clone(),
                admins.clone(),
                notifier,
                payment.credentials,
                clock.clone(),
            )),
            stats: Arc::new(StatsService::new(bookings, venues, admins, clock)),
            availability,
            tokens,
            pricing,
        }
    }
}
