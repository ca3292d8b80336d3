pub mod admins;
pub mod manager;
pub mod pricing;
pub mod repository;
pub mod venue;

pub use admins::{AdminManager, AdminProfile};
pub use manager::{VenueManager, VenueView};
pub use pricing::PricingPolicy;
pub use repository::{InMemoryVenueRepository, VenueRepository};
pub use venue::{
    sport_key, Location, NewVenue, OpeningHours, PublicVenue, Sport, Venue, VenueUpdate,
    MAX_PRICE_PER_HOUR_CENTS,
};
