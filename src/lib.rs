//! Lapida Trace — burial-record locator core.
//!
//! Finds a burial record by tolerant name matching against exact
//! life-dates, or by decoding the token printed on a physical marker,
//! then computes a walking route to the plot from a dynamically-chosen
//! origin: a consent-gated real location feed or a deterministic
//! simulated one, with a proximity fallback to the facility entrance.

pub mod geo;
pub mod location;
pub mod matcher;
pub mod records;
pub mod route;
pub mod search;
pub mod server;
pub mod token;

pub use geo::Coordinates;
pub use records::BurialRecord;
pub use route::{RouteCoordinator, RouteUpdate};
pub use search::{SearchOutcome, SearchQuery};
pub use token::DecodedToken;
