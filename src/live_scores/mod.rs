pub mod clock;
pub mod coordinator;
pub mod filter;
pub mod livescore;
pub mod provider;

pub use clock::{Clock, SystemClock};
pub use coordinator::ScoreCoordinator;
pub use filter::FilterOptions;
pub use livescore::LiveScoreApi;
pub use provider::ScoreProvider;
