pub mod time;
pub mod web_search;

pub use time::AgentToolTime;
pub use web_search::AgentToolWebSearch;
