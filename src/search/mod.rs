pub mod tavily;

pub use tavily::{TavilyError, TavilySearch};
