pub mod slug;

pub use slug::normalize_topic;
