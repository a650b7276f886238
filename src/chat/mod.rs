pub mod expansion;
pub mod render;
pub mod view;

pub use view::ConversationView;
