mod chat;
mod ids;
mod session;
mod user;

pub use ids::{ParseIdError, SessionId, UserId};

pub use chat::{ChatMessage, ChatRole, latest_user_message};
pub use session::{
    CounterDelta, DEFAULT_SUBJECT, LearningSession, LearningSessionError, POINTS_PER_SOLVE,
    SessionStats,
};
pub use user::{FALLBACK_DISPLAY_NAME, Language, NewUser, User, UserError};
