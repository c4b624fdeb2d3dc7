pub mod date_card;
pub mod match_record;
pub mod notification;

pub use date_card::{
    AppealDecision, AppealRequest, AppealStatus, DateCard, DateCardPatch, DateCardStatus,
    DateProposal, Decision, ParticipantResponse, ResponseStatus,
};
pub use match_record::{Match, MatchOrigin, MatchStatus};
pub use notification::{Notification, NotificationKind, NotificationPayload};
