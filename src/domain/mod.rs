//! Marketplace entities and their state machines
//!
//! Everything in this module is pure: operations take `now` explicitly and
//! never touch storage.

pub mod account;
pub mod experience;
pub mod intro;
pub mod invite;
pub mod profile;
pub mod role;
pub mod shortlist;
pub mod tag;

pub use account::{expiry, generate_token, hash_token, Account, Caller, PasswordHash, Session};
pub use experience::{PastRole, RoleDetails};
pub use intro::{IntroDecision, IntroRequest, IntroStatus, TransitionError};
pub use invite::{Invite, InviteError, InviteStatus};
pub use profile::{
    Availability, CurationStatus, FounderProfile, TalentProfile, MAX_RATING, MIN_RATING,
};
pub use role::Role;
pub use shortlist::ShortlistEntry;
pub use tag::Tag;
