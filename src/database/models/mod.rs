pub mod embed;
pub mod group;
pub mod invite;
pub mod organization;
pub mod user;
pub mod variant;

pub use embed::Embed;
pub use group::Group;
pub use invite::Invite;
pub use organization::Organization;
pub use user::User;
pub use variant::Variant;
