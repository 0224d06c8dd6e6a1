mod link;
mod visit;

pub use link::{CreateLinkRequest, LinkResponse, TrackingLink};
pub use visit::{IpInfo, NewVisit, Visit, VisitWithLink};
