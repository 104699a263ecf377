mod operator;
mod pickup;
mod subscription;
mod support_ticket;
mod user;
mod waitlist;
mod webhook_event;

pub use operator::*;
pub use pickup::*;
pub use subscription::*;
pub use support_ticket::*;
pub use user::*;
pub use waitlist::*;
pub use webhook_event::*;
