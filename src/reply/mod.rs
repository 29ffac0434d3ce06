mod accepted_reply;
pub use accepted_reply::*;

mod rejected_reply;
pub use rejected_reply::*;

mod reply_body;
pub use reply_body::*;
