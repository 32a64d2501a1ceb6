/// Unread-notification badge polling.
pub mod notifications;
/// Client-side search, filter and highlight over the ticket table.
pub mod table_filter;

pub use notifications::{Badge, NotificationPoller};
pub use table_filter::{FilterQuery, SelectFilter, TicketRow, TicketTable};
