pub mod columns;
pub mod deserializers;
pub mod pipeline;
pub mod sanitize;
pub mod types;

pub use pipeline::{read_ticket_table, read_ticket_table_reader, TableOutput};
pub use types::{EnrichedTicket, FieldAvailability, ParseWarning, RawTicket};
