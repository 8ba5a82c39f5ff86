mod api;

pub use api::{AirtableClient, AirtableRecord};
