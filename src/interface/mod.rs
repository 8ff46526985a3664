pub mod processor;
pub mod record;
