pub mod error;
pub mod fields;
pub mod geocode;
pub mod headers;
pub mod logging;
pub mod options;
pub mod pipeline;
pub mod row;
pub mod sink;
