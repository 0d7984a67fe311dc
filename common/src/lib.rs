pub mod bytes;
pub mod client;
pub mod clock;

pub use bytes::KeyBounds;
pub use client::config::SessionConfig;
pub use client::{
    BatchStatement, ClientError, ClientResult, CqlSession, CqlValue, Page, ResultSet, Row,
    Statement, StatementKind,
};
pub use clock::{Clock, WallClock};
