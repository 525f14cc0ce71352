//! Built-in middleware stages.
//!
//! These stages cover the concerns every Proteus server carries: CORS,
//! request body size limits, and body parsing. They are ordinary
//! [`crate::Middleware`] implementations and can be combined with
//! user-defined stages in any order, though the server composes them as
//! CORS, then body limit, then body parser.

pub mod body_limit;
pub mod body_parser;
pub mod cors;

pub use body_limit::BodyLimitMiddleware;
pub use body_parser::BodyParserMiddleware;
pub use cors::{AllowedOrigins, CorsBuilder, CorsMiddleware};
