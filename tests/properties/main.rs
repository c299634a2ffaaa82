//! Property-based tests for the codec, set operations and query parsing.

mod codec_props;
mod intersection_props;
mod query_props;
