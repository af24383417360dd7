/*!
 * Request-scoped authentication context
 *
 * Responsibility:
 * - Carry the signed token, parsed claims and subject from a wrapper to the
 *   handlers behind it, within one request
 * - Types and accessors live in types; the axum extractor lives in core
 *
 * Public API:
 * - RequestContext, ContextKey, ContextValue
 * - signed_token_from_context, token_from_context, subject_from_token, subject_from_context
 * - AuthContext (extractor)
 */

mod core;
mod types;

pub use self::core::AuthContext;
pub use self::types::{
    ContextKey, ContextValue, RequestContext, signed_token_from_context, subject_from_context,
    subject_from_token, token_from_context,
};
