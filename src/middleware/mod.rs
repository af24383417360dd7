/*
 * Responsibility
 * - Request-wrapping middleware exposed through JwtHandler
 */
pub mod auth;
