//! Well-known extension point names used by request-processing pipelines.
//!
//! A point is only usable once it appears in the `extensions.enabled` list of
//! the service configuration; these names merely document the conventional
//! slots around a request.

pub const PRE_REQUEST: &str = "preRequest";
pub const POST_REQUEST: &str = "postRequest";
pub const PRE_AUTH: &str = "preAuth";
pub const POST_AUTH: &str = "postAuth";
pub const PRE_VALIDATE: &str = "preValidate";
pub const POST_VALIDATE: &str = "postValidate";
pub const PRE_ALLOWED: &str = "preAllowed";
pub const POST_ALLOWED: &str = "postAllowed";
pub const PRE_HANDLER: &str = "preHandler";
pub const POST_HANDLER: &str = "postHandler";
pub const PRE_RESPONSE: &str = "preResponse";
pub const POST_RESPONSE: &str = "postResponse";

/// Every conventional point, in pipeline order.
pub const KNOWN: [&str; 12] = [
    PRE_REQUEST,
    POST_REQUEST,
    PRE_AUTH,
    POST_AUTH,
    PRE_VALIDATE,
    POST_VALIDATE,
    PRE_ALLOWED,
    POST_ALLOWED,
    PRE_HANDLER,
    POST_HANDLER,
    PRE_RESPONSE,
    POST_RESPONSE,
];

pub fn is_known(name: &str) -> bool {
    KNOWN.contains(&name)
}
