/// Router Module Index
///
/// Splits the routing table by access level. Authentication is applied once, as
/// a layer over the whole `authenticated` router, so no protected endpoint can be
/// registered without it.

/// Routes open to anonymous clients: job search, registration, user listing.
pub mod public;

/// Routes behind the `AuthUser` extractor middleware.
/// Ownership and role checks still happen inside each handler.
pub mod authenticated;
