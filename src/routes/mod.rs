/// Router Module Index
///
/// Organizes the application's routing into security-segregated modules. Each
/// module maps to one access tier, and the tier's requirements are applied as
/// router layers in `create_router`, never inside handlers, so a route
/// cannot be registered without its gate.

/// Routes accessible without credentials: health probe, register, login.
pub mod public;

/// Routes requiring a valid bearer token, any role.
pub mod authenticated;

/// Routes requiring the admin or editor role (post authoring).
pub mod editorial;

/// Routes restricted exclusively to the admin role.
pub mod admin;
