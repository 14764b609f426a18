//! Collaborators the recipe screens talk to: device location, OS permissions,
//! alert dialogs, the maps app and the camera. Each is a trait so the view
//! models never reach for a global; the CLI wires in console/static stand-ins.

pub mod alerts;
pub mod camera;
pub mod location;
pub mod maps;
pub mod permissions;
