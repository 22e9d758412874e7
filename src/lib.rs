// Library surface for headless/integration tests and reuse.
// Keep this lean to avoid coupling to bin-only types in main.rs.
pub mod breath;
pub mod clock;
pub mod engine;
pub mod events;
pub mod fade;
pub mod gate;
pub mod layout;
pub mod render;
pub mod runtime;
pub mod session;
pub mod store;
pub mod util;
