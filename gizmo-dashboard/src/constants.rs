//! Application-wide constants
//!
//! Single source of truth for configuration defaults.

/// Default values for dashboard configuration
pub mod defaults {
    /// Address the dashboard listens on
    pub const BIND_ADDRESS: &str = "127.0.0.1:5006";
    /// Simulated work per node computation, in milliseconds
    pub const COMPUTE_DELAY_MS: u64 = 3000;
    /// Spinner width and height, in pixels
    pub const SPINNER_SIZE: u32 = 20;
}

/// Dashboard page refresh
pub mod polling {
    /// How often the page re-reads `/api/dashboard`, in milliseconds
    pub const REFRESH_MS: u64 = 500;
}
