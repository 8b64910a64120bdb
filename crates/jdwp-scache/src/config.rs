use jdwp_wire::id_sizes::IdSizes;

/// Frames of a single stack trace speculated on by default
pub const DEFAULT_MAX_SPECULATED_FRAMES: usize = 41;

/// Configuration of a cache session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SCacheConfig {
    /// When false, every packet is passed through untouched
    pub enabled: bool,
    /// Only this many frames of a Frames reply are speculated on
    pub max_speculated_frames: usize,
    /// Id widths assumed until the VM answers an IDSizes command
    pub initial_id_sizes: IdSizes,
}

impl SCacheConfig {
    /// A configuration that never caches
    pub fn bypass() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }
}

impl Default for SCacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_speculated_frames: DEFAULT_MAX_SPECULATED_FRAMES,
            initial_id_sizes: IdSizes::default(),
        }
    }
}
