pub const DEFAULT_PUSH_HOUR: u32 = 7;
pub const DEFAULT_PUSH_WINDOW_MINUTES: i64 = 7;

#[derive(Debug, Clone)]
/// Pipeline settings, passed in explicitly at construction. Nothing in the
/// pipeline reads ambient environment state.
pub struct PipelineConfig {
    /// Local hour (0-23) the daily push is centered on.
    pub push_hour: u32,
    /// Half-width of the push window, in minutes.
    pub push_window_minutes: i64,
    /// Model override forwarded to the generator; `None` uses the
    /// generator's default.
    pub model: Option<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            push_hour: DEFAULT_PUSH_HOUR,
            push_window_minutes: DEFAULT_PUSH_WINDOW_MINUTES,
            model: None,
        }
    }
}
