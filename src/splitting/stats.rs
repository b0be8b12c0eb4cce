use tracing::info;

/// Run counters accumulated by the splitter, reported at end of run.
#[derive(Debug, Clone, Copy, Default)]
pub struct SplitStats {
    pub utterances: usize,
    pub too_short: usize,
    pub chunks: usize,
    pub input_frames: usize,
    pub kept_frames: usize,
}

impl SplitStats {
    pub fn log_summary(&self) {
        let percent = if self.input_frames == 0 {
            0.0
        } else {
            100.0 * self.kept_frames as f64 / self.input_frames as f64
        };
        info!(
            utterances = self.utterances,
            too_short = self.too_short,
            chunks = self.chunks,
            "kept {} of {} input frames ({:.1}%)",
            self.kept_frames,
            self.input_frames,
            percent
        );
    }
}
