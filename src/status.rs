/// Maps a GitHub Actions `(status, conclusion)` pair onto the gauge value
/// published for a run.
///
/// Rules, first match wins:
///
/// | condition                  | value |
/// |----------------------------|-------|
/// | conclusion == "success"    | 1     |
/// | conclusion == "skipped"    | 2     |
/// | status == "in_progress"    | 3     |
/// | status == "queued"         | 4     |
/// | anything else              | 0     |
///
/// 0 covers failure, cancelled, neutral, timed_out, an empty conclusion
/// and any value GitHub adds in the future. Failed and unknown runs are
/// therefore indistinguishable from the value alone; the raw status is
/// available as a label on `github_job`.
pub fn status_code(status: &str, conclusion: &str) -> f64 {
    match (status, conclusion) {
        (_, "success") => 1.0,
        (_, "skipped") => 2.0,
        ("in_progress", _) => 3.0,
        ("queued", _) => 4.0,
        _ => 0.0,
    }
}
