//! Count report lines logged by guards configured with `report_counts`.

use catchguard_types::Counts;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CountReport {
    pub local: Counts,
    pub global: Counts,
    /// The cumulative line is only emitted by the outermost reporting guard.
    pub outermost: bool,
}

impl CountReport {
    pub fn lines(&self) -> Vec<String> {
        let mut lines = vec![local_count_line(self.local.errors)];
        if self.outermost {
            lines.push(total_count_line(self.global.errors));
        }
        lines
    }
}

pub fn local_count_line(errors: u64) -> String {
    format!(
        "encountered {} error{} in the current context.",
        errors,
        plural(errors)
    )
}

pub fn total_count_line(errors: u64) -> String {
    format!("encountered {} total error{}.", errors, plural(errors))
}

fn plural(n: u64) -> &'static str {
    if n == 1 { "" } else { "s" }
}
