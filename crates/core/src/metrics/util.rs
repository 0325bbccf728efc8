use crate::model::CpuCoreCounters;

/// Point-in-time utilization of one core over one sampling interval.
///
/// Returns `None` when either snapshot failed to parse. Counters running
/// backwards (reset after hot-plug, or index reuse) floor to `0.0` rather
/// than producing a negative or wrapped value, and a zero total delta
/// reads as fully idle. The result is clamped to `[0.0, 100.0]`.
pub fn utilization(prev: &CpuCoreCounters, curr: &CpuCoreCounters) -> Option<f64> {
    if !prev.parsed_ok || !curr.parsed_ok {
        return None;
    }

    let prev_idle = prev.idle_time();
    let curr_idle = curr.idle_time();
    let prev_total = prev.total_time();
    let curr_total = curr.total_time();

    if curr_total < prev_total || curr_idle < prev_idle {
        return Some(0.0);
    }

    let total_delta = curr_total - prev_total;
    if total_delta == 0 {
        return Some(0.0);
    }
    let idle_delta = curr_idle - prev_idle;
    let busy_delta = total_delta.saturating_sub(idle_delta);

    let pct = busy_delta as f64 * 100.0 / total_delta as f64;
    Some(pct.clamp(0.0, 100.0))
}
