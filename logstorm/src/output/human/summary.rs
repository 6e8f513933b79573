use std::fmt::Write as _;

use logstorm_core::runner::{Report, Share};

use super::format::*;

pub(crate) fn render(report: &Report) -> String {
    let mut out = String::new();

    out.push_str("\nsummary\n");
    writeln!(
        &mut out,
        "  elapsed: {}",
        format_duration(std::time::Duration::from_secs_f64(report.elapsed_secs.max(0.0)))
    )
    .ok();
    writeln!(&mut out, "  requests: {}", report.total_requests).ok();
    writeln!(
        &mut out,
        "  success: {} ({})",
        report.success_count,
        format_pct(report.success_pct)
    )
    .ok();
    writeln!(
        &mut out,
        "  errors: {} ({})",
        report.error_count,
        format_pct(report.error_pct)
    )
    .ok();
    writeln!(&mut out, "  qps: {}", format_rate(report.requests_per_sec)).ok();

    render_shares(&mut out, "status codes", &report.status_codes);
    render_shares(&mut out, "error kinds", &report.error_kinds);
    render_shares(&mut out, "scenarios", &report.scenarios);

    match &report.latency {
        Some(l) => {
            out.push_str("\nresponse times\n");
            writeln!(
                &mut out,
                "  min={} mean={} max={}",
                format_ms(l.min_ms),
                format_ms(l.mean_ms),
                format_ms(l.max_ms)
            )
            .ok();
            writeln!(
                &mut out,
                "  p50={} p95={} p99={} (n={})",
                format_ms(l.p50_ms),
                format_ms(l.p95_ms),
                format_ms(l.p99_ms),
                l.samples
            )
            .ok();
        }
        None => out.push_str("\nresponse times: no data\n"),
    }

    out
}

fn render_shares<K: std::fmt::Display>(out: &mut String, title: &str, shares: &[Share<K>]) {
    if shares.is_empty() {
        return;
    }

    writeln!(out, "\n{title}").ok();
    for s in shares {
        writeln!(out, "  {}: {} ({})", s.key, s.count, format_pct(s.pct)).ok();
    }
}
