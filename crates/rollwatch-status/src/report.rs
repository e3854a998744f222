//! Human-readable progress and summary lines.

use std::io::{self, Write};
use std::sync::Arc;

use tracing::{info, warn};

use crate::resource::Resource;

const TAB_HEADER: &str = " -";

/// Print one line per resource that is not yet done.
///
/// Returns `true` when nothing was printed, i.e. every resource is done.
pub fn print_status<W: Write + ?Sized>(
    resources: &[Arc<dyn Resource>],
    out: &mut W,
) -> io::Result<bool> {
    let mut all_done = true;
    for r in resources.iter().filter(|r| !r.is_done()) {
        all_done = false;
        let status = r.status();
        let text = match &status.error {
            Some(err) => err.to_string(),
            None => status.details,
        };
        writeln!(out, "{TAB_HEADER} {} {}", r.display_id(), trim_newline(&text))?;
    }
    Ok(all_done)
}

/// Print the final line for a finished resource.
///
/// `pending` is the number of other resources still being checked.
pub fn print_summary<W: Write + ?Sized>(
    out: &mut W,
    resource: &dyn Resource,
    pending: usize,
    total: usize,
) -> io::Result<()> {
    let id = resource.display_id();
    match resource.status().error {
        Some(err) => {
            warn!(resource = %id, error = %err, pending, total, "resource status check failed");
            writeln!(
                out,
                "{TAB_HEADER} {id} failed.{} Error: {}.",
                pending_message(pending, total),
                trim_newline(&err.to_string()),
            )
        }
        None => {
            info!(resource = %id, pending, total, "resource is ready");
            writeln!(
                out,
                "{TAB_HEADER} {id} is ready.{}",
                pending_message(pending, total)
            )
        }
    }
}

pub fn pending_message(pending: usize, total: usize) -> String {
    if pending > 0 {
        format!(" [{pending}/{total} deployment(s) still pending]")
    } else {
        String::new()
    }
}

fn trim_newline(s: &str) -> &str {
    s.trim_end_matches(['\r', '\n'])
}
