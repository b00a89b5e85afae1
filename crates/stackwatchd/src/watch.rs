//! `stackwatchd watch`: follow a stack from the terminal

use colored::Colorize;
use futures_util::{Stream, StreamExt};
use stackwatch_cloud::ProvisioningClient;
use stackwatch_stream::{DoneReason, StreamConfig, StreamFrame, spawn_session};
use std::io::Write;
use std::sync::Arc;

/// Follow `stack_name` until it settles and return the process exit code
pub async fn run(
    client: Arc<dyn ProvisioningClient>,
    stack_name: String,
    config: StreamConfig,
    raw: bool,
) -> anyhow::Result<i32> {
    let frames = spawn_session(client, stack_name, config).into_stream();
    follow(frames, tokio::signal::ctrl_c(), raw, &mut std::io::stdout()).await
}

/// Write frames to `out` until the stream ends or `interrupt` resolves
async fn follow<S, I, W>(frames: S, interrupt: I, raw: bool, out: &mut W) -> anyhow::Result<i32>
where
    S: Stream<Item = StreamFrame>,
    I: Future,
    W: Write,
{
    tokio::pin!(frames);
    tokio::pin!(interrupt);
    let mut reason = None;

    loop {
        let frame = tokio::select! {
            frame = frames.next() => frame,
            _ = &mut interrupt => {
                eprintln!("{}", "Interrupted".yellow());
                return Ok(1);
            }
        };
        let Some(frame) = frame else { break };

        if raw {
            write!(out, "{}", frame.encode()?)?;
        } else {
            writeln!(out, "{}", render_frame(&frame))?;
        }
        out.flush()?;

        if let StreamFrame::Done(done) = frame {
            reason = Some(done);
        }
    }

    Ok(exit_code(reason.as_ref()))
}

/// Human-readable rendering of one frame
pub fn render_frame(frame: &StreamFrame) -> String {
    match frame {
        StreamFrame::Message(text) if text.starts_with("[ERROR]") => text.red().to_string(),
        StreamFrame::Message(text) => text.clone(),
        StreamFrame::FinalResources(resources) => {
            let mut out = format!("{}", "Resources:".bold());
            for resource in resources {
                let physical = resource.physical_resource_id.as_deref().unwrap_or("-");
                out.push_str(&format!(
                    "\n  {} ({}) {} {}",
                    resource.logical_resource_id.cyan(),
                    resource.resource_type,
                    physical,
                    resource.resource_status.dimmed(),
                ));
            }
            out
        }
        StreamFrame::Done(DoneReason::Status(status)) if status.is_success() => {
            format!("{} {}", "✓".green(), status.as_str().green().bold())
        }
        StreamFrame::Done(reason) => {
            format!("{} {}", "✗".red(), reason.to_string().red().bold())
        }
    }
}

/// 0 when the stack settled successfully, 1 otherwise
pub fn exit_code(reason: Option<&DoneReason>) -> i32 {
    match reason {
        Some(DoneReason::Status(status)) if status.is_success() => 0,
        _ => 1,
    }
}
